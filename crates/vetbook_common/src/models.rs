//! Wire and domain models for slots, bookings and sessions.
//!
//! Field names follow the booking service's camelCase JSON. Timestamps are
//! RFC 3339 and always handled as UTC.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{validation_error, VetbookError};

/// Display record for a doctor or a patient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl Person {
    /// Name if known, otherwise email, otherwise `#id`.
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .or_else(|| self.email.clone())
            .unwrap_or_else(|| format!("#{}", self.id))
    }
}

/// A bookable time interval offered by a doctor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    pub id: i64,
    pub start_at: DateTime<Utc>,
    pub duration_minutes: u32,
    #[serde(default)]
    pub booked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doctor: Option<Person>,
}

impl Slot {
    pub fn end_at(&self) -> DateTime<Utc> {
        self.start_at + Duration::minutes(i64::from(self.duration_minutes))
    }

    /// A slot can be offered only while unbooked and strictly in the future.
    pub fn is_bookable_at(&self, now: DateTime<Utc>) -> bool {
        !self.booked && self.start_at > now
    }
}

/// Client-side status of a booking, always derived from the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BookingStatus {
    Upcoming,
    Completed,
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookingStatus::Upcoming => f.pad("Upcoming"),
            BookingStatus::Completed => f.pad("Completed"),
        }
    }
}

/// A confirmed reservation of one slot by one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: i64,
    pub start_at: DateTime<Utc>,
    pub duration_minutes: u32,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub doctor: Option<Person>,
    #[serde(default)]
    pub user: Option<Person>,
}

impl Booking {
    pub fn status_at(&self, now: DateTime<Utc>) -> BookingStatus {
        if self.start_at > now {
            BookingStatus::Upcoming
        } else {
            BookingStatus::Completed
        }
    }

    /// Only bookings that have not started yet may be cancelled.
    pub fn is_cancellable_at(&self, now: DateTime<Utc>) -> bool {
        self.status_at(now) == BookingStatus::Upcoming
    }
}

/// Validated payload for the create-booking call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub slot_id: i64,
    pub phone: String,
    pub message: String,
}

/// A slot a doctor wants to publish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSlot {
    pub start_at: DateTime<Utc>,
    pub duration_minutes: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Account details for a new user; the service assigns the USER role.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl RegisterRequest {
    /// Trims name and email and rejects blank fields before anything is sent.
    pub fn new(name: &str, email: &str, password: &str) -> Result<Self, VetbookError> {
        let name = name.trim();
        let email = email.trim();
        if name.is_empty() {
            return Err(validation_error("Please provide your name"));
        }
        if !email.contains('@') {
            return Err(validation_error("Please provide a valid email"));
        }
        if password.is_empty() {
            return Err(validation_error("Please choose a password"));
        }
        Ok(Self {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    User,
    Doctor,
    Admin,
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "USER" => Ok(Role::User),
            "DOCTOR" => Ok(Role::Doctor),
            "ADMIN" => Ok(Role::Admin),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "USER"),
            Role::Doctor => write!(f, "DOCTOR"),
            Role::Admin => write!(f, "ADMIN"),
        }
    }
}
