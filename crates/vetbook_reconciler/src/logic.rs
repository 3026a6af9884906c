use chrono::{DateTime, Utc};
use serde::Serialize;
use vetbook_common::{validation_error, Booking, BookingRequest, BookingStatus, NewSlot, Slot, VetbookError};
use vetbook_config::BookingRules;

// --- Data Structures ---

/// Contact details typed by the user before booking.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BookingForm {
    pub phone: String,
    pub message: String,
}

/// A booking as it should be shown right now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookingView {
    pub booking: Booking,
    pub status: BookingStatus,
    pub cancellable: bool,
}

// --- Availability Logic ---

/// Keeps the slots that can still be booked at `now`, earliest first.
///
/// A slot survives only if it is unbooked and starts strictly after `now`.
pub fn available_slots(slots: Vec<Slot>, now: DateTime<Utc>) -> Vec<Slot> {
    let mut available: Vec<Slot> = slots
        .into_iter()
        .filter(|slot| slot.is_bookable_at(now))
        .collect();
    available.sort_by_key(|slot| (slot.start_at, slot.id));
    available
}

/// Pairs each booking with its status and whether it may still be cancelled.
pub fn booking_views(bookings: &[Booking], now: DateTime<Utc>) -> Vec<BookingView> {
    bookings
        .iter()
        .map(|booking| BookingView {
            booking: booking.clone(),
            status: booking.status_at(now),
            cancellable: booking.is_cancellable_at(now),
        })
        .collect()
}

// --- Form validation ---

/// Trims `phone` and checks it is exactly `digits` ASCII digits.
pub fn validate_phone(phone: &str, digits: usize) -> Result<String, VetbookError> {
    let phone = phone.trim();
    if phone.is_empty() {
        return Err(validation_error("Please provide your phone number"));
    }
    if phone.len() != digits || !phone.chars().all(|c| c.is_ascii_digit()) {
        return Err(validation_error(format!(
            "Phone number must be exactly {} digits",
            digits
        )));
    }
    Ok(phone.to_string())
}

/// Trims `message` and checks something is left.
pub fn validate_message(message: &str) -> Result<String, VetbookError> {
    let message = message.trim();
    if message.is_empty() {
        return Err(validation_error("Please describe what happened to your pet"));
    }
    Ok(message.to_string())
}

/// Validates the form and builds the payload for the create-booking call.
pub fn build_booking_request(
    slot_id: i64,
    phone: &str,
    message: &str,
    rules: &BookingRules,
) -> Result<BookingRequest, VetbookError> {
    Ok(BookingRequest {
        slot_id,
        phone: validate_phone(phone, rules.phone_digits)?,
        message: validate_message(message)?,
    })
}

/// Checks a slot a doctor wants to publish.
pub fn validate_new_slot(
    slot: &NewSlot,
    now: DateTime<Utc>,
    rules: &BookingRules,
) -> Result<(), VetbookError> {
    if slot.start_at <= now {
        return Err(validation_error("Slot must start in the future"));
    }
    if slot.duration_minutes == 0 || slot.duration_minutes > rules.max_slot_minutes {
        return Err(validation_error(format!(
            "Duration must be between 1 and {} minutes",
            rules.max_slot_minutes
        )));
    }
    Ok(())
}
