//! REST implementation of the booking service traits.
//!
//! Routes follow the backend's `/api/vet` and `/api/auth` controllers.
//! Mutating calls and per-user reads send the session token as a bearer
//! credential; the public slot list is fetched anonymously.

use reqwest::{header, Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::debug;
use vetbook_common::http::client::{base_url, bearer, create_client};
use vetbook_common::{
    ensure_success, AuthService, Booking, BookingRequest, BoxFuture, LoginRequest, LoginResponse,
    NewSlot, Person, RegisterRequest, Slot, VetService, VetbookError,
};
use vetbook_config::ApiConfig;

/// Client for the vet booking REST API.
#[derive(Debug, Clone)]
pub struct RestVetService {
    client: Client,
    base_url: String,
}

impl RestVetService {
    /// Builds a client from the `[api]` configuration section.
    pub fn new(config: &ApiConfig) -> Result<Self, VetbookError> {
        Ok(Self {
            client: create_client(config.timeout_secs)?,
            base_url: base_url(config)?,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, request: RequestBuilder, token: &str) -> RequestBuilder {
        request
            .header(header::AUTHORIZATION, bearer(token))
            .header(header::ACCEPT, "application/json")
    }

    /// Sends the request and decodes a JSON body.
    async fn send_json<T: DeserializeOwned>(
        request: RequestBuilder,
        fallback: &str,
    ) -> Result<T, VetbookError> {
        let response = ensure_success(request.send().await?, fallback).await?;
        Ok(response.json::<T>().await?)
    }

    /// Sends the request and ignores the body of a successful response.
    async fn send_empty(request: RequestBuilder, fallback: &str) -> Result<(), VetbookError> {
        ensure_success(request.send().await?, fallback).await?;
        Ok(())
    }
}

impl VetService for RestVetService {
    fn fetch_slots(&self) -> BoxFuture<'_, Vec<Slot>, VetbookError> {
        Box::pin(async move {
            debug!("fetching availability");
            let request = self.client.get(self.url("/api/vet/availability"));
            Self::send_json(request, "Failed to fetch availability").await
        })
    }

    fn fetch_my_slots(&self, token: &str) -> BoxFuture<'_, Vec<Slot>, VetbookError> {
        let token = token.to_string();
        Box::pin(async move {
            let request = self
                .authorized(self.client.get(self.url("/api/vet/availability")), &token)
                .query(&[("mySlots", "true")]);
            Self::send_json(request, "Failed to fetch availability").await
        })
    }

    fn create_slot(&self, token: &str, slot: NewSlot) -> BoxFuture<'_, Slot, VetbookError> {
        let token = token.to_string();
        Box::pin(async move {
            let request = self
                .authorized(self.client.post(self.url("/api/vet/availability")), &token)
                .query(&[
                    ("at", slot.start_at.to_rfc3339()),
                    ("duration", slot.duration_minutes.to_string()),
                ]);
            Self::send_json(request, "Failed to create availability").await
        })
    }

    fn delete_slot(&self, token: &str, slot_id: i64) -> BoxFuture<'_, (), VetbookError> {
        let token = token.to_string();
        Box::pin(async move {
            let url = self.url(&format!("/api/vet/availability/{}", slot_id));
            let request = self.authorized(self.client.delete(url), &token);
            Self::send_empty(request, "Failed to delete availability").await
        })
    }

    fn fetch_user_bookings(&self, token: &str) -> BoxFuture<'_, Vec<Booking>, VetbookError> {
        let token = token.to_string();
        Box::pin(async move {
            let request =
                self.authorized(self.client.get(self.url("/api/vet/appointments/user")), &token);
            Self::send_json(request, "Failed to fetch your bookings").await
        })
    }

    fn fetch_doctor_bookings(&self, token: &str) -> BoxFuture<'_, Vec<Booking>, VetbookError> {
        let token = token.to_string();
        Box::pin(async move {
            let request =
                self.authorized(self.client.get(self.url("/api/vet/appointments/mine")), &token);
            Self::send_json(request, "Failed to fetch your bookings").await
        })
    }

    fn create_booking(
        &self,
        token: &str,
        request: BookingRequest,
    ) -> BoxFuture<'_, Booking, VetbookError> {
        let token = token.to_string();
        Box::pin(async move {
            debug!("booking slot {}", request.slot_id);
            let http_request = self
                .authorized(self.client.post(self.url("/api/vet/appointments")), &token)
                .query(&[
                    ("availabilityId", request.slot_id.to_string()),
                    ("phone", request.phone),
                    ("message", request.message),
                ]);
            Self::send_json(http_request, "Failed to book appointment").await
        })
    }

    fn cancel_booking(&self, token: &str, booking_id: i64) -> BoxFuture<'_, (), VetbookError> {
        let token = token.to_string();
        Box::pin(async move {
            let url = self.url(&format!("/api/vet/appointments/{}", booking_id));
            let request = self.authorized(self.client.delete(url), &token);
            Self::send_empty(request, "Failed to cancel appointment").await
        })
    }
}

impl AuthService for RestVetService {
    fn login(&self, email: &str, password: &str) -> BoxFuture<'_, LoginResponse, VetbookError> {
        let body = LoginRequest {
            email: email.trim().to_string(),
            password: password.to_string(),
        };
        Box::pin(async move {
            let request = self.client.post(self.url("/api/auth/login")).json(&body);
            Self::send_json(request, "Login failed").await
        })
    }

    fn register(&self, request: RegisterRequest) -> BoxFuture<'_, Person, VetbookError> {
        Box::pin(async move {
            debug!("registering {}", request.email);
            let request = self.client.post(self.url("/api/auth/register")).json(&request);
            Self::send_json(request, "Registration failed").await
        })
    }
}
