//! Service abstractions for the remote booking API.
//!
//! The reconciler only talks to these traits, so tests can swap the REST
//! client for the in-memory [`mock::MockVetService`].

use std::future::Future;
use std::pin::Pin;

use crate::error::VetbookError;
use crate::models::{
    Booking, BookingRequest, LoginResponse, NewSlot, Person, RegisterRequest, Slot,
};

/// Type alias for a boxed future that returns a Result
pub type BoxFuture<'a, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>;

/// Slot and booking operations of the vet booking service.
///
/// Every method taking a `token` sends it as a bearer credential.
pub trait VetService: Send + Sync {
    /// All slots known to the service, booked and past ones included.
    fn fetch_slots(&self) -> BoxFuture<'_, Vec<Slot>, VetbookError>;

    /// Slots published by the doctor owning `token`.
    fn fetch_my_slots(&self, token: &str) -> BoxFuture<'_, Vec<Slot>, VetbookError>;

    fn create_slot(&self, token: &str, slot: NewSlot) -> BoxFuture<'_, Slot, VetbookError>;

    fn delete_slot(&self, token: &str, slot_id: i64) -> BoxFuture<'_, (), VetbookError>;

    /// Bookings made by the user owning `token`.
    fn fetch_user_bookings(&self, token: &str) -> BoxFuture<'_, Vec<Booking>, VetbookError>;

    /// Bookings made against the slots of the doctor owning `token`.
    fn fetch_doctor_bookings(&self, token: &str) -> BoxFuture<'_, Vec<Booking>, VetbookError>;

    fn create_booking(
        &self,
        token: &str,
        request: BookingRequest,
    ) -> BoxFuture<'_, Booking, VetbookError>;

    fn cancel_booking(&self, token: &str, booking_id: i64) -> BoxFuture<'_, (), VetbookError>;
}

/// Credential exchange with the auth service.
pub trait AuthService: Send + Sync {
    fn login(&self, email: &str, password: &str) -> BoxFuture<'_, LoginResponse, VetbookError>;

    /// Creates a USER account and returns the stored record.
    fn register(&self, request: RegisterRequest) -> BoxFuture<'_, Person, VetbookError>;
}

#[cfg(any(test, feature = "mock"))]
pub mod mock {
    //! In-memory booking service with the same rules as the real backend:
    //! booking flips the slot's flag, cancelling flips it back.

    use super::*;
    use crate::error::service_error;
    use crate::models::Person;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// A failure to return from the next call of one operation.
    #[derive(Debug, Clone)]
    pub enum MockFailure {
        Service(u16, String),
        Network(String),
    }

    impl MockFailure {
        fn into_error(self) -> VetbookError {
            match self {
                MockFailure::Service(status, message) => service_error(status, message),
                MockFailure::Network(message) => VetbookError::HttpError(message),
            }
        }
    }

    #[derive(Debug, Clone)]
    struct StoredSlot {
        owner: Option<String>,
        slot: Slot,
    }

    #[derive(Debug, Clone)]
    struct StoredBooking {
        owner: String,
        slot_id: i64,
        booking: Booking,
    }

    #[derive(Debug, Default)]
    struct MockState {
        slots: Vec<StoredSlot>,
        bookings: Vec<StoredBooking>,
        next_id: i64,
        failures: HashMap<&'static str, MockFailure>,
        calls: Vec<String>,
    }

    /// Mock booking service for testing.
    #[derive(Debug, Default)]
    pub struct MockVetService {
        state: Mutex<MockState>,
    }

    impl MockVetService {
        pub fn new() -> Self {
            Self {
                state: Mutex::new(MockState {
                    next_id: 1000,
                    ..Default::default()
                }),
            }
        }

        /// Seeds the service with slots that have no owning doctor token.
        pub fn with_slots(slots: Vec<Slot>) -> Self {
            let service = Self::new();
            for slot in slots {
                service.insert_slot(None, slot);
            }
            service
        }

        /// Seeds a slot owned by the doctor holding `doctor_token`.
        pub fn insert_slot(&self, doctor_token: Option<&str>, slot: Slot) {
            let mut state = self.state.lock().unwrap();
            state.slots.push(StoredSlot {
                owner: doctor_token.map(str::to_string),
                slot,
            });
        }

        /// Seeds a booking owned by `user_token`, marking its slot booked.
        pub fn insert_booking(&self, user_token: &str, slot_id: i64, booking: Booking) {
            let mut state = self.state.lock().unwrap();
            if let Some(stored) = state.slots.iter_mut().find(|s| s.slot.id == slot_id) {
                stored.slot.booked = true;
            }
            state.bookings.push(StoredBooking {
                owner: user_token.to_string(),
                slot_id,
                booking,
            });
        }

        /// Makes the next call of `operation` fail with `failure`.
        pub fn fail_next(&self, operation: &'static str, failure: MockFailure) {
            self.state.lock().unwrap().failures.insert(operation, failure);
        }

        /// Operation names in call order.
        pub fn calls(&self) -> Vec<String> {
            self.state.lock().unwrap().calls.clone()
        }

        pub fn slot(&self, slot_id: i64) -> Option<Slot> {
            let state = self.state.lock().unwrap();
            state.slots.iter().find(|s| s.slot.id == slot_id).map(|s| s.slot.clone())
        }

        fn begin(&self, operation: &'static str) -> Result<std::sync::MutexGuard<'_, MockState>, VetbookError> {
            let mut state = self.state.lock().unwrap();
            state.calls.push(operation.to_string());
            let failure = state.failures.remove(operation);
            match failure {
                Some(failure) => Err(failure.into_error()),
                None => Ok(state),
            }
        }
    }

    fn doctor_for(token: &str) -> Person {
        Person {
            id: 1,
            name: Some(format!("Dr. {token}")),
            email: None,
        }
    }

    impl VetService for MockVetService {
        fn fetch_slots(&self) -> BoxFuture<'_, Vec<Slot>, VetbookError> {
            Box::pin(async move {
                let state = self.begin("fetch_slots")?;
                Ok(state.slots.iter().map(|s| s.slot.clone()).collect())
            })
        }

        fn fetch_my_slots(&self, token: &str) -> BoxFuture<'_, Vec<Slot>, VetbookError> {
            let token = token.to_string();
            Box::pin(async move {
                let state = self.begin("fetch_my_slots")?;
                Ok(state
                    .slots
                    .iter()
                    .filter(|s| s.owner.as_deref() == Some(token.as_str()))
                    .map(|s| s.slot.clone())
                    .collect())
            })
        }

        fn create_slot(&self, token: &str, slot: NewSlot) -> BoxFuture<'_, Slot, VetbookError> {
            let token = token.to_string();
            Box::pin(async move {
                let mut state = self.begin("create_slot")?;
                state.next_id += 1;
                let created = Slot {
                    id: state.next_id,
                    start_at: slot.start_at,
                    duration_minutes: slot.duration_minutes,
                    booked: false,
                    doctor: Some(doctor_for(&token)),
                };
                state.slots.push(StoredSlot {
                    owner: Some(token),
                    slot: created.clone(),
                });
                Ok(created)
            })
        }

        fn delete_slot(&self, token: &str, slot_id: i64) -> BoxFuture<'_, (), VetbookError> {
            let token = token.to_string();
            Box::pin(async move {
                let mut state = self.begin("delete_slot")?;
                let position = state
                    .slots
                    .iter()
                    .position(|s| s.slot.id == slot_id && s.owner.as_deref() == Some(token.as_str()))
                    .ok_or_else(|| service_error(404, "Availability slot not found"))?;
                state.slots.remove(position);
                Ok(())
            })
        }

        fn fetch_user_bookings(&self, token: &str) -> BoxFuture<'_, Vec<Booking>, VetbookError> {
            let token = token.to_string();
            Box::pin(async move {
                let state = self.begin("fetch_user_bookings")?;
                let mut bookings: Vec<Booking> = state
                    .bookings
                    .iter()
                    .filter(|b| b.owner == token)
                    .map(|b| b.booking.clone())
                    .collect();
                bookings.sort_by(|a, b| b.start_at.cmp(&a.start_at));
                Ok(bookings)
            })
        }

        fn fetch_doctor_bookings(&self, token: &str) -> BoxFuture<'_, Vec<Booking>, VetbookError> {
            let token = token.to_string();
            Box::pin(async move {
                let state = self.begin("fetch_doctor_bookings")?;
                let owned: Vec<i64> = state
                    .slots
                    .iter()
                    .filter(|s| s.owner.as_deref() == Some(token.as_str()))
                    .map(|s| s.slot.id)
                    .collect();
                Ok(state
                    .bookings
                    .iter()
                    .filter(|b| owned.contains(&b.slot_id))
                    .map(|b| b.booking.clone())
                    .collect())
            })
        }

        fn create_booking(
            &self,
            token: &str,
            request: BookingRequest,
        ) -> BoxFuture<'_, Booking, VetbookError> {
            let token = token.to_string();
            Box::pin(async move {
                let mut state = self.begin("create_booking")?;
                let stored = state
                    .slots
                    .iter_mut()
                    .find(|s| s.slot.id == request.slot_id)
                    .ok_or_else(|| service_error(400, "Availability slot not found"))?;
                if stored.slot.booked {
                    return Err(service_error(400, "Slot is already booked"));
                }
                stored.slot.booked = true;
                let slot = stored.slot.clone();

                state.next_id += 1;
                let booking = Booking {
                    id: state.next_id,
                    start_at: slot.start_at,
                    duration_minutes: slot.duration_minutes,
                    phone: Some(request.phone),
                    message: Some(request.message),
                    doctor: slot.doctor,
                    user: None,
                };
                state.bookings.push(StoredBooking {
                    owner: token,
                    slot_id: slot.id,
                    booking: booking.clone(),
                });
                Ok(booking)
            })
        }

        fn cancel_booking(&self, token: &str, booking_id: i64) -> BoxFuture<'_, (), VetbookError> {
            let token = token.to_string();
            Box::pin(async move {
                let mut state = self.begin("cancel_booking")?;
                let position = state
                    .bookings
                    .iter()
                    .position(|b| b.booking.id == booking_id && b.owner == token)
                    .ok_or_else(|| service_error(404, "Booking not found"))?;
                let removed = state.bookings.remove(position);
                if let Some(stored) = state.slots.iter_mut().find(|s| s.slot.id == removed.slot_id) {
                    stored.slot.booked = false;
                }
                Ok(())
            })
        }
    }

}
