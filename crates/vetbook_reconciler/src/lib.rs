//! Booking and availability reconciliation for the vet booking client.
//!
//! [`BookingReconciler`] is the patient side: bookable slots, one pending
//! selection, booking and cancelling. [`DoctorSchedule`] is the doctor side:
//! publishing and removing slots.

// Declare modules within this crate
pub mod confirm;
pub mod logic;
#[cfg(test)]
mod logic_proptest;
pub mod reconciler;
#[cfg(test)]
mod reconciler_test;
pub mod schedule;

pub use confirm::{AutoConfirm, Confirmation, Decline};
pub use logic::{BookingForm, BookingView};
pub use reconciler::{BookingReconciler, CancelOutcome, LoadOutcome, ReconcilerState};
pub use schedule::DoctorSchedule;
