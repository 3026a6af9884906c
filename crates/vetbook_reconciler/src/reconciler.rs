//! Client-side booking state kept consistent with the booking service.
//!
//! The reconciler holds two re-fetchable lists (bookable slots and the user's
//! bookings), one pending slot selection and the contact form draft. Every
//! mutation is a single remote call followed by a full reload of both lists;
//! nothing is patched locally.
//!
//! Per slot, the client-side view moves
//! `available -> pending selection -> (booked | available)`. The pending
//! selection only lives here and is dropped on a new selection, on
//! [`BookingReconciler::detach`], or when a reload no longer offers the slot.
//!
//! If the reload after a successful mutation fails, the lists are marked
//! stale: selecting, booking and cancelling are refused until a
//! [`BookingReconciler::refresh`] succeeds.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use vetbook_common::{
    busy, require_token, validation_error, Booking, Session, Slot, VetService, VetbookError,
};
use vetbook_config::BookingRules;

use crate::confirm::Confirmation;
use crate::logic::{available_slots, booking_views, build_booking_request, BookingForm, BookingView};

/// Everything the reconciler shows, as of the last applied load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcilerState {
    pub available: Vec<Slot>,
    pub bookings: Vec<Booking>,
    pub selected: Option<i64>,
    pub form: BookingForm,
    /// Set while the lists may not reflect the last mutation.
    pub stale: Option<String>,
}

/// What happened to the result of a load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The fetched list replaced the local one.
    Applied,
    /// Nothing to load (no session for per-user data).
    Skipped,
    /// A newer load started, or the reconciler was detached, before this one
    /// finished; its result was dropped.
    Discarded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    Cancelled,
    /// The user declined the confirmation; nothing was sent.
    Declined,
}

/// Marks a mutating call as in flight until dropped.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool, action: &str) -> Result<Self, VetbookError> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| InFlight(flag))
            .map_err(|_| busy(format!("{} is already in progress", action)))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct BookingReconciler {
    service: Arc<dyn VetService>,
    session: Arc<dyn Session>,
    rules: BookingRules,
    state: Mutex<ReconcilerState>,
    in_flight: AtomicBool,
    slots_generation: AtomicU64,
    bookings_generation: AtomicU64,
    detached: AtomicBool,
}

impl BookingReconciler {
    pub fn new(service: Arc<dyn VetService>, session: Arc<dyn Session>, rules: BookingRules) -> Self {
        Self {
            service,
            session,
            rules,
            state: Mutex::new(ReconcilerState::default()),
            in_flight: AtomicBool::new(false),
            slots_generation: AtomicU64::new(0),
            bookings_generation: AtomicU64::new(0),
            detached: AtomicBool::new(false),
        }
    }

    fn state(&self) -> MutexGuard<'_, ReconcilerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_current(&self, generation: &AtomicU64, ticket: u64) -> bool {
        !self.detached.load(Ordering::SeqCst) && generation.load(Ordering::SeqCst) == ticket
    }

    // --- Loads ---

    /// Fetches all slots and keeps the bookable future ones.
    ///
    /// On failure the previous list stays in place.
    pub async fn load_available_slots(&self) -> Result<LoadOutcome, VetbookError> {
        let ticket = self.slots_generation.fetch_add(1, Ordering::SeqCst) + 1;

        let slots = self.service.fetch_slots().await.map_err(|e| {
            warn!("failed to load availability: {}", e);
            e
        })?;
        let available = available_slots(slots, Utc::now());

        if !self.is_current(&self.slots_generation, ticket) {
            debug!("discarding stale availability response");
            return Ok(LoadOutcome::Discarded);
        }

        let mut state = self.state();
        if let Some(selected) = state.selected {
            if !available.iter().any(|slot| slot.id == selected) {
                debug!("slot {} is no longer offered, dropping selection", selected);
                state.selected = None;
            }
        }
        debug!("{} bookable slots", available.len());
        state.available = available;
        Ok(LoadOutcome::Applied)
    }

    /// Fetches the current user's bookings. Does nothing without a session.
    pub async fn load_user_bookings(&self) -> Result<LoadOutcome, VetbookError> {
        let Some(token) = self.session.token() else {
            debug!("no session, skipping user bookings");
            return Ok(LoadOutcome::Skipped);
        };
        let ticket = self.bookings_generation.fetch_add(1, Ordering::SeqCst) + 1;

        let bookings = self.service.fetch_user_bookings(&token).await.map_err(|e| {
            warn!("failed to load user bookings: {}", e);
            e
        })?;

        if !self.is_current(&self.bookings_generation, ticket) {
            debug!("discarding stale bookings response");
            return Ok(LoadOutcome::Discarded);
        }

        debug!("{} bookings for current user", bookings.len());
        self.state().bookings = bookings;
        Ok(LoadOutcome::Applied)
    }

    /// Reloads both lists. Both loads run even if the first fails; the first
    /// error is returned. Clears the stale mark once both lists are applied.
    pub async fn refresh(&self) -> Result<(), VetbookError> {
        let slots = self.load_available_slots().await;
        let bookings = self.load_user_bookings().await;
        let slots = slots?;
        let bookings = bookings?;
        if slots == LoadOutcome::Applied && bookings != LoadOutcome::Discarded {
            self.state().stale = None;
        }
        Ok(())
    }

    // A failed reload never fails the mutation; it marks the lists stale.
    async fn reload_after(&self, action: &str) {
        self.state().stale = Some(format!("Reloading after the {} is still pending", action));
        if let Err(e) = self.refresh().await {
            warn!("{} succeeded but reloading failed: {}", action, e);
            self.state().stale = Some(format!(
                "The {} went through, but your slots and bookings could not be reloaded ({}). Please refresh before continuing",
                action, e
            ));
        }
    }

    fn ensure_fresh(&self) -> Result<(), VetbookError> {
        match &self.state().stale {
            Some(reason) => Err(validation_error(reason)),
            None => Ok(()),
        }
    }

    // --- Selection and form ---

    /// Makes `slot_id` the single pending selection.
    ///
    /// Only slots in the current available list can be selected, and only
    /// while the list is not stale; otherwise the previous selection is kept.
    pub fn select_slot(&self, slot_id: i64) -> Result<(), VetbookError> {
        let mut state = self.state();
        if let Some(reason) = &state.stale {
            return Err(validation_error(reason));
        }
        if !state.available.iter().any(|slot| slot.id == slot_id) {
            return Err(validation_error("Please choose an available slot"));
        }
        state.selected = Some(slot_id);
        Ok(())
    }

    pub fn clear_selection(&self) {
        self.state().selected = None;
    }

    pub fn set_phone(&self, phone: impl Into<String>) {
        self.state().form.phone = phone.into();
    }

    pub fn set_message(&self, message: impl Into<String>) {
        self.state().form.message = message.into();
    }

    // --- Mutations ---

    /// Books `slot_id` with the given contact details.
    ///
    /// Rejects before any network call when another mutation is in flight,
    /// when there is no session, when the lists are stale, when the slot is
    /// not currently offered, or when the phone or message are invalid. On
    /// success the selection and form are cleared and both lists reloaded.
    /// On failure nothing local changes.
    pub async fn submit_booking(
        &self,
        slot_id: i64,
        phone: &str,
        message: &str,
    ) -> Result<Booking, VetbookError> {
        let _in_flight = InFlight::acquire(&self.in_flight, "A booking")?;
        let token = require_token(self.session.as_ref())?;
        self.ensure_fresh()?;
        if !self.is_offered(slot_id) {
            return Err(validation_error("Please choose an available slot"));
        }
        let request = build_booking_request(slot_id, phone, message, &self.rules)?;

        info!("booking slot {}", slot_id);
        let booking = self.service.create_booking(&token, request).await.map_err(|e| {
            warn!("booking slot {} failed: {}", slot_id, e);
            e
        })?;
        info!("booked slot {} as booking {}", slot_id, booking.id);

        {
            let mut state = self.state();
            state.selected = None;
            state.form = BookingForm::default();
        }
        self.reload_after("booking").await;
        Ok(booking)
    }

    /// Books the pending selection with the form draft.
    pub async fn submit_pending(&self) -> Result<Booking, VetbookError> {
        let (selected, form) = {
            let state = self.state();
            (state.selected, state.form.clone())
        };
        let slot_id = selected.ok_or_else(|| validation_error("Please choose an available slot"))?;
        self.submit_booking(slot_id, &form.phone, &form.message).await
    }

    /// Cancels one of the user's upcoming bookings after confirmation.
    ///
    /// Bookings that already started cannot be cancelled. Declining the
    /// confirmation sends nothing.
    pub async fn cancel_booking(
        &self,
        booking_id: i64,
        confirm: &dyn Confirmation,
    ) -> Result<CancelOutcome, VetbookError> {
        let _in_flight = InFlight::acquire(&self.in_flight, "A cancellation")?;
        let token = require_token(self.session.as_ref())?;
        self.ensure_fresh()?;
        let booking = self
            .find_booking(booking_id)
            .ok_or_else(|| validation_error(format!("No appointment #{} in your bookings", booking_id)))?;
        if !booking.is_cancellable_at(Utc::now()) {
            return Err(validation_error("Completed appointments cannot be cancelled"));
        }

        let prompt = format!(
            "Cancel the appointment on {}?",
            booking.start_at.format("%a %d %b %Y %H:%M UTC")
        );
        if !confirm.confirm(&prompt) {
            info!("cancellation of booking {} declined", booking_id);
            return Ok(CancelOutcome::Declined);
        }

        info!("cancelling booking {}", booking_id);
        self.service.cancel_booking(&token, booking_id).await.map_err(|e| {
            warn!("cancelling booking {} failed: {}", booking_id, e);
            e
        })?;

        self.reload_after("cancellation").await;
        Ok(CancelOutcome::Cancelled)
    }

    /// Stops applying load results, e.g. when the user navigated away.
    /// Responses still in flight are dropped and the selection is discarded.
    pub fn detach(&self) {
        self.detached.store(true, Ordering::SeqCst);
        self.slots_generation.fetch_add(1, Ordering::SeqCst);
        self.bookings_generation.fetch_add(1, Ordering::SeqCst);
        self.state().selected = None;
    }

    // --- Views ---

    fn is_offered(&self, slot_id: i64) -> bool {
        self.state().available.iter().any(|slot| slot.id == slot_id)
    }

    fn find_booking(&self, booking_id: i64) -> Option<Booking> {
        self.state()
            .bookings
            .iter()
            .find(|booking| booking.id == booking_id)
            .cloned()
    }

    pub fn available_slots(&self) -> Vec<Slot> {
        self.state().available.clone()
    }

    pub fn user_bookings(&self) -> Vec<Booking> {
        self.state().bookings.clone()
    }

    pub fn selected_slot(&self) -> Option<Slot> {
        let state = self.state();
        state
            .selected
            .and_then(|id| state.available.iter().find(|slot| slot.id == id).cloned())
    }

    /// Why the lists may be out of date, if they are.
    pub fn stale_reason(&self) -> Option<String> {
        self.state().stale.clone()
    }

    pub fn form(&self) -> BookingForm {
        self.state().form.clone()
    }

    /// The user's bookings with status and cancellability as of now.
    pub fn booking_views(&self) -> Vec<BookingView> {
        self.booking_views_at(Utc::now())
    }

    pub fn booking_views_at(&self, now: DateTime<Utc>) -> Vec<BookingView> {
        booking_views(&self.state().bookings, now)
    }

    pub fn snapshot(&self) -> ReconcilerState {
        self.state().clone()
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }
}
