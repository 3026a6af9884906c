//! Doctor-facing view over the doctor's own slots.
//!
//! Every operation requires a session with the `DOCTOR` or `ADMIN` role and
//! fails before any network call otherwise. Mutations reload the slot list,
//! same as the booking side.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use tracing::{info, warn};
use vetbook_common::{
    require_role, validation_error, Booking, NewSlot, Role, Session, Slot, VetService,
    VetbookError,
};
use vetbook_config::BookingRules;

use crate::confirm::Confirmation;
use crate::logic::validate_new_slot;

const SCHEDULE_ROLES: [Role; 2] = [Role::Doctor, Role::Admin];

pub struct DoctorSchedule {
    service: Arc<dyn VetService>,
    session: Arc<dyn Session>,
    rules: BookingRules,
    slots: Mutex<Vec<Slot>>,
}

impl DoctorSchedule {
    pub fn new(service: Arc<dyn VetService>, session: Arc<dyn Session>, rules: BookingRules) -> Self {
        Self {
            service,
            session,
            rules,
            slots: Mutex::new(Vec::new()),
        }
    }

    fn slots_guard(&self) -> MutexGuard<'_, Vec<Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn token(&self) -> Result<String, VetbookError> {
        let (token, _) = require_role(self.session.as_ref(), &SCHEDULE_ROLES)?;
        Ok(token)
    }

    /// Reloads the doctor's slots, booked ones included, earliest first.
    pub async fn refresh(&self) -> Result<(), VetbookError> {
        let token = self.token()?;
        let mut slots = self.service.fetch_my_slots(&token).await?;
        slots.sort_by_key(|slot| (slot.start_at, slot.id));
        *self.slots_guard() = slots;
        Ok(())
    }

    /// Publishes a new slot starting at `start_at`.
    pub async fn add_slot(
        &self,
        start_at: DateTime<Utc>,
        duration_minutes: u32,
    ) -> Result<Slot, VetbookError> {
        let token = self.token()?;
        let new_slot = NewSlot {
            start_at,
            duration_minutes,
        };
        validate_new_slot(&new_slot, Utc::now(), &self.rules)?;

        let created = self.service.create_slot(&token, new_slot).await?;
        info!("published slot {} at {}", created.id, created.start_at);
        if let Err(e) = self.refresh().await {
            warn!("slot published but reloading failed: {}", e);
        }
        Ok(created)
    }

    /// Deletes an unbooked slot after confirmation. Returns false if declined.
    pub async fn remove_slot(
        &self,
        slot_id: i64,
        confirm: &dyn Confirmation,
    ) -> Result<bool, VetbookError> {
        let token = self.token()?;
        let slot = self
            .slots_guard()
            .iter()
            .find(|slot| slot.id == slot_id)
            .cloned()
            .ok_or_else(|| validation_error(format!("No slot #{} in your schedule", slot_id)))?;
        if slot.booked {
            return Err(validation_error(
                "This slot is booked; the appointment must be cancelled first",
            ));
        }
        if !confirm.confirm("Are you sure you want to delete this slot?") {
            return Ok(false);
        }

        self.service.delete_slot(&token, slot_id).await?;
        info!("deleted slot {}", slot_id);
        if let Err(e) = self.refresh().await {
            warn!("slot deleted but reloading failed: {}", e);
        }
        Ok(true)
    }

    /// Appointments booked against this doctor's slots.
    pub async fn appointments(&self) -> Result<Vec<Booking>, VetbookError> {
        let token = self.token()?;
        self.service.fetch_doctor_bookings(&token).await
    }

    pub fn slots(&self) -> Vec<Slot> {
        self.slots_guard().clone()
    }

    /// Default duration for new slots.
    pub fn default_slot_minutes(&self) -> u32 {
        self.rules.default_slot_minutes
    }
}
