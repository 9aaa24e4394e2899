// libs/appointment-cell/src/services/conflict.rs
use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::{Appointment, AppointmentError};
use crate::store::AppointmentStore;

/// Slot check ahead of a write. Two appointments conflict when they share
/// provider, date and exact start time and both still block the slot.
pub struct ConflictDetectionService {
    store: Arc<dyn AppointmentStore>,
}

impl ConflictDetectionService {
    pub fn new(store: Arc<dyn AppointmentStore>) -> Self {
        Self { store }
    }

    pub async fn find_conflict(
        &self,
        provider_id: Uuid,
        date: NaiveDate,
        start_time: NaiveTime,
        exclude_appointment_id: Option<Uuid>,
    ) -> Result<Option<Appointment>, AppointmentError> {
        debug!("Checking slot {} {} for provider {}", date, start_time, provider_id);

        Ok(self
            .store
            .find_slot_holder(provider_id, date, start_time, exclude_appointment_id)
            .await?)
    }

    pub async fn ensure_slot_free(
        &self,
        provider_id: Uuid,
        date: NaiveDate,
        start_time: NaiveTime,
        exclude_appointment_id: Option<Uuid>,
    ) -> Result<(), AppointmentError> {
        if let Some(holder) = self
            .find_conflict(provider_id, date, start_time, exclude_appointment_id)
            .await?
        {
            warn!(
                "Slot {} {} for provider {} already held by appointment {}",
                date, start_time, provider_id, holder.id
            );
            return Err(AppointmentError::SlotConflict);
        }

        Ok(())
    }
}
