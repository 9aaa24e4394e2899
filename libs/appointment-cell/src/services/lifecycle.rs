// libs/appointment-cell/src/services/lifecycle.rs
use chrono::{DateTime, Duration, NaiveTime, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::models::{
    Appointment, AppointmentError, AppointmentStatus, Cancellation, ClinicalNote,
    RescheduleAppointmentRequest, RescheduleEntry, UpdateAppointmentRequest, Vitals,
};

pub const DEFAULT_DURATION_MINUTES: i64 = 30;
const MAX_DURATION_MINUTES: i64 = 8 * 60;

/// Who is recorded as cancelling when the status endpoint moves to `cancelled`.
pub const SYSTEM_ACTOR: &str = "system";

/// Pure state changes on a loaded appointment. Persisting is the caller's job.
pub struct AppointmentLifecycleService;

impl AppointmentLifecycleService {
    pub fn new() -> Self {
        Self
    }

    /// Validate that a status transition is allowed
    pub fn validate_status_transition(
        &self,
        current_status: &AppointmentStatus,
        new_status: &AppointmentStatus,
    ) -> Result<(), AppointmentError> {
        debug!("Validating status transition from {} to {}", current_status, new_status);

        if !self.get_valid_transitions(current_status).contains(new_status) {
            warn!("Invalid status transition attempted: {} -> {}", current_status, new_status);
            return Err(AppointmentError::InvalidStatusTransition {
                from: *current_status,
                to: *new_status,
            });
        }

        Ok(())
    }

    /// Get all valid next statuses for a given current status
    pub fn get_valid_transitions(&self, current_status: &AppointmentStatus) -> Vec<AppointmentStatus> {
        match current_status {
            AppointmentStatus::Scheduled | AppointmentStatus::Rescheduled => vec![
                AppointmentStatus::Confirmed,
                AppointmentStatus::CheckedIn,
                AppointmentStatus::Cancelled,
                AppointmentStatus::NoShow,
                AppointmentStatus::Rescheduled,
            ],
            AppointmentStatus::Confirmed => vec![
                AppointmentStatus::CheckedIn,
                AppointmentStatus::InProgress,
                AppointmentStatus::Cancelled,
                AppointmentStatus::NoShow,
                AppointmentStatus::Rescheduled,
            ],
            AppointmentStatus::CheckedIn => vec![
                AppointmentStatus::InProgress,
                AppointmentStatus::Cancelled,
                AppointmentStatus::NoShow,
            ],
            AppointmentStatus::InProgress => vec![
                AppointmentStatus::Completed,
                AppointmentStatus::Cancelled,
            ],
            // Terminal states - no transitions allowed
            AppointmentStatus::Completed
            | AppointmentStatus::Cancelled
            | AppointmentStatus::NoShow => vec![],
        }
    }

    /// Returns `false` when the appointment already had `new_status`.
    pub fn apply_status(
        &self,
        appointment: &mut Appointment,
        new_status: AppointmentStatus,
        now: DateTime<Utc>,
    ) -> Result<bool, AppointmentError> {
        if appointment.status == new_status {
            debug!("Appointment {} already {}", appointment.id, new_status);
            return Ok(false);
        }

        self.validate_status_transition(&appointment.status, &new_status)?;

        if new_status == AppointmentStatus::Cancelled {
            appointment.cancellation = Some(Cancellation {
                cancelled_by: SYSTEM_ACTOR.to_string(),
                reason: None,
                cancelled_at: now,
            });
        }

        info!("Appointment {} status: {} -> {}", appointment.id, appointment.status, new_status);
        appointment.status = new_status;
        appointment.updated_at = now;
        Ok(true)
    }

    pub fn cancel(
        &self,
        appointment: &mut Appointment,
        cancelled_by: &str,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<(), AppointmentError> {
        let cancelled_by = cancelled_by.trim();
        if cancelled_by.is_empty() {
            return Err(AppointmentError::ValidationError("cancelledBy is required".to_string()));
        }
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(AppointmentError::ValidationError("reason is required".to_string()));
        }

        self.validate_status_transition(&appointment.status, &AppointmentStatus::Cancelled)?;

        appointment.cancellation = Some(Cancellation {
            cancelled_by: cancelled_by.to_string(),
            reason: Some(reason.to_string()),
            cancelled_at: now,
        });
        appointment.status = AppointmentStatus::Cancelled;
        appointment.updated_at = now;

        info!("Appointment {} cancelled by {}", appointment.id, cancelled_by);
        Ok(())
    }

    pub fn reschedule(
        &self,
        appointment: &mut Appointment,
        request: &RescheduleAppointmentRequest,
        now: DateTime<Utc>,
    ) -> Result<(), AppointmentError> {
        if request.reason.trim().is_empty() {
            return Err(AppointmentError::ValidationError("reason is required".to_string()));
        }
        self.validate_time_range(request.new_start_time, request.new_end_time)?;
        self.validate_status_transition(&appointment.status, &AppointmentStatus::Rescheduled)?;

        appointment.reschedule_history.push(RescheduleEntry {
            previous_date: appointment.appointment_date,
            previous_start_time: appointment.start_time,
            previous_end_time: appointment.end_time,
            new_date: request.new_date,
            new_start_time: request.new_start_time,
            new_end_time: request.new_end_time,
            reason: request.reason.trim().to_string(),
            rescheduled_at: now,
        });

        appointment.appointment_date = request.new_date;
        appointment.start_time = request.new_start_time;
        appointment.end_time = request.new_end_time;
        appointment.status = AppointmentStatus::Rescheduled;
        appointment.updated_at = now;

        info!(
            "Appointment {} rescheduled to {} {}",
            appointment.id, request.new_date, request.new_start_time
        );
        Ok(())
    }

    /// Merge a partial update. A new start without a new end keeps the duration.
    pub fn apply_update(
        &self,
        appointment: &mut Appointment,
        request: UpdateAppointmentRequest,
        now: DateTime<Utc>,
    ) -> Result<(), AppointmentError> {
        let duration = appointment.end_time - appointment.start_time;

        let start_time = request.start_time.unwrap_or(appointment.start_time);
        let end_time = match (request.start_time, request.end_time) {
            (_, Some(end)) => end,
            (Some(start), None) => add_minutes(start, duration.num_minutes())?,
            (None, None) => appointment.end_time,
        };
        self.validate_time_range(start_time, end_time)?;

        if let Some(provider_id) = request.provider_id {
            appointment.provider_id = provider_id;
        }
        if let Some(date) = request.appointment_date {
            appointment.appointment_date = date;
        }
        if let Some(appointment_type) = request.appointment_type {
            appointment.appointment_type = appointment_type;
        }
        if request.reason.is_some() {
            appointment.reason = request.reason;
        }
        appointment.start_time = start_time;
        appointment.end_time = end_time;
        appointment.updated_at = now;

        Ok(())
    }

    pub fn add_clinical_note(
        &self,
        appointment: &mut Appointment,
        provider_id: Uuid,
        note: &str,
        now: DateTime<Utc>,
    ) -> Result<(), AppointmentError> {
        let note = note.trim();
        if note.is_empty() {
            return Err(AppointmentError::ValidationError("notes must not be empty".to_string()));
        }

        appointment.clinical_notes.push(ClinicalNote {
            id: Uuid::new_v4(),
            provider_id,
            note: note.to_string(),
            created_at: now,
        });
        appointment.updated_at = now;
        Ok(())
    }

    pub fn record_vitals(
        &self,
        appointment: &mut Appointment,
        mut vitals: Vitals,
        now: DateTime<Utc>,
    ) -> Result<(), AppointmentError> {
        vitals.validate()?;
        vitals.recorded_at.get_or_insert(now);

        match appointment.vitals.as_mut() {
            Some(existing) => existing.merge(vitals),
            None => appointment.vitals = Some(vitals),
        }
        appointment.updated_at = now;
        Ok(())
    }

    /// End time from an explicit end or a duration (default 30 minutes).
    pub fn resolve_end_time(
        &self,
        start_time: NaiveTime,
        end_time: Option<NaiveTime>,
        duration_minutes: Option<i64>,
    ) -> Result<NaiveTime, AppointmentError> {
        let end_time = match end_time {
            Some(end) => end,
            None => {
                let minutes = duration_minutes.unwrap_or(DEFAULT_DURATION_MINUTES);
                if !(1..=MAX_DURATION_MINUTES).contains(&minutes) {
                    return Err(AppointmentError::ValidationError(format!(
                        "durationMinutes must be between 1 and {}",
                        MAX_DURATION_MINUTES
                    )));
                }
                add_minutes(start_time, minutes)?
            }
        };

        self.validate_time_range(start_time, end_time)?;
        Ok(end_time)
    }

    pub fn validate_time_range(&self, start_time: NaiveTime, end_time: NaiveTime) -> Result<(), AppointmentError> {
        if end_time <= start_time {
            return Err(AppointmentError::ValidationError(
                "End time must be after start time".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for AppointmentLifecycleService {
    fn default() -> Self {
        Self::new()
    }
}

fn add_minutes(time: NaiveTime, minutes: i64) -> Result<NaiveTime, AppointmentError> {
    let (end, wrapped) = time.overflowing_add_signed(Duration::minutes(minutes));
    if wrapped != 0 {
        return Err(AppointmentError::ValidationError(
            "Appointment must end on the same day".to_string(),
        ));
    }
    Ok(end)
}
