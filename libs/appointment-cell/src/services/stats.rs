// libs/appointment-cell/src/services/stats.rs
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::{
    Appointment, AppointmentError, AppointmentFilter, AppointmentStatus, PatientStats,
    PracticeStats, ProviderStats,
};
use crate::store::{AppointmentStore, ClinicDirectory};

/// Keeps the `stats` blocks on patients, providers and practices in line with
/// their appointments. Counts are recomputed from the store on every refresh,
/// so a missed refresh is repaired by the next one.
pub struct AppointmentStatsService {
    store: Arc<dyn AppointmentStore>,
    directory: Arc<dyn ClinicDirectory>,
}

impl AppointmentStatsService {
    pub fn new(store: Arc<dyn AppointmentStore>, directory: Arc<dyn ClinicDirectory>) -> Self {
        Self { store, directory }
    }

    /// Best effort: failures are logged and never reach the caller.
    pub async fn refresh_for(&self, appointment: &Appointment) {
        self.refresh_patient(appointment.patient_id).await;
        self.refresh_provider(appointment.provider_id).await;
        self.refresh_practice(appointment.practice_id).await;
    }

    pub async fn refresh_patient(&self, patient_id: Uuid) {
        let result = async {
            let stats = self.patient_stats(patient_id, Utc::now().date_naive()).await?;
            self.directory.update_patient_stats(patient_id, &stats).await?;
            Ok::<_, AppointmentError>(())
        }
        .await;

        if let Err(e) = result {
            warn!("Failed to refresh stats for patient {}: {}", patient_id, e);
        }
    }

    pub async fn refresh_provider(&self, provider_id: Uuid) {
        let result = async {
            let stats = self.provider_stats(provider_id).await?;
            self.directory.update_provider_stats(provider_id, &stats).await?;
            Ok::<_, AppointmentError>(())
        }
        .await;

        if let Err(e) = result {
            warn!("Failed to refresh stats for provider {}: {}", provider_id, e);
        }
    }

    pub async fn refresh_practice(&self, practice_id: Uuid) {
        let result = async {
            let stats = self.practice_stats(practice_id).await?;
            self.directory.update_practice_stats(practice_id, &stats).await?;
            Ok::<_, AppointmentError>(())
        }
        .await;

        if let Err(e) = result {
            warn!("Failed to refresh stats for practice {}: {}", practice_id, e);
        }
    }

    pub async fn patient_stats(&self, patient_id: Uuid, today: NaiveDate) -> Result<PatientStats, AppointmentError> {
        let appointments = self.store.find(&AppointmentFilter::for_patient(patient_id)).await?;
        let stats = summarize_patient(&appointments, today);
        debug!("Patient {} stats: {:?}", patient_id, stats);
        Ok(stats)
    }

    pub async fn provider_stats(&self, provider_id: Uuid) -> Result<ProviderStats, AppointmentError> {
        let appointments = self.store.find(&AppointmentFilter::for_provider(provider_id)).await?;
        Ok(ProviderStats {
            total_appointments: count_not_cancelled(&appointments),
            last_updated: Some(Utc::now()),
        })
    }

    pub async fn practice_stats(&self, practice_id: Uuid) -> Result<PracticeStats, AppointmentError> {
        let appointments = self.store.find(&AppointmentFilter::for_practice(practice_id)).await?;
        Ok(PracticeStats {
            total_appointments: appointments.len() as u64,
            last_updated: Some(Utc::now()),
        })
    }
}

fn count_not_cancelled(appointments: &[Appointment]) -> u64 {
    appointments
        .iter()
        .filter(|a| a.status != AppointmentStatus::Cancelled)
        .count() as u64
}

fn summarize_patient(appointments: &[Appointment], today: NaiveDate) -> PatientStats {
    let cancelled = appointments
        .iter()
        .filter(|a| a.status == AppointmentStatus::Cancelled)
        .count();

    let next_appointment_date = appointments
        .iter()
        .filter(|a| a.status.is_blocking() && !a.status.is_terminal() && a.appointment_date >= today)
        .map(|a| a.appointment_date)
        .min();

    PatientStats {
        total_appointments: appointments.len() as u64,
        cancelled_appointments: cancelled as u64,
        next_appointment_date,
        last_updated: Some(Utc::now()),
    }
}
