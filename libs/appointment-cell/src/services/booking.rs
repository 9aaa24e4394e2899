// libs/appointment-cell/src/services/booking.rs
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use futures::future::try_join_all;
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::{
    Appointment, AppointmentDetail, AppointmentError, AppointmentFilter, AppointmentStatus,
    AppointmentView, AvailableSlotsResponse, CancelAppointmentRequest, ClinicalNote,
    ClinicalNotesRequest, CreateAppointmentRequest, PatientSummary, PracticeSummary,
    ProviderSummary, RescheduleAppointmentRequest, UpdateAppointmentRequest, Vitals,
};
use crate::services::availability::AvailabilityService;
use crate::services::conflict::ConflictDetectionService;
use crate::services::lifecycle::AppointmentLifecycleService;
use crate::services::stats::AppointmentStatsService;
use crate::state::AppointmentState;
use crate::store::{AppointmentStore, ClinicDirectory};

/// Entry point for every appointment operation exposed over HTTP.
pub struct AppointmentBookingService {
    store: Arc<dyn AppointmentStore>,
    directory: Arc<dyn ClinicDirectory>,
    conflict_service: ConflictDetectionService,
    lifecycle_service: AppointmentLifecycleService,
    availability_service: AvailabilityService,
    stats_service: AppointmentStatsService,
}

impl AppointmentBookingService {
    pub fn new(state: &AppointmentState) -> Self {
        let store = state.appointments.clone();
        let directory = state.directory.clone();

        Self {
            conflict_service: ConflictDetectionService::new(store.clone()),
            lifecycle_service: AppointmentLifecycleService::new(),
            availability_service: AvailabilityService::new(store.clone(), directory.clone()),
            stats_service: AppointmentStatsService::new(store.clone(), directory.clone()),
            store,
            directory,
        }
    }

    // ==============================================================================
    // QUERIES
    // ==============================================================================

    pub async fn list_appointments(&self, filter: AppointmentFilter) -> Result<Vec<AppointmentView>, AppointmentError> {
        debug!("Listing appointments with filter {:?}", filter);
        let appointments = self.store.find(&filter).await?;
        self.enrich(appointments).await
    }

    pub async fn get_appointment(&self, appointment_id: Uuid) -> Result<AppointmentDetail, AppointmentError> {
        let appointment = self.load(appointment_id).await?;

        let (patient, provider, practice, context) = futures::try_join!(
            self.directory.patient(appointment.patient_id),
            self.directory.provider(appointment.provider_id),
            self.directory.practice(appointment.practice_id),
            self.directory.clinical_context(appointment.id),
        )?;

        Ok(AppointmentDetail {
            patient: patient.as_ref().map(PatientSummary::from),
            provider: provider.as_ref().map(ProviderSummary::from),
            practice: practice.as_ref().map(PracticeSummary::from),
            clinical_records: context.clinical_records,
            prescriptions: context.prescriptions,
            treatments: context.treatments,
            appointment,
        })
    }

    pub async fn available_slots(
        &self,
        provider_id: Uuid,
        date: NaiveDate,
    ) -> Result<AvailableSlotsResponse, AppointmentError> {
        self.availability_service.available_slots(provider_id, date).await
    }

    // ==============================================================================
    // MUTATIONS
    // ==============================================================================

    pub async fn create_appointment(&self, request: CreateAppointmentRequest) -> Result<Appointment, AppointmentError> {
        debug!(
            "Booking provider {} on {} at {} for patient {}",
            request.provider_id, request.appointment_date, request.start_time, request.patient_id
        );

        self.ensure_practice(request.practice_id).await?;
        self.ensure_patient(request.patient_id).await?;
        self.ensure_provider(request.provider_id).await?;

        let end_time = self.lifecycle_service.resolve_end_time(
            request.start_time,
            request.end_time,
            request.duration_minutes,
        )?;

        self.conflict_service
            .ensure_slot_free(request.provider_id, request.appointment_date, request.start_time, None)
            .await?;

        let now = Utc::now();
        let appointment = Appointment {
            id: Uuid::new_v4(),
            practice_id: request.practice_id,
            patient_id: request.patient_id,
            provider_id: request.provider_id,
            appointment_date: request.appointment_date,
            start_time: request.start_time,
            end_time,
            appointment_type: request
                .appointment_type
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| "consultation".to_string()),
            reason: request.reason,
            status: AppointmentStatus::Scheduled,
            clinical_notes: Vec::new(),
            vitals: None,
            cancellation: None,
            reschedule_history: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        let created = self.store.insert(&appointment).await?;
        info!("Appointment {} booked", created.id);

        self.stats_service.refresh_for(&created).await;
        Ok(created)
    }

    pub async fn update_appointment(
        &self,
        appointment_id: Uuid,
        request: UpdateAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        let mut appointment = self.load(appointment_id).await?;
        let previous_provider = appointment.provider_id;

        if let Some(provider_id) = request.provider_id.filter(|id| *id != previous_provider) {
            self.ensure_provider(provider_id).await?;
        }

        self.lifecycle_service.apply_update(&mut appointment, request, Utc::now())?;

        if appointment.status.is_blocking() {
            self.conflict_service
                .ensure_slot_free(
                    appointment.provider_id,
                    appointment.appointment_date,
                    appointment.start_time,
                    Some(appointment.id),
                )
                .await?;
        }

        let updated = self.store.replace(&appointment).await?;
        info!("Appointment {} updated", updated.id);

        if updated.provider_id != previous_provider {
            self.stats_service.refresh_provider(previous_provider).await;
            self.stats_service.refresh_provider(updated.provider_id).await;
        }

        Ok(updated)
    }

    pub async fn update_status(&self, appointment_id: Uuid, status: &str) -> Result<Appointment, AppointmentError> {
        let new_status: AppointmentStatus = status.parse()?;
        let mut appointment = self.load(appointment_id).await?;

        if !self.lifecycle_service.apply_status(&mut appointment, new_status, Utc::now())? {
            return Ok(appointment);
        }

        let updated = self.store.replace(&appointment).await?;
        self.stats_service.refresh_for(&updated).await;
        Ok(updated)
    }

    pub async fn add_clinical_notes(
        &self,
        appointment_id: Uuid,
        request: ClinicalNotesRequest,
    ) -> Result<Vec<ClinicalNote>, AppointmentError> {
        let mut appointment = self.load(appointment_id).await?;

        self.lifecycle_service.add_clinical_note(
            &mut appointment,
            request.provider_id,
            &request.notes,
            Utc::now(),
        )?;

        let updated = self.store.replace(&appointment).await?;
        info!("Clinical note added to appointment {}", updated.id);
        Ok(updated.clinical_notes)
    }

    pub async fn record_vitals(&self, appointment_id: Uuid, vitals: Vitals) -> Result<Vitals, AppointmentError> {
        let mut appointment = self.load(appointment_id).await?;

        self.lifecycle_service.record_vitals(&mut appointment, vitals, Utc::now())?;

        let updated = self.store.replace(&appointment).await?;
        info!("Vitals recorded for appointment {}", updated.id);
        updated
            .vitals
            .ok_or_else(|| AppointmentError::DatabaseError("Vitals missing after write".to_string()))
    }

    pub async fn cancel_appointment(
        &self,
        appointment_id: Uuid,
        request: CancelAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        let mut appointment = self.load(appointment_id).await?;

        self.lifecycle_service.cancel(
            &mut appointment,
            &request.cancelled_by,
            &request.reason,
            Utc::now(),
        )?;

        let updated = self.store.replace(&appointment).await?;
        self.stats_service.refresh_for(&updated).await;
        Ok(updated)
    }

    pub async fn reschedule_appointment(
        &self,
        appointment_id: Uuid,
        request: RescheduleAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        let mut appointment = self.load(appointment_id).await?;

        self.lifecycle_service.reschedule(&mut appointment, &request, Utc::now())?;

        self.conflict_service
            .ensure_slot_free(
                appointment.provider_id,
                request.new_date,
                request.new_start_time,
                Some(appointment.id),
            )
            .await?;

        let updated = self.store.replace(&appointment).await?;
        self.stats_service.refresh_for(&updated).await;
        Ok(updated)
    }

    pub async fn delete_appointment(&self, appointment_id: Uuid) -> Result<(), AppointmentError> {
        let appointment = self.load(appointment_id).await?;

        if !self.store.delete(appointment_id).await? {
            return Err(AppointmentError::NotFound);
        }
        info!("Appointment {} deleted", appointment_id);

        self.stats_service.refresh_for(&appointment).await;
        Ok(())
    }

    // ==============================================================================
    // HELPERS
    // ==============================================================================

    async fn load(&self, appointment_id: Uuid) -> Result<Appointment, AppointmentError> {
        self.store
            .get(appointment_id)
            .await?
            .ok_or(AppointmentError::NotFound)
    }

    async fn ensure_practice(&self, practice_id: Uuid) -> Result<(), AppointmentError> {
        self.directory
            .practice(practice_id)
            .await?
            .map(|_| ())
            .ok_or(AppointmentError::PracticeNotFound)
    }

    async fn ensure_patient(&self, patient_id: Uuid) -> Result<(), AppointmentError> {
        self.directory
            .patient(patient_id)
            .await?
            .map(|_| ())
            .ok_or(AppointmentError::PatientNotFound)
    }

    async fn ensure_provider(&self, provider_id: Uuid) -> Result<(), AppointmentError> {
        self.directory
            .provider(provider_id)
            .await?
            .map(|_| ())
            .ok_or(AppointmentError::ProviderNotFound)
    }

    /// Attach summaries, fetching each distinct related record once.
    async fn enrich(&self, appointments: Vec<Appointment>) -> Result<Vec<AppointmentView>, AppointmentError> {
        let patient_ids: HashSet<Uuid> = appointments.iter().map(|a| a.patient_id).collect();
        let provider_ids: HashSet<Uuid> = appointments.iter().map(|a| a.provider_id).collect();
        let practice_ids: HashSet<Uuid> = appointments.iter().map(|a| a.practice_id).collect();

        let (patients, providers, practices) = futures::try_join!(
            try_join_all(patient_ids.iter().map(|id| self.directory.patient(*id))),
            try_join_all(provider_ids.iter().map(|id| self.directory.provider(*id))),
            try_join_all(practice_ids.iter().map(|id| self.directory.practice(*id))),
        )?;

        let patients: HashMap<Uuid, PatientSummary> = patients
            .iter()
            .flatten()
            .map(|p| (p.id, PatientSummary::from(p)))
            .collect();
        let providers: HashMap<Uuid, ProviderSummary> = providers
            .iter()
            .flatten()
            .map(|p| (p.id, ProviderSummary::from(p)))
            .collect();
        let practices: HashMap<Uuid, PracticeSummary> = practices
            .iter()
            .flatten()
            .map(|p| (p.id, PracticeSummary::from(p)))
            .collect();

        Ok(appointments
            .into_iter()
            .map(|appointment| AppointmentView {
                patient: patients.get(&appointment.patient_id).cloned(),
                provider: providers.get(&appointment.provider_id).cloned(),
                practice: practices.get(&appointment.practice_id).cloned(),
                appointment,
            })
            .collect())
    }
}
