// libs/appointment-cell/src/store/memory.rs
use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::{
    Appointment, AppointmentFilter, ClinicalContext, Patient, PatientStats, Practice,
    PracticeStats, Provider, ProviderStats,
};
use super::{AppointmentStore, ClinicDirectory, StoreError};

/// Directory fixture loaded at startup for the in-memory backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedData {
    #[serde(default)]
    pub patients: Vec<Patient>,
    #[serde(default)]
    pub providers: Vec<Provider>,
    #[serde(default)]
    pub practices: Vec<Practice>,
    #[serde(default)]
    pub clinical_records: Vec<Value>,
    #[serde(default)]
    pub prescriptions: Vec<Value>,
    #[serde(default)]
    pub treatments: Vec<Value>,
}

#[derive(Default)]
struct MemoryState {
    appointments: HashMap<Uuid, Appointment>,
    patients: HashMap<Uuid, Patient>,
    providers: HashMap<Uuid, Provider>,
    practices: HashMap<Uuid, Practice>,
    clinical_records: Vec<Value>,
    prescriptions: Vec<Value>,
    treatments: Vec<Value>,
}

impl MemoryState {
    fn slot_taken(&self, candidate: &Appointment) -> bool {
        self.appointments.values().any(|existing| candidate.collides_with(existing))
    }
}

/// Process-local backend. The slot check and the write share one write lock.
#[derive(Default)]
pub struct InMemoryStore {
    state: RwLock<MemoryState>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_seed(seed: SeedData) -> Self {
        let state = MemoryState {
            appointments: HashMap::new(),
            patients: seed.patients.into_iter().map(|p| (p.id, p)).collect(),
            providers: seed.providers.into_iter().map(|p| (p.id, p)).collect(),
            practices: seed.practices.into_iter().map(|p| (p.id, p)).collect(),
            clinical_records: seed.clinical_records,
            prescriptions: seed.prescriptions,
            treatments: seed.treatments,
        };

        Self {
            state: RwLock::new(state),
        }
    }

    pub fn from_seed_file(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| StoreError::Backend(format!("Failed to read seed file {}: {}", path.display(), e)))?;
        let seed: SeedData = serde_json::from_str(&raw)?;

        info!(
            "Loaded seed data from {}: {} patients, {} providers, {} practices",
            path.display(),
            seed.patients.len(),
            seed.providers.len(),
            seed.practices.len()
        );

        Ok(Self::from_seed(seed))
    }

    pub async fn insert_patient(&self, patient: Patient) {
        self.state.write().await.patients.insert(patient.id, patient);
    }

    pub async fn insert_provider(&self, provider: Provider) {
        self.state.write().await.providers.insert(provider.id, provider);
    }

    pub async fn insert_practice(&self, practice: Practice) {
        self.state.write().await.practices.insert(practice.id, practice);
    }

    pub async fn insert_clinical_record(&self, record: Value) {
        self.state.write().await.clinical_records.push(record);
    }

    pub async fn insert_prescription(&self, prescription: Value) {
        self.state.write().await.prescriptions.push(prescription);
    }

    pub async fn insert_treatment(&self, treatment: Value) {
        self.state.write().await.treatments.push(treatment);
    }
}

fn linked_to(record: &Value, appointment_id: Uuid) -> bool {
    let id = appointment_id.to_string();
    ["appointmentId", "appointment_id"]
        .iter()
        .filter_map(|key| record.get(key).and_then(Value::as_str))
        .any(|value| value == id)
}

fn linked_records(records: &[Value], appointment_id: Uuid) -> Vec<Value> {
    records
        .iter()
        .filter(|record| linked_to(record, appointment_id))
        .cloned()
        .collect()
}

#[async_trait]
impl AppointmentStore for InMemoryStore {
    async fn find(&self, filter: &AppointmentFilter) -> Result<Vec<Appointment>, StoreError> {
        let state = self.state.read().await;
        let mut appointments: Vec<Appointment> = state
            .appointments
            .values()
            .filter(|appointment| filter.matches(appointment))
            .cloned()
            .collect();

        appointments.sort_by(|a, b| {
            a.appointment_date
                .cmp(&b.appointment_date)
                .then(a.start_time.cmp(&b.start_time))
                .then(a.created_at.cmp(&b.created_at))
        });

        Ok(appointments)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Appointment>, StoreError> {
        Ok(self.state.read().await.appointments.get(&id).cloned())
    }

    async fn find_slot_holder(
        &self,
        provider_id: Uuid,
        date: NaiveDate,
        start_time: NaiveTime,
        exclude: Option<Uuid>,
    ) -> Result<Option<Appointment>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .appointments
            .values()
            .filter(|appointment| Some(appointment.id) != exclude)
            .find(|appointment| appointment.occupies(provider_id, date, start_time))
            .cloned())
    }

    async fn insert(&self, appointment: &Appointment) -> Result<Appointment, StoreError> {
        let mut state = self.state.write().await;

        if state.slot_taken(appointment) {
            debug!("Rejecting insert of {}: slot already held", appointment.id);
            return Err(StoreError::SlotTaken);
        }

        state.appointments.insert(appointment.id, appointment.clone());
        Ok(appointment.clone())
    }

    async fn replace(&self, appointment: &Appointment) -> Result<Appointment, StoreError> {
        let mut state = self.state.write().await;

        if !state.appointments.contains_key(&appointment.id) {
            return Err(StoreError::NotFound);
        }
        if state.slot_taken(appointment) {
            debug!("Rejecting update of {}: slot already held", appointment.id);
            return Err(StoreError::SlotTaken);
        }

        state.appointments.insert(appointment.id, appointment.clone());
        Ok(appointment.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.state.write().await.appointments.remove(&id).is_some())
    }
}

#[async_trait]
impl ClinicDirectory for InMemoryStore {
    async fn patient(&self, id: Uuid) -> Result<Option<Patient>, StoreError> {
        Ok(self.state.read().await.patients.get(&id).cloned())
    }

    async fn provider(&self, id: Uuid) -> Result<Option<Provider>, StoreError> {
        Ok(self.state.read().await.providers.get(&id).cloned())
    }

    async fn practice(&self, id: Uuid) -> Result<Option<Practice>, StoreError> {
        Ok(self.state.read().await.practices.get(&id).cloned())
    }

    async fn update_patient_stats(&self, id: Uuid, stats: &PatientStats) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        let patient = state.patients.get_mut(&id).ok_or(StoreError::NotFound)?;
        patient.stats = stats.clone();
        Ok(())
    }

    async fn update_provider_stats(&self, id: Uuid, stats: &ProviderStats) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        let provider = state.providers.get_mut(&id).ok_or(StoreError::NotFound)?;
        provider.stats = stats.clone();
        Ok(())
    }

    async fn update_practice_stats(&self, id: Uuid, stats: &PracticeStats) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        let practice = state.practices.get_mut(&id).ok_or(StoreError::NotFound)?;
        practice.stats = stats.clone();
        Ok(())
    }

    async fn clinical_context(&self, appointment_id: Uuid) -> Result<ClinicalContext, StoreError> {
        let state = self.state.read().await;
        Ok(ClinicalContext {
            clinical_records: linked_records(&state.clinical_records, appointment_id),
            prescriptions: linked_records(&state.prescriptions, appointment_id),
            treatments: linked_records(&state.treatments, appointment_id),
        })
    }
}
