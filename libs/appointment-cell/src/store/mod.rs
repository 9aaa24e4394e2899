// libs/appointment-cell/src/store/mod.rs
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    Appointment, AppointmentError, AppointmentFilter, ClinicalContext, Patient, PatientStats,
    Practice, PracticeStats, Provider, ProviderStats,
};

pub mod memory;
pub mod supabase;

pub use memory::{InMemoryStore, SeedData};
pub use supabase::SupabaseStore;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Record not found")]
    NotFound,

    /// Another blocking appointment already holds the provider/date/start slot.
    #[error("Slot already taken")]
    SlotTaken,

    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<StoreError> for AppointmentError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NotFound => AppointmentError::NotFound,
            StoreError::SlotTaken => AppointmentError::SlotConflict,
            other => AppointmentError::DatabaseError(other.to_string()),
        }
    }
}

/// Persistence for appointments.
///
/// `insert` and `replace` enforce slot uniqueness themselves: a blocking
/// record may not share `(provider_id, appointment_date, start_time)` with
/// another blocking record. Callers still pre-check so the common case gets a
/// clean error, but the write is the authority when requests race.
#[async_trait]
pub trait AppointmentStore: Send + Sync {
    /// Matching appointments ordered by date then start time.
    async fn find(&self, filter: &AppointmentFilter) -> Result<Vec<Appointment>, StoreError>;

    async fn get(&self, id: Uuid) -> Result<Option<Appointment>, StoreError>;

    /// The blocking appointment holding a slot, ignoring `exclude`.
    async fn find_slot_holder(
        &self,
        provider_id: Uuid,
        date: NaiveDate,
        start_time: NaiveTime,
        exclude: Option<Uuid>,
    ) -> Result<Option<Appointment>, StoreError>;

    async fn insert(&self, appointment: &Appointment) -> Result<Appointment, StoreError>;

    async fn replace(&self, appointment: &Appointment) -> Result<Appointment, StoreError>;

    /// Returns `false` when nothing was deleted.
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;
}

/// Read access to the records appointments point at, plus their stats.
#[async_trait]
pub trait ClinicDirectory: Send + Sync {
    async fn patient(&self, id: Uuid) -> Result<Option<Patient>, StoreError>;

    async fn provider(&self, id: Uuid) -> Result<Option<Provider>, StoreError>;

    async fn practice(&self, id: Uuid) -> Result<Option<Practice>, StoreError>;

    async fn update_patient_stats(&self, id: Uuid, stats: &PatientStats) -> Result<(), StoreError>;

    async fn update_provider_stats(&self, id: Uuid, stats: &ProviderStats) -> Result<(), StoreError>;

    async fn update_practice_stats(&self, id: Uuid, stats: &PracticeStats) -> Result<(), StoreError>;

    /// Clinical records, prescriptions and treatments linked to an appointment.
    async fn clinical_context(&self, appointment_id: Uuid) -> Result<ClinicalContext, StoreError>;
}
