// libs/appointment-cell/src/store/supabase.rs
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::{SupabaseApiError, SupabaseClient};

use crate::models::{
    Appointment, AppointmentFilter, ClinicalContext, Patient, PatientStats, Practice,
    PracticeStats, Provider, ProviderStats,
};
use super::{AppointmentStore, ClinicDirectory, StoreError};

const APPOINTMENTS: &str = "/rest/v1/appointments";
const PATIENTS: &str = "/rest/v1/patients";
const PROVIDERS: &str = "/rest/v1/providers";
const PRACTICES: &str = "/rest/v1/practices";
const ORDER_BY_SLOT: &str = "order=appointment_date.asc,start_time.asc";
const BLOCKING_ONLY: &str = "status=not.in.(cancelled,no-show)";

/// PostgREST backend. Slot uniqueness is backed by a partial unique index on
/// `appointments (provider_id, appointment_date, start_time)` for blocking rows.
pub struct SupabaseStore {
    supabase: Arc<SupabaseClient>,
}

impl SupabaseStore {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
        }
    }

    fn token(&self) -> Option<&str> {
        self.supabase.service_token()
    }

    async fn fetch_rows<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, StoreError> {
        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, path, self.token(), None)
            .await
            .map_err(backend_error)?;

        rows.into_iter()
            .map(|row| serde_json::from_value(row).map_err(StoreError::from))
            .collect()
    }

    async fn fetch_one<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, StoreError> {
        Ok(self.fetch_rows(path).await?.into_iter().next())
    }

    async fn write_rows(&self, method: Method, path: &str, body: Value) -> Result<Vec<Appointment>, StoreError> {
        let rows: Vec<Value> = self
            .supabase
            .request_with_headers(
                method,
                path,
                self.token(),
                Some(body),
                Some(SupabaseClient::return_representation()),
            )
            .await
            .map_err(backend_error)?;

        rows.into_iter()
            .map(|row| serde_json::from_value(row).map_err(StoreError::from))
            .collect()
    }

    /// Read-merge-write of a record's `stats` JSON column so keys owned by
    /// other services survive.
    async fn merge_stats<S: Serialize>(&self, table: &str, id: Uuid, stats: &S) -> Result<(), StoreError> {
        let path = format!("{}?id=eq.{}&select=stats", table, id);
        let current: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, self.token(), None)
            .await
            .map_err(backend_error)?;

        let existing = current.into_iter().next().ok_or(StoreError::NotFound)?;
        let merged = merge_objects(
            existing.get("stats").cloned().unwrap_or(Value::Null),
            serde_json::to_value(stats)?,
        );

        self.supabase
            .execute(
                Method::PATCH,
                &format!("{}?id=eq.{}", table, id),
                self.token(),
                Some(json!({ "stats": merged })),
            )
            .await
            .map_err(backend_error)
    }
}

fn backend_error(error: anyhow::Error) -> StoreError {
    match error.downcast_ref::<SupabaseApiError>() {
        Some(api_error) if api_error.is_unique_violation() => StoreError::SlotTaken,
        _ => StoreError::Backend(error.to_string()),
    }
}

fn merge_objects(current: Value, update: Value) -> Value {
    match (current, update) {
        (Value::Object(mut base), Value::Object(changes)) => {
            base.extend(changes);
            Value::Object(base)
        }
        (_, update) => update,
    }
}

fn time_param(time: NaiveTime) -> String {
    time.format("%H:%M:%S").to_string()
}

fn date_param(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn filter_query(filter: &AppointmentFilter) -> String {
    let mut parts = Vec::new();

    if let Some(id) = filter.practice_id {
        parts.push(format!("practice_id=eq.{}", id));
    }
    if let Some(id) = filter.patient_id {
        parts.push(format!("patient_id=eq.{}", id));
    }
    if let Some(id) = filter.provider_id {
        parts.push(format!("provider_id=eq.{}", id));
    }
    if let Some(status) = filter.status {
        parts.push(format!("status=eq.{}", status));
    }
    match (filter.date_from, filter.date_to) {
        (Some(from), Some(to)) if from == to => parts.push(format!("appointment_date=eq.{}", date_param(from))),
        (from, to) => {
            if let Some(from) = from {
                parts.push(format!("appointment_date=gte.{}", date_param(from)));
            }
            if let Some(to) = to {
                parts.push(format!("appointment_date=lte.{}", date_param(to)));
            }
        }
    }
    parts.push(ORDER_BY_SLOT.to_string());

    parts.join("&")
}

fn appointment_row(appointment: &Appointment) -> Result<Value, StoreError> {
    Ok(json!({
        "id": appointment.id,
        "practice_id": appointment.practice_id,
        "patient_id": appointment.patient_id,
        "provider_id": appointment.provider_id,
        "appointment_date": date_param(appointment.appointment_date),
        "start_time": time_param(appointment.start_time),
        "end_time": time_param(appointment.end_time),
        "appointment_type": appointment.appointment_type,
        "reason": appointment.reason,
        "status": appointment.status.as_str(),
        "clinical_notes": serde_json::to_value(&appointment.clinical_notes)?,
        "vitals": serde_json::to_value(&appointment.vitals)?,
        "cancellation": serde_json::to_value(&appointment.cancellation)?,
        "reschedule_history": serde_json::to_value(&appointment.reschedule_history)?,
        "created_at": appointment.created_at.to_rfc3339(),
        "updated_at": appointment.updated_at.to_rfc3339()
    }))
}

#[async_trait]
impl AppointmentStore for SupabaseStore {
    async fn find(&self, filter: &AppointmentFilter) -> Result<Vec<Appointment>, StoreError> {
        let path = format!("{}?{}", APPOINTMENTS, filter_query(filter));
        debug!("Querying appointments: {}", path);
        self.fetch_rows(&path).await
    }

    async fn get(&self, id: Uuid) -> Result<Option<Appointment>, StoreError> {
        self.fetch_one(&format!("{}?id=eq.{}", APPOINTMENTS, id)).await
    }

    async fn find_slot_holder(
        &self,
        provider_id: Uuid,
        date: NaiveDate,
        start_time: NaiveTime,
        exclude: Option<Uuid>,
    ) -> Result<Option<Appointment>, StoreError> {
        let mut path = format!(
            "{}?provider_id=eq.{}&appointment_date=eq.{}&start_time=eq.{}&{}",
            APPOINTMENTS,
            provider_id,
            date_param(date),
            time_param(start_time),
            BLOCKING_ONLY
        );
        if let Some(id) = exclude {
            path.push_str(&format!("&id=neq.{}", id));
        }
        path.push_str("&limit=1");

        self.fetch_one(&path).await
    }

    async fn insert(&self, appointment: &Appointment) -> Result<Appointment, StoreError> {
        let rows = self
            .write_rows(Method::POST, APPOINTMENTS, appointment_row(appointment)?)
            .await?;

        rows.into_iter()
            .next()
            .ok_or_else(|| StoreError::Backend("Insert returned no rows".to_string()))
    }

    async fn replace(&self, appointment: &Appointment) -> Result<Appointment, StoreError> {
        let path = format!("{}?id=eq.{}", APPOINTMENTS, appointment.id);
        let rows = self
            .write_rows(Method::PATCH, &path, appointment_row(appointment)?)
            .await?;

        rows.into_iter().next().ok_or(StoreError::NotFound)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let path = format!("{}?id=eq.{}", APPOINTMENTS, id);
        let rows: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::DELETE,
                &path,
                self.token(),
                None,
                Some(SupabaseClient::return_representation()),
            )
            .await
            .map_err(backend_error)?;

        Ok(!rows.is_empty())
    }
}

#[async_trait]
impl ClinicDirectory for SupabaseStore {
    async fn patient(&self, id: Uuid) -> Result<Option<Patient>, StoreError> {
        self.fetch_one(&format!("{}?id=eq.{}&limit=1", PATIENTS, id)).await
    }

    async fn provider(&self, id: Uuid) -> Result<Option<Provider>, StoreError> {
        self.fetch_one(&format!("{}?id=eq.{}&limit=1", PROVIDERS, id)).await
    }

    async fn practice(&self, id: Uuid) -> Result<Option<Practice>, StoreError> {
        self.fetch_one(&format!("{}?id=eq.{}&limit=1", PRACTICES, id)).await
    }

    async fn update_patient_stats(&self, id: Uuid, stats: &PatientStats) -> Result<(), StoreError> {
        self.merge_stats(PATIENTS, id, stats).await
    }

    async fn update_provider_stats(&self, id: Uuid, stats: &ProviderStats) -> Result<(), StoreError> {
        self.merge_stats(PROVIDERS, id, stats).await
    }

    async fn update_practice_stats(&self, id: Uuid, stats: &PracticeStats) -> Result<(), StoreError> {
        self.merge_stats(PRACTICES, id, stats).await
    }

    async fn clinical_context(&self, appointment_id: Uuid) -> Result<ClinicalContext, StoreError> {
        let query = format!("appointment_id=eq.{}", appointment_id);
        let records_path = format!("/rest/v1/clinical_records?{}", query);
        let prescriptions_path = format!("/rest/v1/prescriptions?{}", query);
        let treatments_path = format!("/rest/v1/treatments?{}", query);

        let (clinical_records, prescriptions, treatments) = futures::try_join!(
            self.fetch_rows::<Value>(&records_path),
            self.fetch_rows::<Value>(&prescriptions_path),
            self.fetch_rows::<Value>(&treatments_path),
        )
        .map_err(|e| {
            warn!("Failed to load clinical context for {}: {}", appointment_id, e);
            e
        })?;

        Ok(ClinicalContext {
            clinical_records,
            prescriptions,
            treatments,
        })
    }
}
