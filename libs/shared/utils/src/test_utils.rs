use std::sync::Arc;

use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::{AppConfig, StorageBackend};

pub struct TestConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_service_role_key: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
            supabase_service_role_key: "test-service-role-key".to_string(),
        }
    }
}

impl TestConfig {
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            supabase_url: url.into(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            storage_backend: StorageBackend::Supabase,
            supabase_url: self.supabase_url.clone(),
            supabase_anon_key: self.supabase_anon_key.clone(),
            supabase_service_role_key: self.supabase_service_role_key.clone(),
            ..AppConfig::default()
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

/// PostgREST-shaped rows (snake_case columns, JSON columns for nested data).
pub struct MockSupabaseResponses;

impl MockSupabaseResponses {
    pub fn patient_response(patient_id: &str, first_name: &str, last_name: &str) -> Value {
        json!({
            "id": patient_id,
            "first_name": first_name,
            "last_name": last_name,
            "email": format!("{}@example.com", first_name.to_lowercase()),
            "phone": "+353 1 555 0100",
            "stats": {}
        })
    }

    pub fn provider_response(provider_id: &str, first_name: &str, last_name: &str, specialty: &str) -> Value {
        json!({
            "id": provider_id,
            "first_name": first_name,
            "last_name": last_name,
            "specialty": specialty,
            "email": format!("{}@clinic.example.com", last_name.to_lowercase()),
            "schedule": Self::weekday_schedule("09:00", "17:00"),
            "stats": {}
        })
    }

    pub fn practice_response(practice_id: &str, name: &str) -> Value {
        json!({
            "id": practice_id,
            "name": name,
            "phone": "+353 1 555 0199",
            "stats": {}
        })
    }

    /// Monday to Friday working hours with a lunch break; weekends off.
    pub fn weekday_schedule(start: &str, end: &str) -> Value {
        let working_day = json!({
            "isAvailable": true,
            "startTime": start,
            "endTime": end,
            "breaks": [{"startTime": "12:00", "endTime": "13:00"}]
        });
        let day_off = json!({ "isAvailable": false });

        json!({
            "monday": working_day,
            "tuesday": working_day,
            "wednesday": working_day,
            "thursday": working_day,
            "friday": working_day,
            "saturday": day_off,
            "sunday": day_off
        })
    }

    #[allow(clippy::too_many_arguments)]
    pub fn appointment_response(
        appointment_id: &str,
        practice_id: &str,
        patient_id: &str,
        provider_id: &str,
        date: &str,
        start_time: &str,
        end_time: &str,
        status: &str,
    ) -> Value {
        json!({
            "id": appointment_id,
            "practice_id": practice_id,
            "patient_id": patient_id,
            "provider_id": provider_id,
            "appointment_date": date,
            "start_time": format!("{}:00", start_time),
            "end_time": format!("{}:00", end_time),
            "appointment_type": "consultation",
            "reason": null,
            "status": status,
            "clinical_notes": [],
            "vitals": null,
            "cancellation": null,
            "reschedule_history": [],
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn error_response(message: &str, code: &str) -> Value {
        json!({
            "message": message,
            "code": code,
            "details": null,
            "hint": null
        })
    }

    pub fn new_id() -> String {
        Uuid::new_v4().to_string()
    }
}
