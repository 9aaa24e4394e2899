use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, NaiveDate, NaiveTime, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use appointment_cell::models::{Appointment, AppointmentStatus, Patient, Practice, Provider};
use appointment_cell::store::{AppointmentStore, ClinicDirectory, InMemoryStore};
use appointment_cell::{appointment_routes, AppointmentState};
use shared_utils::test_utils::MockSupabaseResponses;

struct Fixture {
    app: Router,
    store: Arc<InMemoryStore>,
    practice_id: Uuid,
    patient_id: Uuid,
    provider_id: Uuid,
}

async fn fixture() -> Fixture {
    let store = Arc::new(InMemoryStore::new());
    let practice_id = Uuid::new_v4();
    let patient_id = Uuid::new_v4();
    let provider_id = Uuid::new_v4();

    let patient: Patient = serde_json::from_value(MockSupabaseResponses::patient_response(
        &patient_id.to_string(),
        "Aoife",
        "Byrne",
    ))
    .unwrap();
    let provider: Provider = serde_json::from_value(MockSupabaseResponses::provider_response(
        &provider_id.to_string(),
        "Ciara",
        "Doyle",
        "General Practice",
    ))
    .unwrap();
    let practice: Practice = serde_json::from_value(MockSupabaseResponses::practice_response(
        &practice_id.to_string(),
        "Northside Family Practice",
    ))
    .unwrap();

    store.insert_patient(patient).await;
    store.insert_provider(provider).await;
    store.insert_practice(practice).await;

    let app = appointment_routes(Arc::new(AppointmentState::in_memory(store.clone())));

    Fixture {
        app,
        store,
        practice_id,
        patient_id,
        provider_id,
    }
}

impl Fixture {
    fn booking(&self, date: &str, start: &str) -> Value {
        json!({
            "practiceId": self.practice_id,
            "patientId": self.patient_id,
            "providerId": self.provider_id,
            "appointmentDate": date,
            "startTime": start
        })
    }

    async fn book(&self, date: &str, start: &str) -> Value {
        let (status, body) = send(&self.app, Method::POST, "/", Some(self.booking(date, start))).await;
        assert_eq!(status, StatusCode::CREATED, "booking failed: {}", body);
        body["data"].clone()
    }
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");

    let request = match body {
        Some(json) => request.body(Body::from(json.to_string())).unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

    (status, body)
}

async fn send_raw(app: &Router, method: Method, uri: &str, raw: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(raw.to_string()))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();

    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

fn stored_appointment(practice_id: Uuid, patient_id: Uuid, provider_id: Uuid) -> Appointment {
    let now = Utc::now();
    Appointment {
        id: Uuid::new_v4(),
        practice_id,
        patient_id,
        provider_id,
        appointment_date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
        start_time: NaiveTime::from_hms_opt(11, 0, 0).unwrap(),
        end_time: NaiveTime::from_hms_opt(11, 30, 0).unwrap(),
        appointment_type: "follow-up".to_string(),
        reason: None,
        status: AppointmentStatus::Scheduled,
        clinical_notes: vec![],
        vitals: None,
        cancellation: None,
        reschedule_history: vec![],
        created_at: now,
        updated_at: now,
    }
}

// ==============================================================================
// CREATE
// ==============================================================================

#[tokio::test]
async fn test_double_booking_is_rejected() {
    let fx = fixture().await;

    let (status, body) = send(&fx.app, Method::POST, "/", Some(fx.booking("2024-01-10", "09:00"))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"]["status"], json!("scheduled"));
    assert_eq!(body["data"]["startTime"], json!("09:00"));
    assert_eq!(body["data"]["endTime"], json!("09:30"));
    assert_eq!(body["data"]["appointmentType"], json!("consultation"));

    let (status, body) = send(&fx.app, Method::POST, "/", Some(fx.booking("2024-01-10", "09:00"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["error"], json!("Time slot already booked for this provider"));
}

#[tokio::test]
async fn test_seconds_do_not_open_a_second_slot() {
    let fx = fixture().await;
    fx.book("2024-01-10", "09:00").await;

    let (status, body) = send(&fx.app, Method::POST, "/", Some(fx.booking("2024-01-10", "09:00:30"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("Time slot already booked for this provider"));

    let (status, body) = send(&fx.app, Method::GET, "/?date=2024-01-10", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], json!(1));
    assert_eq!(body["data"][0]["startTime"], json!("09:00"));
}

#[tokio::test]
async fn test_duration_sets_end_time() {
    let fx = fixture().await;
    let mut booking = fx.booking("2024-01-10", "10:00");
    booking["durationMinutes"] = json!(45);

    let (status, body) = send(&fx.app, Method::POST, "/", Some(booking)).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["endTime"], json!("10:45"));
}

#[tokio::test]
async fn test_end_before_start_is_rejected() {
    let fx = fixture().await;
    let mut booking = fx.booking("2024-01-10", "10:00");
    booking["endTime"] = json!("09:00");

    let (status, body) = send(&fx.app, Method::POST, "/", Some(booking)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("End time must be after start time"));
}

#[tokio::test]
async fn test_cancelled_and_no_show_slots_are_released() {
    let fx = fixture().await;
    let first = fx.book("2024-01-10", "09:00").await;

    let (status, _) = send(
        &fx.app,
        Method::POST,
        &format!("/{}/cancel", first["id"].as_str().unwrap()),
        Some(json!({"cancelledBy": "patient", "reason": "Feeling better"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let second = fx.book("2024-01-10", "09:00").await;
    let (status, _) = send(
        &fx.app,
        Method::PATCH,
        &format!("/{}/status", second["id"].as_str().unwrap()),
        Some(json!({"status": "no-show"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    fx.book("2024-01-10", "09:00").await;
}

#[tokio::test]
async fn test_missing_entities_reported_in_order() {
    let fx = fixture().await;
    let unknown = Uuid::new_v4();

    let mut booking = fx.booking("2024-01-10", "09:00");
    booking["practiceId"] = json!(unknown);
    booking["patientId"] = json!(unknown);
    booking["providerId"] = json!(unknown);
    let (status, body) = send(&fx.app, Method::POST, "/", Some(booking)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], json!("Practice not found"));

    let mut booking = fx.booking("2024-01-10", "09:00");
    booking["patientId"] = json!(unknown);
    booking["providerId"] = json!(unknown);
    let (status, body) = send(&fx.app, Method::POST, "/", Some(booking)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], json!("Patient not found"));

    let mut booking = fx.booking("2024-01-10", "09:00");
    booking["providerId"] = json!(unknown);
    let (status, body) = send(&fx.app, Method::POST, "/", Some(booking)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], json!("Provider not found"));
}

#[tokio::test]
async fn test_concurrent_creates_for_one_slot() {
    let fx = fixture().await;

    let attempts = (0..8).map(|_| send(&fx.app, Method::POST, "/", Some(fx.booking("2024-01-10", "15:00"))));
    let results = futures::future::join_all(attempts).await;

    let created = results.iter().filter(|(status, _)| *status == StatusCode::CREATED).count();
    let conflicts = results.iter().filter(|(status, _)| *status == StatusCode::BAD_REQUEST).count();
    assert_eq!(created, 1);
    assert_eq!(conflicts, 7);
}

// ==============================================================================
// QUERIES
// ==============================================================================

#[tokio::test]
async fn test_list_filters_and_order() {
    let fx = fixture().await;
    fx.book("2024-01-11", "10:00").await;
    fx.book("2024-01-10", "14:00").await;
    fx.book("2024-01-10", "09:00").await;

    let (status, body) = send(&fx.app, Method::GET, "/?date=2024-01-10", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], json!(2));
    assert_eq!(body["data"][0]["startTime"], json!("09:00"));
    assert_eq!(body["data"][1]["startTime"], json!("14:00"));
    assert_eq!(body["data"][0]["patient"]["firstName"], json!("Aoife"));
    assert_eq!(body["data"][0]["provider"]["specialty"], json!("General Practice"));
    assert_eq!(body["data"][0]["practice"]["name"], json!("Northside Family Practice"));

    let (_, body) = send(&fx.app, Method::GET, "/?startDate=2024-01-10&endDate=2024-01-11", None).await;
    assert_eq!(body["count"], json!(3));
    assert_eq!(body["data"][2]["appointmentDate"], json!("2024-01-11"));

    let (_, body) = send(
        &fx.app,
        Method::GET,
        "/?date=2024-01-11&startDate=2024-01-01&endDate=2024-01-31",
        None,
    )
    .await;
    assert_eq!(body["count"], json!(1));

    let (_, body) = send(&fx.app, Method::GET, &format!("/?providerId={}", Uuid::new_v4()), None).await;
    assert_eq!(body["count"], json!(0));

    let (_, body) = send(&fx.app, Method::GET, "/?status=scheduled", None).await;
    assert_eq!(body["count"], json!(3));
}

#[tokio::test]
async fn test_list_with_missing_related_record_yields_null_summary() {
    let fx = fixture().await;
    let orphan = stored_appointment(fx.practice_id, Uuid::new_v4(), fx.provider_id);
    fx.store.insert(&orphan).await.unwrap();

    let (status, body) = send(&fx.app, Method::GET, "/", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], json!(1));
    assert_eq!(body["data"][0]["patient"], Value::Null);
    assert_eq!(body["data"][0]["provider"]["lastName"], json!("Doyle"));
}

#[tokio::test]
async fn test_get_includes_clinical_context() {
    let fx = fixture().await;
    let created = fx.book("2024-01-10", "09:00").await;
    let id = created["id"].as_str().unwrap();

    fx.store
        .insert_clinical_record(json!({"id": "cr-1", "appointmentId": id, "diagnosis": "Seasonal allergy"}))
        .await;
    fx.store
        .insert_prescription(json!({"id": "rx-1", "appointment_id": id, "medication": "Cetirizine"}))
        .await;

    let (status, body) = send(&fx.app, Method::GET, &format!("/{}", id), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], json!(id));
    assert_eq!(body["data"]["patient"]["lastName"], json!("Byrne"));
    assert_eq!(body["data"]["clinicalRecords"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"]["prescriptions"][0]["medication"], json!("Cetirizine"));
    assert_eq!(body["data"]["treatments"], json!([]));
}

#[tokio::test]
async fn test_get_unknown_appointment_is_not_found() {
    let fx = fixture().await;

    let (status, body) = send(&fx.app, Method::GET, &format!("/{}", Uuid::new_v4()), None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"success": false, "error": "Appointment not found"}));
}

// ==============================================================================
// STATUS / NOTES / VITALS
// ==============================================================================

#[tokio::test]
async fn test_status_transitions() {
    let fx = fixture().await;
    let created = fx.book("2024-01-10", "09:00").await;
    let uri = format!("/{}/status", created["id"].as_str().unwrap());

    let (status, body) = send(&fx.app, Method::PATCH, &uri, Some(json!({"status": "confirmed"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], json!("confirmed"));

    let (status, body) = send(&fx.app, Method::PATCH, &uri, Some(json!({"status": "confirmed"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], json!("confirmed"));

    let (status, body) = send(&fx.app, Method::PATCH, &uri, Some(json!({"status": "completed"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("Cannot transition appointment from confirmed to completed"));

    let (status, body) = send(&fx.app, Method::PATCH, &uri, Some(json!({"status": "finished"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("Invalid status: finished"));

    for next in ["checked-in", "in-progress", "completed"] {
        let (status, _) = send(&fx.app, Method::PATCH, &uri, Some(json!({"status": next}))).await;
        assert_eq!(status, StatusCode::OK, "transition to {}", next);
    }

    let (status, _) = send(&fx.app, Method::PATCH, &uri, Some(json!({"status": "scheduled"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_status_cancel_records_system() {
    let fx = fixture().await;
    let created = fx.book("2024-01-10", "09:00").await;

    let (status, body) = send(
        &fx.app,
        Method::PATCH,
        &format!("/{}/status", created["id"].as_str().unwrap()),
        Some(json!({"status": "cancelled"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["cancellation"]["cancelledBy"], json!("system"));
    assert_eq!(body["data"]["cancellation"]["reason"], Value::Null);
}

#[tokio::test]
async fn test_status_on_unknown_appointment() {
    let fx = fixture().await;

    let (status, body) = send(
        &fx.app,
        Method::PATCH,
        &format!("/{}/status", Uuid::new_v4()),
        Some(json!({"status": "confirmed"})),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], json!("Appointment not found"));
}

#[tokio::test]
async fn test_clinical_notes_append() {
    let fx = fixture().await;
    let created = fx.book("2024-01-10", "09:00").await;
    let uri = format!("/{}/clinical-notes", created["id"].as_str().unwrap());

    let (status, body) = send(
        &fx.app,
        Method::POST,
        &uri,
        Some(json!({"notes": "Reports mild headache", "providerId": fx.provider_id})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (_, body) = send(
        &fx.app,
        Method::POST,
        &uri,
        Some(json!({"notes": "Advised fluids and rest", "providerId": fx.provider_id})),
    )
    .await;
    let notes = body["data"].as_array().unwrap();
    assert_eq!(notes.len(), 2);
    assert_eq!(notes[1]["note"], json!("Advised fluids and rest"));
    assert_eq!(notes[1]["providerId"], json!(fx.provider_id));

    let (status, body) = send(&fx.app, Method::POST, &uri, Some(json!({"notes": "No author"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], json!(false));
}

#[tokio::test]
async fn test_vitals_are_merged_and_checked() {
    let fx = fixture().await;
    let created = fx.book("2024-01-10", "09:00").await;
    let uri = format!("/{}/vitals", created["id"].as_str().unwrap());

    let (status, body) = send(
        &fx.app,
        Method::POST,
        &uri,
        Some(json!({"bloodPressure": "120/80", "heartRate": 72})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["heartRate"], json!(72));
    assert!(body["data"]["recordedAt"].is_string());

    let (_, body) = send(&fx.app, Method::POST, &uri, Some(json!({"oxygenSaturation": 98.0}))).await;
    assert_eq!(body["data"]["bloodPressure"], json!("120/80"));
    assert_eq!(body["data"]["oxygenSaturation"], json!(98.0));

    let (status, body) = send(&fx.app, Method::POST, &uri, Some(json!({"heartRate": 500}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("heartRate must be between 20 and 300"));
}

// ==============================================================================
// CANCEL / RESCHEDULE / UPDATE / DELETE
// ==============================================================================

#[tokio::test]
async fn test_cancel_flow() {
    let fx = fixture().await;
    let created = fx.book("2024-01-10", "09:00").await;
    let uri = format!("/{}/cancel", created["id"].as_str().unwrap());

    let (status, _) = send(&fx.app, Method::POST, &uri, Some(json!({"cancelledBy": "", "reason": "x"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &fx.app,
        Method::POST,
        &uri,
        Some(json!({"cancelledBy": "patient", "reason": "   "})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("reason is required"));

    let (status, body) = send(
        &fx.app,
        Method::POST,
        &uri,
        Some(json!({"cancelledBy": "reception", "reason": "Provider sick"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], json!("cancelled"));
    assert_eq!(body["data"]["cancellation"]["cancelledBy"], json!("reception"));
    assert_eq!(body["data"]["cancellation"]["reason"], json!("Provider sick"));

    let (status, body) = send(
        &fx.app,
        Method::POST,
        &uri,
        Some(json!({"cancelledBy": "reception", "reason": "Again"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("Cannot transition appointment from cancelled to cancelled"));

    let patient = fx.store.patient(fx.patient_id).await.unwrap().unwrap();
    assert_eq!(patient.stats.total_appointments, 1);
    assert_eq!(patient.stats.cancelled_appointments, 1);
}

#[tokio::test]
async fn test_reschedule_onto_own_and_foreign_slot() {
    let fx = fixture().await;
    let first = fx.book("2024-01-10", "09:00").await;
    let second = fx.book("2024-01-10", "10:00").await;

    let (status, body) = send(
        &fx.app,
        Method::POST,
        &format!("/{}/reschedule", first["id"].as_str().unwrap()),
        Some(json!({
            "newDate": "2024-01-10",
            "newStartTime": "09:00",
            "newEndTime": "09:45",
            "reason": "Longer consult needed"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], json!("rescheduled"));
    assert_eq!(body["data"]["endTime"], json!("09:45"));
    assert_eq!(body["data"]["rescheduleHistory"][0]["previousEndTime"], json!("09:30"));

    let (status, body) = send(
        &fx.app,
        Method::POST,
        &format!("/{}/reschedule", second["id"].as_str().unwrap()),
        Some(json!({
            "newDate": "2024-01-10",
            "newStartTime": "09:00",
            "newEndTime": "09:30",
            "reason": "Earlier please"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("Time slot already booked for this provider"));

    let (status, body) = send(
        &fx.app,
        Method::POST,
        &format!("/{}/reschedule", second["id"].as_str().unwrap()),
        Some(json!({
            "newDate": "2024-01-11",
            "newStartTime": "11:00",
            "newEndTime": "10:30",
            "reason": "Backwards"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("End time must be after start time"));
}

#[tokio::test]
async fn test_update_merges_and_guards_slot() {
    let fx = fixture().await;
    fx.book("2024-01-10", "09:00").await;
    let second = fx.book("2024-01-10", "10:00").await;
    let uri = format!("/{}", second["id"].as_str().unwrap());

    let (status, body) = send(&fx.app, Method::PUT, &uri, Some(json!({"reason": "Annual review"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["reason"], json!("Annual review"));
    assert_eq!(body["data"]["startTime"], json!("10:00"));

    let (status, body) = send(&fx.app, Method::PUT, &uri, Some(json!({"startTime": "09:00"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("Time slot already booked for this provider"));

    let (status, body) = send(&fx.app, Method::PUT, &uri, Some(json!({"providerId": Uuid::new_v4()}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], json!("Provider not found"));

    let (status, body) = send(&fx.app, Method::PUT, &uri, Some(json!({"startTime": "16:00"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["endTime"], json!("16:30"));
}

#[tokio::test]
async fn test_cancel_refreshes_provider_stats() {
    let fx = fixture().await;
    let first = fx.book("2024-01-10", "09:00").await;
    fx.book("2024-01-10", "10:00").await;

    let (status, _) = send(
        &fx.app,
        Method::POST,
        &format!("/{}/cancel", first["id"].as_str().unwrap()),
        Some(json!({"cancelledBy": "patient", "reason": "Travelling"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let provider = fx.store.provider(fx.provider_id).await.unwrap().unwrap();
    let practice = fx.store.practice(fx.practice_id).await.unwrap().unwrap();
    assert_eq!(provider.stats.total_appointments, 1);
    assert_eq!(practice.stats.total_appointments, 2);
}

#[tokio::test]
async fn test_next_appointment_date_follows_bookings() {
    let fx = fixture().await;
    let today = Utc::now().date_naive();
    let in_days = |days: i64| today + Duration::days(days);

    let sooner = fx.book(&in_days(10).to_string(), "09:00").await;
    let later = fx.book(&in_days(20).to_string(), "09:00").await;

    let patient = fx.store.patient(fx.patient_id).await.unwrap().unwrap();
    assert_eq!(patient.stats.next_appointment_date, Some(in_days(10)));

    let (status, _) = send(
        &fx.app,
        Method::POST,
        &format!("/{}/cancel", sooner["id"].as_str().unwrap()),
        Some(json!({"cancelledBy": "patient", "reason": "Away that week"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let patient = fx.store.patient(fx.patient_id).await.unwrap().unwrap();
    assert_eq!(patient.stats.next_appointment_date, Some(in_days(20)));

    let (status, _) = send(
        &fx.app,
        Method::POST,
        &format!("/{}/reschedule", later["id"].as_str().unwrap()),
        Some(json!({
            "newDate": in_days(5).to_string(),
            "newStartTime": "11:00",
            "newEndTime": "11:30",
            "reason": "Earlier slot opened"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let patient = fx.store.patient(fx.patient_id).await.unwrap().unwrap();
    assert_eq!(patient.stats.next_appointment_date, Some(in_days(5)));
}

#[tokio::test]
async fn test_delete_refreshes_stats() {
    let fx = fixture().await;
    let first = fx.book("2024-01-10", "09:00").await;
    fx.book("2024-01-10", "10:00").await;

    let provider = fx.store.provider(fx.provider_id).await.unwrap().unwrap();
    assert_eq!(provider.stats.total_appointments, 2);

    let uri = format!("/{}", first["id"].as_str().unwrap());
    let (status, body) = send(&fx.app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));

    let (status, _) = send(&fx.app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let provider = fx.store.provider(fx.provider_id).await.unwrap().unwrap();
    let practice = fx.store.practice(fx.practice_id).await.unwrap().unwrap();
    assert_eq!(provider.stats.total_appointments, 1);
    assert_eq!(practice.stats.total_appointments, 1);
}

// ==============================================================================
// AVAILABILITY
// ==============================================================================

#[tokio::test]
async fn test_available_windows_exclude_breaks_and_bookings() {
    let fx = fixture().await;
    fx.book("2024-01-10", "09:00").await;

    let (status, body) = send(
        &fx.app,
        Method::GET,
        &format!("/available-slots/{}?date=2024-01-10", fx.provider_id),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["dayOfWeek"], json!("wednesday"));
    assert_eq!(data["isAvailable"], json!(true));
    assert_eq!(data["schedule"]["startTime"], json!("09:00"));
    assert_eq!(data["bookedSlots"].as_array().unwrap().len(), 1);
    assert_eq!(
        data["availableWindows"],
        json!([
            {"startTime": "09:30", "endTime": "12:00"},
            {"startTime": "13:00", "endTime": "17:00"}
        ])
    );
    assert!(body.get("message").is_none());
}

#[tokio::test]
async fn test_provider_unavailable_day() {
    let fx = fixture().await;

    let (status, body) = send(
        &fx.app,
        Method::GET,
        &format!("/available-slots/{}?date=2024-01-13", fx.provider_id),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], json!("Provider is not available on this day"));
    assert_eq!(body["data"]["isAvailable"], json!(false));
    assert_eq!(body["data"]["bookedSlots"], json!([]));
    assert_eq!(body["data"]["availableWindows"], json!([]));
}

#[tokio::test]
async fn test_available_slots_unknown_provider() {
    let fx = fixture().await;

    let (status, body) = send(
        &fx.app,
        Method::GET,
        &format!("/available-slots/{}?date=2024-01-10", Uuid::new_v4()),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], json!("Provider not found"));
}

// ==============================================================================
// MALFORMED INPUT
// ==============================================================================

#[tokio::test]
async fn test_malformed_requests_use_envelope() {
    let fx = fixture().await;

    let (status, body) = send_raw(&fx.app, Method::POST, "/", "{not json").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], json!(false));
    assert!(body["error"].is_string());

    let (status, body) = send(&fx.app, Method::GET, "/not-a-uuid", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], json!(false));

    let (status, body) = send(&fx.app, Method::GET, "/?date=tomorrow", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], json!(false));

    let mut booking = fx.booking("2024-01-10", "9 o'clock");
    booking["providerId"] = json!(fx.provider_id);
    let (status, body) = send(&fx.app, Method::POST, "/", Some(booking)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], json!(false));
}
