// libs/appointment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::WithRejection;
use uuid::Uuid;

use shared_models::error::AppError;
use shared_models::response::ApiResponse;
use shared_utils::extractor::{ApiJson, ApiPath, ApiQuery};

use crate::models::{
    AppointmentFilter, AppointmentQueryParams, AvailableSlotsQuery, CancelAppointmentRequest,
    ClinicalNotesRequest, CreateAppointmentRequest, RescheduleAppointmentRequest,
    UpdateAppointmentRequest, UpdateStatusRequest, Vitals,
};
use crate::services::booking::AppointmentBookingService;
use crate::state::AppointmentState;

// ==============================================================================
// QUERIES
// ==============================================================================

#[axum::debug_handler]
pub async fn list_appointments(
    State(state): State<Arc<AppointmentState>>,
    WithRejection(Query(params), _): ApiQuery<AppointmentQueryParams>,
) -> Result<Json<ApiResponse>, AppError> {
    let booking_service = AppointmentBookingService::new(&state);

    let appointments = booking_service
        .list_appointments(AppointmentFilter::from(params))
        .await?;

    Ok(Json(ApiResponse::data(&appointments)?.with_count(appointments.len())))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<Arc<AppointmentState>>,
    WithRejection(Path(appointment_id), _): ApiPath<Uuid>,
) -> Result<Json<ApiResponse>, AppError> {
    let booking_service = AppointmentBookingService::new(&state);
    let appointment = booking_service.get_appointment(appointment_id).await?;

    Ok(Json(ApiResponse::data(appointment)?))
}

/// Working hours, bookings and free windows for one provider on one day.
#[axum::debug_handler]
pub async fn get_available_slots(
    State(state): State<Arc<AppointmentState>>,
    WithRejection(Path(provider_id), _): ApiPath<Uuid>,
    WithRejection(Query(query), _): ApiQuery<AvailableSlotsQuery>,
) -> Result<Json<ApiResponse>, AppError> {
    let booking_service = AppointmentBookingService::new(&state);
    let slots = booking_service.available_slots(provider_id, query.date).await?;

    let response = if slots.is_available {
        ApiResponse::data(&slots)?
    } else {
        ApiResponse::data(&slots)?.with_message("Provider is not available on this day")
    };

    Ok(Json(response))
}

// ==============================================================================
// MUTATIONS
// ==============================================================================

#[axum::debug_handler]
pub async fn create_appointment(
    State(state): State<Arc<AppointmentState>>,
    WithRejection(Json(request), _): ApiJson<CreateAppointmentRequest>,
) -> Result<(StatusCode, Json<ApiResponse>), AppError> {
    let booking_service = AppointmentBookingService::new(&state);
    let appointment = booking_service.create_appointment(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::data(appointment)?.with_message("Appointment created successfully")),
    ))
}

#[axum::debug_handler]
pub async fn update_appointment(
    State(state): State<Arc<AppointmentState>>,
    WithRejection(Path(appointment_id), _): ApiPath<Uuid>,
    WithRejection(Json(request), _): ApiJson<UpdateAppointmentRequest>,
) -> Result<Json<ApiResponse>, AppError> {
    let booking_service = AppointmentBookingService::new(&state);
    let appointment = booking_service.update_appointment(appointment_id, request).await?;

    Ok(Json(ApiResponse::data(appointment)?.with_message("Appointment updated successfully")))
}

#[axum::debug_handler]
pub async fn update_appointment_status(
    State(state): State<Arc<AppointmentState>>,
    WithRejection(Path(appointment_id), _): ApiPath<Uuid>,
    WithRejection(Json(request), _): ApiJson<UpdateStatusRequest>,
) -> Result<Json<ApiResponse>, AppError> {
    let booking_service = AppointmentBookingService::new(&state);
    let appointment = booking_service.update_status(appointment_id, &request.status).await?;

    Ok(Json(ApiResponse::data(appointment)?.with_message("Appointment status updated successfully")))
}

#[axum::debug_handler]
pub async fn add_clinical_notes(
    State(state): State<Arc<AppointmentState>>,
    WithRejection(Path(appointment_id), _): ApiPath<Uuid>,
    WithRejection(Json(request), _): ApiJson<ClinicalNotesRequest>,
) -> Result<Json<ApiResponse>, AppError> {
    let booking_service = AppointmentBookingService::new(&state);
    let notes = booking_service.add_clinical_notes(appointment_id, request).await?;

    Ok(Json(ApiResponse::data(notes)?.with_message("Clinical notes added successfully")))
}

#[axum::debug_handler]
pub async fn record_vitals(
    State(state): State<Arc<AppointmentState>>,
    WithRejection(Path(appointment_id), _): ApiPath<Uuid>,
    WithRejection(Json(vitals), _): ApiJson<Vitals>,
) -> Result<Json<ApiResponse>, AppError> {
    let booking_service = AppointmentBookingService::new(&state);
    let vitals = booking_service.record_vitals(appointment_id, vitals).await?;

    Ok(Json(ApiResponse::data(vitals)?.with_message("Vitals recorded successfully")))
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(state): State<Arc<AppointmentState>>,
    WithRejection(Path(appointment_id), _): ApiPath<Uuid>,
    WithRejection(Json(request), _): ApiJson<CancelAppointmentRequest>,
) -> Result<Json<ApiResponse>, AppError> {
    let booking_service = AppointmentBookingService::new(&state);
    let appointment = booking_service.cancel_appointment(appointment_id, request).await?;

    Ok(Json(ApiResponse::data(appointment)?.with_message("Appointment cancelled successfully")))
}

#[axum::debug_handler]
pub async fn reschedule_appointment(
    State(state): State<Arc<AppointmentState>>,
    WithRejection(Path(appointment_id), _): ApiPath<Uuid>,
    WithRejection(Json(request), _): ApiJson<RescheduleAppointmentRequest>,
) -> Result<Json<ApiResponse>, AppError> {
    let booking_service = AppointmentBookingService::new(&state);
    let appointment = booking_service.reschedule_appointment(appointment_id, request).await?;

    Ok(Json(ApiResponse::data(appointment)?.with_message("Appointment rescheduled successfully")))
}

#[axum::debug_handler]
pub async fn delete_appointment(
    State(state): State<Arc<AppointmentState>>,
    WithRejection(Path(appointment_id), _): ApiPath<Uuid>,
) -> Result<Json<ApiResponse>, AppError> {
    let booking_service = AppointmentBookingService::new(&state);
    booking_service.delete_appointment(appointment_id).await?;

    Ok(Json(ApiResponse::ok().with_message("Appointment deleted successfully")))
}
