// libs/scheduling-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::AppError;

use crate::models::{
    AppointmentQuery, AppointmentStatus, BookAppointmentRequest, CancelAppointmentRequest,
    CompleteAppointmentRequest, DefineAvailabilityRequest, RescheduleAppointmentRequest,
    SchedulingError,
};
use crate::services::booking::BookingEngine;

// ==============================================================================
// QUERY PARAMETER STRUCTS
// ==============================================================================

#[derive(Debug, Deserialize)]
pub struct SlotsQuery {
    pub doctor_id: Uuid,
    pub date: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct AppointmentQueryParams {
    pub patient_id: Option<Uuid>,
    pub doctor_id: Option<Uuid>,
    pub status: Option<AppointmentStatus>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
}

// ==============================================================================
// HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn query_available_slots(
    State(engine): State<Arc<BookingEngine>>,
    Query(params): Query<SlotsQuery>,
) -> Result<Json<Value>, AppError> {
    let slots = engine
        .query_available_slots(params.doctor_id, params.date)
        .await
        .map_err(into_app_error)?;

    Ok(Json(json!({
        "doctor_id": params.doctor_id,
        "date": params.date,
        "slots": slots,
    })))
}

#[axum::debug_handler]
pub async fn book_appointment(
    State(engine): State<Arc<BookingEngine>>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let appointment = engine.book(request).await.map_err(into_app_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
    })))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(engine): State<Arc<BookingEngine>>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let appointment = engine
        .get_appointment(appointment_id)
        .await
        .map_err(into_app_error)?;

    Ok(Json(json!({ "appointment": appointment })))
}

#[axum::debug_handler]
pub async fn search_appointments(
    State(engine): State<Arc<BookingEngine>>,
    Query(params): Query<AppointmentQueryParams>,
) -> Result<Json<Value>, AppError> {
    let query = AppointmentQuery {
        patient_id: params.patient_id,
        doctor_id: params.doctor_id,
        status: params.status,
        from_date: params.from_date,
        to_date: params.to_date,
    };
    let appointments = engine
        .list_appointments(&query)
        .await
        .map_err(into_app_error)?;

    Ok(Json(json!({
        "count": appointments.len(),
        "appointments": appointments,
    })))
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(engine): State<Arc<BookingEngine>>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<CancelAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let appointment = engine
        .cancel(appointment_id, request.actor)
        .await
        .map_err(into_app_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
    })))
}

#[axum::debug_handler]
pub async fn reschedule_appointment(
    State(engine): State<Arc<BookingEngine>>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<RescheduleAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let appointment = engine
        .reschedule(appointment_id, request.new_date, request.new_time, request.actor)
        .await
        .map_err(into_app_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
    })))
}

#[axum::debug_handler]
pub async fn complete_appointment(
    State(engine): State<Arc<BookingEngine>>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<CompleteAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let appointment = engine
        .complete(appointment_id, request.notes)
        .await
        .map_err(into_app_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
    })))
}

#[axum::debug_handler]
pub async fn define_availability(
    State(engine): State<Arc<BookingEngine>>,
    Path(doctor_id): Path<Uuid>,
    Json(request): Json<DefineAvailabilityRequest>,
) -> Result<Json<Value>, AppError> {
    let entry = engine
        .define_availability(doctor_id, request)
        .await
        .map_err(into_app_error)?;

    Ok(Json(json!({
        "success": true,
        "availability": entry,
    })))
}

#[axum::debug_handler]
pub async fn equipment_status(
    State(engine): State<Arc<BookingEngine>>,
    Path(equipment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let equipment = engine
        .equipment_status(equipment_id)
        .await
        .map_err(into_app_error)?;

    Ok(Json(json!({
        "equipment_id": equipment.id,
        "name": equipment.name,
        "status": equipment.status,
    })))
}

#[axum::debug_handler]
pub async fn unread_notification_count(
    State(engine): State<Arc<BookingEngine>>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let unread = engine
        .unread_notification_count(user_id)
        .await
        .map_err(into_app_error)?;

    Ok(Json(json!({ "user_id": user_id, "unread": unread })))
}

#[axum::debug_handler]
pub async fn mark_notification_read(
    State(engine): State<Arc<BookingEngine>>,
    Path(notification_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    engine
        .mark_notification_read(notification_id)
        .await
        .map_err(into_app_error)?;

    Ok(Json(json!({ "success": true })))
}

// ==============================================================================
// ERROR MAPPING
// ==============================================================================

fn into_app_error(err: SchedulingError) -> AppError {
    match err {
        SchedulingError::Validation(msg) => AppError::Validation(msg),
        SchedulingError::Conflict(msg) => AppError::Conflict(msg),
        SchedulingError::PolicyViolation(msg) => AppError::PolicyViolation(msg),
        SchedulingError::NotFound(msg) => AppError::NotFound(msg),
        SchedulingError::InvalidState(status) => AppError::Conflict(format!(
            "appointment cannot be modified in current status: {}",
            status
        )),
        SchedulingError::Busy => {
            AppError::Busy("scheduler busy, please retry shortly".to_string())
        }
        // Rolled back; surface a generic failure, details are in the logs.
        SchedulingError::Transaction(msg) => {
            tracing::error!("transaction failure surfaced to caller: {}", msg);
            AppError::Internal("operation failed and was rolled back".to_string())
        }
    }
}
