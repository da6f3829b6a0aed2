// libs/scheduling-cell/src/router.rs
use std::sync::Arc;

use axum::{
    routing::{get, patch, post, put},
    Router,
};

use crate::handlers;
use crate::services::booking::BookingEngine;

/// Scheduling routes. Authentication and role enforcement belong to the
/// surrounding deployment; the acting user is an explicit field of each
/// mutating request.
pub fn scheduling_routes(engine: Arc<BookingEngine>) -> Router {
    Router::new()
        .route("/slots", get(handlers::query_available_slots))
        .route("/appointments", post(handlers::book_appointment))
        .route("/appointments", get(handlers::search_appointments))
        .route("/appointments/{appointment_id}", get(handlers::get_appointment))
        .route(
            "/appointments/{appointment_id}/cancel",
            post(handlers::cancel_appointment),
        )
        .route(
            "/appointments/{appointment_id}/reschedule",
            patch(handlers::reschedule_appointment),
        )
        .route(
            "/appointments/{appointment_id}/complete",
            post(handlers::complete_appointment),
        )
        .route(
            "/doctors/{doctor_id}/availability",
            put(handlers::define_availability),
        )
        .route(
            "/equipment/{equipment_id}/status",
            get(handlers::equipment_status),
        )
        .route(
            "/notifications/{user_id}/unread-count",
            get(handlers::unread_notification_count),
        )
        .route(
            "/notifications/{notification_id}/read",
            post(handlers::mark_notification_read),
        )
        .with_state(engine)
}
