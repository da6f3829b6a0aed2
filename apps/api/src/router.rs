use std::sync::Arc;

use axum::{routing::get, Router};

use scheduling_cell::scheduling_routes;
use scheduling_cell::BookingEngine;

pub fn create_router(engine: Arc<BookingEngine>) -> Router {
    Router::new()
        .route("/", get(|| async { "Medcore scheduling API is running!" }))
        .nest("/scheduling", scheduling_routes(engine))
}
