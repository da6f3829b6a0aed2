use std::net::SocketAddr;
use std::sync::Arc;

use dotenv::dotenv;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{self, TraceLayer};
use tracing::{info, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod router;

use scheduling_cell::seed::seed_demo_data;
use scheduling_cell::store::{MemoryStore, SchedulingStore};
use scheduling_cell::BookingEngine;
use shared_config::AppConfig;

#[tokio::main]
async fn main() {
    // Loading Env Vars
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Medcore scheduling API server");

    // Load configuration
    let config = AppConfig::from_env();

    let store: Arc<dyn SchedulingStore> = Arc::new(MemoryStore::new());
    if config.seed_demo_data {
        if let Err(err) = seed_demo_data(store.as_ref()).await {
            tracing::warn!("demo data seeding failed: {}", err);
        }
    }

    let engine = Arc::new(BookingEngine::new(Arc::clone(&store), &config));
    if let Err(err) = engine.hydrate().await {
        tracing::warn!("slot occupancy hydration failed: {}", err);
    }

    // Set up CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build the application router
    let app = router::create_router(engine)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new().level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors);

    // Run the server
    let addr = SocketAddr::from(([0, 0, 0, 0], 3000));
    info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
