//! SCIEX API - REST server
//!
//! Accepts PDF uploads and returns the named entities found in them, each
//! with char offsets and a context snippet.
//!
//! Author: hephaex@gmail.com

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;
pub mod upload;

use axum::{extract::DefaultBodyLimit, routing::get, Router};
use handlers::{health, openapi};
use state::AppState;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub use handlers::openapi::ApiDoc;

/// Build the application router around shared state
pub fn create_router(state: Arc<AppState>) -> Router {
    let body_limit = state.config.server.max_body_size;

    Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .route("/openapi.yaml", get(openapi::openapi_yaml))
        .nest("/api/v1", routes::api_routes())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
