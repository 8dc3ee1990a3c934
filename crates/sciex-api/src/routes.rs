//! API route definitions
//!
//! Author: hephaex@gmail.com

use crate::handlers::extract;
use crate::state::AppState;
use axum::{routing::post, Router};
use std::sync::Arc;

/// Create API v1 routes
pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new().route("/extract", post(extract::extract_entities))
}
