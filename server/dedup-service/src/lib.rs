//! Incident dedup + triage HTTP service.
//!
//! Thin axum front over the correlation engine. Bind to 127.0.0.1 by default (internal only).

pub mod config;
mod error;
mod handlers;
pub mod http;
mod state;

use std::sync::Arc;

use axum::{routing::get, routing::post, Router};
use tower_http::cors::CorsLayer;

pub use config::ServiceConfig;
pub use error::ApiError;
pub use handlers::{classify_priority, deduplicate_image, health, report_incident, reset_history};
pub use state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
  Router::new()
    .route("/health", get(health))
    .route("/deduplicate-image", post(deduplicate_image))
    .route("/incident", post(report_incident))
    .route("/priority/classify", post(classify_priority))
    .route("/admin/reset-history", post(reset_history))
    .layer(CorsLayer::permissive())
    .with_state(state)
}
