//! HTTP handlers for the dedup service.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use correlation_engine::{
  ImageDedupResponse, InboundImageRequest, InboundTextReport, PriorityRequest, PriorityResponse,
  TextDedupResponse,
};
use tracing::{info, instrument};

use crate::error::ApiError;
use crate::state::AppState;

pub async fn health() -> &'static str {
  "ok"
}

/// POST /deduplicate-image
#[instrument(skip_all, fields(candidates = request.candidate_images.len()))]
pub async fn deduplicate_image(
  State(state): State<Arc<AppState>>,
  Json(request): Json<InboundImageRequest>,
) -> Result<Json<ImageDedupResponse>, ApiError> {
  let engine = state
    .images
    .as_ref()
    .ok_or(ApiError::Unavailable("image embedding backend"))?;
  let response = engine.deduplicate_images(&request).await?;
  Ok(Json(response))
}

/// POST /incident
#[instrument(skip_all)]
pub async fn report_incident(
  State(state): State<Arc<AppState>>,
  Json(request): Json<InboundTextReport>,
) -> Result<Json<TextDedupResponse>, ApiError> {
  let response = state.texts.check_text_report(&request).await?;
  Ok(Json(response))
}

/// POST /priority/classify
#[instrument(skip_all, fields(incident_id = %request.incident_id))]
pub async fn classify_priority(
  State(state): State<Arc<AppState>>,
  Json(request): Json<PriorityRequest>,
) -> Result<Json<PriorityResponse>, ApiError> {
  let response = state.priority.classify(&request).await?;
  Ok(Json(response))
}

/// POST /admin/reset-history
pub async fn reset_history(State(state): State<Arc<AppState>>) -> StatusCode {
  let dropped = state.texts.history().len();
  state.texts.history().clear();
  info!(dropped, "incident history cleared");
  StatusCode::NO_CONTENT
}
