//! Mapping engine errors onto HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use correlation_engine::types::ErrorOutput;
use correlation_engine::EngineError;

#[derive(Debug)]
pub enum ApiError {
  Engine(EngineError),
  Unavailable(&'static str),
}

impl From<EngineError> for ApiError {
  fn from(e: EngineError) -> Self {
    Self::Engine(e)
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, body) = match self {
      Self::Engine(EngineError::Validation { field, reason }) => {
        (StatusCode::BAD_REQUEST, ErrorOutput::new(reason).with_field(field))
      }
      Self::Engine(e @ EngineError::Provider(_)) => {
        (StatusCode::BAD_GATEWAY, ErrorOutput::new(e.to_string()))
      }
      Self::Engine(e) => (StatusCode::INTERNAL_SERVER_ERROR, ErrorOutput::new(e.to_string())),
      Self::Unavailable(what) => (
        StatusCode::SERVICE_UNAVAILABLE,
        ErrorOutput::new(format!("{} is not configured", what)),
      ),
    };
    (status, Json(body)).into_response()
  }
}
