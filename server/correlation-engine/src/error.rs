//! Structured error types for the correlation engine.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
  #[error("validation: {field}: {reason}")]
  Validation { field: String, reason: String },

  #[error("provider: {0}")]
  Provider(String),

  #[error("degenerate vector: embedding has zero norm")]
  DegenerateVector,

  #[error("dimension mismatch: {left} vs {right}")]
  DimensionMismatch { left: usize, right: usize },

  #[error("incomparable location modes")]
  IncomparableLocation,
}

impl EngineError {
  pub fn validation(field: &str, reason: &str) -> Self {
    Self::Validation {
      field: field.to_string(),
      reason: reason.to_string(),
    }
  }

  pub fn provider(msg: impl Into<String>) -> Self {
    Self::Provider(msg.into())
  }

  /// Primitive-level faults that only ever disqualify a single candidate.
  pub fn is_candidate_fault(&self) -> bool {
    matches!(self, Self::DegenerateVector | Self::DimensionMismatch { .. })
  }
}
