//! Core types for the correlation engine (JSON contracts + internal models).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

// ---------------------------------------------------------------------------
// Inbound types (JSON contract — what the caller sends)
// ---------------------------------------------------------------------------

/// Image dedup request. Unknown fields are silently ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct InboundImageRequest {
  pub new_image: InboundNewImage,
  #[serde(default)]
  pub candidate_images: Vec<InboundCandidateImage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InboundNewImage {
  #[serde(alias = "image_url")]
  pub image_ref: String,
  #[serde(alias = "latitude")]
  pub lat: f64,
  #[serde(alias = "longitude")]
  pub lon: f64,
  pub timestamp: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InboundCandidateImage {
  #[serde(alias = "image_url")]
  pub image_ref: String,
  pub incident_id: String,
  pub image_id: String,
  #[serde(alias = "latitude")]
  pub lat: f64,
  #[serde(alias = "longitude")]
  pub lon: f64,
  pub timestamp: String,
}

/// Free-text incident report. Exactly one location mode must resolve.
#[derive(Debug, Clone, Deserialize)]
pub struct InboundTextReport {
  pub text: String,
  pub timestamp: String,
  #[serde(default)]
  pub area_id: Option<String>,
  #[serde(default)]
  pub latitude: Option<f64>,
  #[serde(default)]
  pub longitude: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PriorityRequest {
  pub incident_id: String,
  pub incident_type: String,
  pub description: String,
  #[serde(default)]
  pub report_count: Option<i64>,
  /// Legacy alias for `report_count`.
  #[serde(default)]
  pub duplicates: Option<i64>,
  pub image_attached: bool,
  pub time_since_report_minutes: i64,
}

// ---------------------------------------------------------------------------
// Location
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
  pub lat: f64,
  pub lon: f64,
}

impl GeoPoint {
  pub fn new(lat: f64, lon: f64) -> Self {
    Self { lat, lon }
  }
}

/// The single location descriptor an incident carries for its lifetime.
#[derive(Debug, Clone, PartialEq)]
pub enum Location {
  Point(GeoPoint),
  Area(String),
}

// ---------------------------------------------------------------------------
// Internal normalized types
// ---------------------------------------------------------------------------

/// History entry for text dedup. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct IncidentRecord {
  /// Cleaned report text.
  pub text: String,
  pub timestamp: DateTime<Utc>,
  pub location: Location,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageReport {
  pub image_ref: String,
  pub location: GeoPoint,
  pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CandidateImage {
  pub image_ref: String,
  pub incident_id: String,
  pub image_id: String,
  pub location: GeoPoint,
  pub timestamp: DateTime<Utc>,
}

/// Validated image dedup batch.
#[derive(Debug, Clone)]
pub struct ImageBatch {
  pub new_image: ImageReport,
  pub candidates: Vec<CandidateImage>,
}

/// Priority request after legacy-field folding and flooring.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriorityInput {
  pub incident_id: String,
  pub incident_type: String,
  pub description: String,
  pub report_count: u32,
  pub image_attached: bool,
  pub time_since_report_minutes: i64,
}

// ---------------------------------------------------------------------------
// Embeddings + scoring
// ---------------------------------------------------------------------------

/// Fixed-length embedding vector as produced by a provider.
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding(Vec<f32>);

impl Embedding {
  pub fn new(values: Vec<f32>) -> Result<Self, EngineError> {
    if values.is_empty() {
      return Err(EngineError::provider("empty embedding"));
    }
    if values.iter().any(|v| !v.is_finite()) {
      return Err(EngineError::provider("embedding contains non-finite values"));
    }
    Ok(Self(values))
  }

  pub fn as_slice(&self) -> &[f32] {
    &self.0
  }

  pub fn dim(&self) -> usize {
    self.0.len()
  }
}

/// Per-signal similarities, each in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimilarityTriple {
  pub content: f64,
  pub location: f64,
  pub time: f64,
}

impl SimilarityTriple {
  /// Raw cosine can be negative; the content signal is floored at 0 here.
  pub fn new(content: f64, location: f64, time: f64) -> Self {
    Self {
      content: content.clamp(0.0, 1.0),
      location: location.clamp(0.0, 1.0),
      time: time.clamp(0.0, 1.0),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
  SameIncident,
  NewIncident,
  CandidateProcessingError,
}

/// Result of scoring one candidate: a scored decision or the fault that stopped it.
#[derive(Debug)]
pub enum CandidateOutcome {
  Scored {
    triple: SimilarityTriple,
    score: f64,
    decision: Decision,
  },
  Failed(EngineError),
}

impl CandidateOutcome {
  pub fn score(&self) -> f64 {
    match self {
      Self::Scored { score, .. } => *score,
      Self::Failed(_) => 0.0,
    }
  }

  pub fn decision(&self) -> Decision {
    match self {
      Self::Scored { decision, .. } => *decision,
      Self::Failed(_) => Decision::CandidateProcessingError,
    }
  }
}

// ---------------------------------------------------------------------------
// Priority
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
  Low,
  Medium,
  High,
}

impl Priority {
  /// Case-insensitive match on the three wire labels. Synonyms are not mapped.
  pub fn from_label(s: &str) -> Option<Self> {
    match s.trim().to_ascii_lowercase().as_str() {
      "high" => Some(Self::High),
      "medium" => Some(Self::Medium),
      "low" => Some(Self::Low),
      _ => None,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Method {
  HardRule,
  Fallback,
}

/// What a fallback classifier answers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
  pub priority: Priority,
  pub confidence: f64,
  pub reason: String,
}

// ---------------------------------------------------------------------------
// Output types (JSON contract — what we emit)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageMatch {
  pub image_id: String,
  pub incident_id: String,
  pub similarity_score: f64,
  pub decision: Decision,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageDedupResponse {
  pub image_matches: Vec<ImageMatch>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TextDedupResponse {
  pub duplicate: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriorityResponse {
  pub incident_id: String,
  pub priority: Priority,
  pub confidence: f64,
  pub reason: String,
  pub method: Method,
}

/// Structured error body for rejected requests.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorOutput {
  pub error: bool,
  pub message: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub field: Option<String>,
}

impl ErrorOutput {
  pub fn new(message: impl Into<String>) -> Self {
    Self {
      error: true,
      message: message.into(),
      field: None,
    }
  }

  pub fn with_field(mut self, field: impl Into<String>) -> Self {
    self.field = Some(field.into());
    self
  }
}
