//! Incident report correlation engine — deterministic decision core.
//!
//! Decides whether a new incident report (image or text) duplicates recent ones by
//! fusing embedding, location and time similarity inside a candidate window, and
//! assigns a priority tier via hard rules with a pluggable fallback classifier.
//!
//! Embedding and classification backends are injected; no DB, no network here.

pub mod config;
pub mod engine;
pub mod error;
pub mod fusion;
pub mod heuristic;
pub mod history;
pub mod normalize;
pub mod provider;
pub mod similarity;
pub mod triage;
pub mod types;
pub mod window;

pub use config::Config;
pub use engine::CorrelationEngine;
pub use error::EngineError;
pub use heuristic::KeywordClassifier;
pub use history::IncidentHistory;
pub use provider::{EmbedInput, EmbeddingProvider, FallbackClassifier, HashingEmbedder};
pub use triage::PriorityCascade;
pub use types::{
  ImageDedupResponse, InboundImageRequest, InboundTextReport, PriorityRequest, PriorityResponse,
  TextDedupResponse,
};
