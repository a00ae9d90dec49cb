//! Score fusion: weighted combination of content, location and time similarity.

use crate::types::{Decision, SimilarityTriple};

/// Weight of image/text embedding similarity.
pub const CONTENT_WEIGHT: f64 = 0.7;
/// Weight of location similarity.
pub const LOCATION_WEIGHT: f64 = 0.2;
/// Weight of time similarity.
pub const TIME_WEIGHT: f64 = 0.1;

/// Fusion weights. The defaults are the named constants above and sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusionWeights {
  pub content: f64,
  pub location: f64,
  pub time: f64,
}

impl Default for FusionWeights {
  fn default() -> Self {
    Self {
      content: CONTENT_WEIGHT,
      location: LOCATION_WEIGHT,
      time: TIME_WEIGHT,
    }
  }
}

/// Round to 3 decimal places.
pub fn round3(x: f64) -> f64 {
  (x * 1000.0).round() / 1000.0
}

/// Fuse three similarities with the default weights.
pub fn fuse(content: f64, location: f64, time: f64) -> f64 {
  fuse_weighted(&FusionWeights::default(), content, location, time)
}

pub fn fuse_weighted(weights: &FusionWeights, content: f64, location: f64, time: f64) -> f64 {
  round3(weights.content * content + weights.location * location + weights.time * time)
}

pub fn fuse_triple(weights: &FusionWeights, triple: &SimilarityTriple) -> f64 {
  fuse_weighted(weights, triple.content, triple.location, triple.time)
}

/// Inclusive threshold: `score >= threshold` is the same incident.
pub fn decide(score: f64, threshold: f64) -> Decision {
  if score >= threshold {
    Decision::SameIncident
  } else {
    Decision::NewIncident
  }
}
