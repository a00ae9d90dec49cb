//! Similarity primitives: embedding cosine, graded geo proximity, graded time proximity.
//!
//! All functions are pure. Distances use the haversine formula on a mean Earth radius.

use chrono::{DateTime, Utc};

use crate::error::EngineError;
use crate::types::{Embedding, GeoPoint};

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;
/// Mean Earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6_371.0;

/// Cosine similarity of two embeddings.
///
/// Returns the raw cosine in [-1, 1]; callers that need a [0, 1] signal clamp it
/// (see `SimilarityTriple::new`).
pub fn embedding_similarity(a: &Embedding, b: &Embedding) -> Result<f64, EngineError> {
  if a.dim() != b.dim() {
    return Err(EngineError::DimensionMismatch {
      left: a.dim(),
      right: b.dim(),
    });
  }

  let mut dot = 0.0f64;
  let mut norm_a = 0.0f64;
  let mut norm_b = 0.0f64;
  for (x, y) in a.as_slice().iter().zip(b.as_slice()) {
    let (x, y) = (*x as f64, *y as f64);
    dot += x * y;
    norm_a += x * x;
    norm_b += y * y;
  }

  if norm_a == 0.0 || norm_b == 0.0 {
    return Err(EngineError::DegenerateVector);
  }
  Ok((dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0))
}

/// Central angle (radians) between two points.
fn central_angle(p1: &GeoPoint, p2: &GeoPoint) -> f64 {
  let phi1 = p1.lat.to_radians();
  let phi2 = p2.lat.to_radians();
  let d_phi = (p2.lat - p1.lat).to_radians();
  let d_lambda = (p2.lon - p1.lon).to_radians();

  let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
  2.0 * a.sqrt().atan2((1.0 - a).max(0.0).sqrt())
}

/// Great-circle distance in meters.
pub fn haversine_m(p1: &GeoPoint, p2: &GeoPoint) -> f64 {
  EARTH_RADIUS_M * central_angle(p1, p2)
}

/// Great-circle distance in kilometers. Used by the candidate window gate only.
pub fn haversine_km(p1: &GeoPoint, p2: &GeoPoint) -> f64 {
  EARTH_RADIUS_KM * central_angle(p1, p2)
}

/// Graded location similarity: <=50m 1.0, <=150m 0.7, <=300m 0.4, else 0.0.
pub fn geo_similarity(p1: &GeoPoint, p2: &GeoPoint) -> f64 {
  let distance = haversine_m(p1, p2);
  if distance <= 50.0 {
    1.0
  } else if distance <= 150.0 {
    0.7
  } else if distance <= 300.0 {
    0.4
  } else {
    0.0
  }
}

/// Graded time similarity on absolute elapsed minutes: <=5 1.0, <=15 0.6, <=30 0.3, else 0.0.
pub fn time_similarity(t1: &DateTime<Utc>, t2: &DateTime<Utc>) -> f64 {
  let diff_minutes = (*t1 - *t2).num_milliseconds().abs() as f64 / 60_000.0;
  if diff_minutes <= 5.0 {
    1.0
  } else if diff_minutes <= 15.0 {
    0.6
  } else if diff_minutes <= 30.0 {
    0.3
  } else {
    0.0
  }
}
