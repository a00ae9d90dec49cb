//! Candidate window: reduce history to the records a new report may be compared against.
//!
//! A record passes when it is inside the time window AND its location is comparable
//! with, and close to, the new report's location. History order is preserved.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::config::Config;
use crate::error::EngineError;
use crate::similarity::haversine_km;
use crate::types::{IncidentRecord, Location};

/// Upper-bound-only time gate: `new - old <= window`.
///
/// A record newer than the new report yields a negative difference and passes;
/// history is append-only in arrival order so that does not arise in practice.
pub fn within_time_window(old: &DateTime<Utc>, new: &DateTime<Utc>, window: Duration) -> bool {
  *new - *old <= window
}

/// Location gate. Mixed modes (point vs area) are not comparable.
pub fn location_gate(new: &Location, old: &Location, radius_km: f64) -> Result<bool, EngineError> {
  match (new, old) {
    (Location::Point(a), Location::Point(b)) => Ok(haversine_km(a, b) <= radius_km),
    (Location::Area(a), Location::Area(b)) => Ok(a == b),
    _ => Err(EngineError::IncomparableLocation),
  }
}

/// Records from `history` eligible for comparison against `report`.
pub fn candidate_window(
  report: &IncidentRecord,
  history: &[Arc<IncidentRecord>],
  config: &Config,
) -> Vec<Arc<IncidentRecord>> {
  let window = config.window();
  history
    .iter()
    .filter(|record| {
      if !within_time_window(&record.timestamp, &report.timestamp, window) {
        return false;
      }
      match location_gate(&report.location, &record.location, config.window_radius_km) {
        Ok(pass) => pass,
        Err(e) => {
          debug!(error = %e, "excluding history record from candidate window");
          false
        }
      }
    })
    .cloned()
    .collect()
}
