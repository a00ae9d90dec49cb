//! Engine configuration with sane defaults.

use chrono::Duration;

use crate::fusion::FusionWeights;

/// Tunable thresholds for correlation and triage.
#[derive(Debug, Clone)]
pub struct Config {
  /// Fused score at or above which a candidate image is the same incident.
  pub decision_threshold: f64,
  /// Embedding similarity a text report must exceed to count as a duplicate.
  pub text_duplicate_threshold: f64,
  /// How far back (hours) a history entry may lie to be compared.
  pub window_hours: i64,
  /// Max great-circle distance (km) for coordinate-based window membership.
  pub window_radius_km: f64,
  /// Weights used to fuse image/text, location and time similarity.
  pub fusion_weights: FusionWeights,
  /// Life-safety hard rule fires only below this many minutes since report.
  pub hard_rule_recency_minutes: i64,
  /// Report count at which the mass-report hard rule fires.
  pub mass_report_threshold: u32,
}

impl Config {
  pub fn window(&self) -> Duration {
    Duration::hours(self.window_hours)
  }
}

impl Default for Config {
  fn default() -> Self {
    Self {
      decision_threshold: 0.75,
      text_duplicate_threshold: 0.95,
      window_hours: 3,
      window_radius_km: 2.0,
      fusion_weights: FusionWeights::default(),
      hard_rule_recency_minutes: 30,
      mass_report_threshold: 10,
    }
  }
}
