//! Offline keyword fallback classifier; no model, no network.
//!
//! Score 0–100 from incident type, severe keywords in the description, report volume,
//! attached evidence and recency. HIGH >= 70, MEDIUM >= 40, else LOW.

use async_trait::async_trait;

use crate::error::EngineError;
use crate::provider::FallbackClassifier;
use crate::types::{Classification, Priority, PriorityInput};

const HIGH_CUTOFF: i32 = 70;
const MEDIUM_CUTOFF: i32 = 40;

/// Words in a description that indicate risk to life or ongoing harm.
const SEVERE_KEYWORDS: &[&str] = &[
  "unconscious",
  "bleeding",
  "trapped",
  "weapon",
  "gun",
  "knife",
  "explosion",
  "collapse",
  "robbery",
  "assault",
  "smoke",
  "flames",
  "drowning",
];

fn type_base(incident_type: &str) -> i32 {
  match incident_type.to_ascii_lowercase().as_str() {
    "medical emergency" | "fire" => 60,
    "crime" | "road accident" | "accident" | "flood" => 40,
    _ => 20,
  }
}

#[derive(Debug, Clone, Default)]
pub struct KeywordClassifier;

impl KeywordClassifier {
  pub fn new() -> Self {
    Self
  }

  /// Deterministic scoring with the signals that contributed.
  pub fn score(&self, input: &PriorityInput) -> (i32, Vec<String>) {
    let mut signals = Vec::new();
    let mut score = type_base(&input.incident_type);
    signals.push(format!("type '{}' base {}", input.incident_type, score));

    let description = input.description.to_lowercase();
    let severe: Vec<&str> = SEVERE_KEYWORDS
      .iter()
      .copied()
      .filter(|k| description.contains(k))
      .collect();
    if !severe.is_empty() {
      score += 25;
      signals.push(format!("severe keywords: {}", severe.join(", ")));
    }

    let extra_reports = input.report_count.saturating_sub(1).min(4) as i32;
    if extra_reports > 0 {
      score += extra_reports * 5;
      signals.push(format!("{} reports", input.report_count));
    }

    if input.image_attached {
      score += 5;
      signals.push("image attached".into());
    }

    match input.time_since_report_minutes {
      m if m <= 15 => {
        score += 10;
        signals.push("reported within 15 min".into());
      }
      m if m <= 60 => score += 5,
      m if m > 180 => {
        score -= 10;
        signals.push("stale report".into());
      }
      _ => {}
    }

    (score.clamp(0, 100), signals)
  }
}

/// Confidence grows with distance from the nearest band edge.
fn confidence(score: i32) -> f64 {
  let margin = [HIGH_CUTOFF, MEDIUM_CUTOFF]
    .iter()
    .map(|edge| (score - edge).abs())
    .min()
    .unwrap_or(0) as f64;
  let c = 0.6 + 0.35 * (margin / 30.0).min(1.0);
  (c * 100.0).round() / 100.0
}

#[async_trait]
impl FallbackClassifier for KeywordClassifier {
  async fn classify(&self, input: &PriorityInput) -> Result<Classification, EngineError> {
    let (score, signals) = self.score(input);
    let priority = if score >= HIGH_CUTOFF {
      Priority::High
    } else if score >= MEDIUM_CUTOFF {
      Priority::Medium
    } else {
      Priority::Low
    };

    Ok(Classification {
      priority,
      confidence: confidence(score),
      reason: format!("score {}: {}", score, signals.join("; ")),
    })
  }
}
