//! Priority tiering: an ordered hard-rule table, then the fallback classifier.
//!
//! Rules are evaluated top to bottom; the first match wins and is labelled `HARD_RULE`.
//! With no match the normalized request goes to the fallback classifier and its answer
//! is relabelled `FALLBACK` with confidence and reason passed through unchanged.

use std::sync::Arc;

use tracing::{debug, info};

use crate::config::Config;
use crate::error::EngineError;
use crate::normalize;
use crate::provider::FallbackClassifier;
use crate::types::*;

/// Incident types treated as immediately life-threatening.
pub const LIFE_SAFETY_TYPES: &[&str] = &["medical emergency", "fire"];

/// One deterministic rule: predicate plus the answer it forces.
pub struct HardRule {
  pub name: &'static str,
  pub priority: Priority,
  pub confidence: f64,
  matches: fn(&PriorityInput, &Config) -> bool,
  reason: fn(&PriorityInput, &Config) -> String,
}

impl HardRule {
  pub fn matches(&self, input: &PriorityInput, config: &Config) -> bool {
    (self.matches)(input, config)
  }

  pub fn reason(&self, input: &PriorityInput, config: &Config) -> String {
    (self.reason)(input, config)
  }
}

fn is_life_safety_recent(input: &PriorityInput, config: &Config) -> bool {
  let kind = input.incident_type.to_ascii_lowercase();
  LIFE_SAFETY_TYPES.contains(&kind.as_str())
    && input.time_since_report_minutes < config.hard_rule_recency_minutes
}

fn life_safety_reason(input: &PriorityInput, config: &Config) -> String {
  format!(
    "{} reported {} min ago (under {} min)",
    input.incident_type, input.time_since_report_minutes, config.hard_rule_recency_minutes
  )
}

fn is_mass_reported(input: &PriorityInput, config: &Config) -> bool {
  input.report_count >= config.mass_report_threshold
}

fn mass_reports_reason(input: &PriorityInput, _config: &Config) -> String {
  format!("{} independent reports of the same incident", input.report_count)
}

/// Hard rules in evaluation order.
pub const HARD_RULES: &[HardRule] = &[
  // 1. Life-threatening incident types while still fresh.
  HardRule {
    name: "life_safety",
    priority: Priority::High,
    confidence: 0.99,
    matches: is_life_safety_recent,
    reason: life_safety_reason,
  },
  // 2. Many people reporting the same thing.
  HardRule {
    name: "mass_reports",
    priority: Priority::High,
    confidence: 0.95,
    matches: is_mass_reported,
    reason: mass_reports_reason,
  },
];

/// First hard rule that fires, as a finished response.
pub fn evaluate_hard_rules(input: &PriorityInput, config: &Config) -> Option<PriorityResponse> {
  HARD_RULES.iter().find(|rule| rule.matches(input, config)).map(|rule| {
    debug!(rule = rule.name, incident_id = %input.incident_id, "hard rule fired");
    PriorityResponse {
      incident_id: input.incident_id.clone(),
      priority: rule.priority,
      confidence: rule.confidence,
      reason: rule.reason(input, config),
      method: Method::HardRule,
    }
  })
}

/// Hard rules backed by an injected fallback classifier.
pub struct PriorityCascade {
  config: Config,
  fallback: Arc<dyn FallbackClassifier>,
}

impl PriorityCascade {
  pub fn new(config: Config, fallback: Arc<dyn FallbackClassifier>) -> Self {
    Self { config, fallback }
  }

  pub fn with_defaults(fallback: Arc<dyn FallbackClassifier>) -> Self {
    Self::new(Config::default(), fallback)
  }

  pub async fn classify(&self, raw: &PriorityRequest) -> Result<PriorityResponse, EngineError> {
    let input = normalize::normalize_priority_request(raw)?;
    self.classify_normalized(&input).await
  }

  pub async fn classify_normalized(&self, input: &PriorityInput) -> Result<PriorityResponse, EngineError> {
    if let Some(response) = evaluate_hard_rules(input, &self.config) {
      info!(incident_id = %input.incident_id, priority = ?response.priority, "priority by hard rule");
      return Ok(response);
    }

    let answer = self.fallback.classify(input).await?;
    info!(incident_id = %input.incident_id, priority = ?answer.priority, "priority by fallback");
    Ok(PriorityResponse {
      incident_id: input.incident_id.clone(),
      priority: answer.priority,
      confidence: answer.confidence,
      reason: answer.reason,
      method: Method::Fallback,
    })
  }
}
