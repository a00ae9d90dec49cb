//! Service configuration from environment variables.

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("{var}: invalid value {value:?}")]
  Invalid { var: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
  pub bind_addr: IpAddr,
  pub port: u16,
  /// Image embedding backend; image dedup is unavailable without it.
  pub image_embedding_url: Option<String>,
  /// Text embedding backend; the offline hashing embedder is used without it.
  pub text_embedding_url: Option<String>,
  /// Fallback priority classifier; the keyword classifier is used without it.
  pub classifier_url: Option<String>,
  pub provider_timeout: Duration,
  pub log_json: bool,
}

impl Default for ServiceConfig {
  fn default() -> Self {
    Self {
      bind_addr: IpAddr::V4(Ipv4Addr::LOCALHOST),
      port: 5005,
      image_embedding_url: None,
      text_embedding_url: None,
      classifier_url: None,
      provider_timeout: Duration::from_secs(10),
      log_json: false,
    }
  }
}

impl ServiceConfig {
  pub fn from_env() -> Result<Self, ConfigError> {
    Self::from_lookup(|var| std::env::var(var).ok())
  }

  /// Build from any variable lookup; unset or blank variables keep their defaults.
  pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
    let get = |var: &str| lookup(var).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
    let mut config = Self::default();

    if let Some(v) = get("BIND_ADDR") {
      config.bind_addr = v.parse().map_err(|_| ConfigError::Invalid {
        var: "BIND_ADDR",
        value: v.clone(),
      })?;
    }
    if let Some(v) = get("PORT") {
      config.port = v.parse().map_err(|_| ConfigError::Invalid {
        var: "PORT",
        value: v.clone(),
      })?;
    }
    if let Some(v) = get("PROVIDER_TIMEOUT_SECS") {
      let secs: u64 = v.parse().map_err(|_| ConfigError::Invalid {
        var: "PROVIDER_TIMEOUT_SECS",
        value: v.clone(),
      })?;
      config.provider_timeout = Duration::from_secs(secs);
    }
    config.image_embedding_url = get("IMAGE_EMBEDDING_URL");
    config.text_embedding_url = get("TEXT_EMBEDDING_URL");
    config.classifier_url = get("CLASSIFIER_URL");
    config.log_json = matches!(get("LOG_JSON").as_deref(), Some("1" | "true" | "yes"));

    Ok(config)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashMap;

  fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
      .iter()
      .map(|(k, v)| (k.to_string(), v.to_string()))
      .collect();
    move |var| map.get(var).cloned()
  }

  #[test]
  fn defaults_when_unset() {
    let config = ServiceConfig::from_lookup(lookup(&[])).unwrap();
    assert_eq!(config.port, 5005);
    assert!(config.bind_addr.is_loopback());
    assert!(config.image_embedding_url.is_none());
    assert!(!config.log_json);
  }

  #[test]
  fn reads_overrides() {
    let config = ServiceConfig::from_lookup(lookup(&[
      ("PORT", "8080"),
      ("BIND_ADDR", "0.0.0.0"),
      ("CLASSIFIER_URL", "http://llm:9000/classify"),
      ("PROVIDER_TIMEOUT_SECS", "3"),
      ("LOG_JSON", "1"),
    ]))
    .unwrap();
    assert_eq!(config.port, 8080);
    assert_eq!(config.classifier_url.as_deref(), Some("http://llm:9000/classify"));
    assert_eq!(config.provider_timeout, Duration::from_secs(3));
    assert!(config.log_json);
  }

  #[test]
  fn invalid_port_is_an_error() {
    let err = ServiceConfig::from_lookup(lookup(&[("PORT", "http")])).unwrap_err();
    assert!(err.to_string().contains("PORT"));
  }
}
