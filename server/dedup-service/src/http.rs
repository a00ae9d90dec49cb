//! HTTP-backed embedding provider and fallback classifier.
//!
//! One request per call, bounded by the client timeout. Failures surface immediately
//! as provider errors; nothing is retried.

use std::time::Duration;

use async_trait::async_trait;
use correlation_engine::types::{Classification, Embedding, Priority, PriorityInput};
use correlation_engine::{EmbedInput, EmbeddingProvider, EngineError, FallbackClassifier};
use serde::{Deserialize, Serialize};

fn client(timeout: Duration) -> Result<reqwest::Client, reqwest::Error> {
  reqwest::Client::builder()
    .timeout(timeout)
    .user_agent(concat!("dedup-service/", env!("CARGO_PKG_VERSION")))
    .build()
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
  input: &'a str,
  kind: &'static str,
}

#[derive(Deserialize)]
struct EmbedResponse {
  embedding: Vec<f32>,
}

/// POSTs `{input, kind}` and expects `{embedding: [..]}` back.
pub struct HttpEmbedder {
  client: reqwest::Client,
  url: String,
}

impl HttpEmbedder {
  pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
    Ok(Self {
      client: client(timeout)?,
      url: url.into(),
    })
  }
}

#[async_trait]
impl EmbeddingProvider for HttpEmbedder {
  async fn embed(&self, input: &EmbedInput) -> Result<Embedding, EngineError> {
    let body = EmbedRequest {
      input: input.value(),
      kind: input.kind(),
    };
    let resp = self
      .client
      .post(&self.url)
      .json(&body)
      .send()
      .await
      .and_then(|r| r.error_for_status())
      .map_err(|e| EngineError::provider(format!("embedding request failed: {}", e)))?;
    let parsed: EmbedResponse = resp
      .json()
      .await
      .map_err(|e| EngineError::provider(format!("embedding response: {}", e)))?;
    Embedding::new(parsed.embedding)
  }
}

#[derive(Deserialize)]
struct ClassifyResponse {
  priority: String,
  confidence: f64,
  reason: String,
}

/// POSTs the normalized priority fields and expects `{priority, confidence, reason}`.
pub struct HttpClassifier {
  client: reqwest::Client,
  url: String,
}

impl HttpClassifier {
  pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
    Ok(Self {
      client: client(timeout)?,
      url: url.into(),
    })
  }
}

#[async_trait]
impl FallbackClassifier for HttpClassifier {
  async fn classify(&self, input: &PriorityInput) -> Result<Classification, EngineError> {
    let resp = self
      .client
      .post(&self.url)
      .json(input)
      .send()
      .await
      .and_then(|r| r.error_for_status())
      .map_err(|e| EngineError::provider(format!("classifier request failed: {}", e)))?;
    let parsed: ClassifyResponse = resp
      .json()
      .await
      .map_err(|e| EngineError::provider(format!("classifier response: {}", e)))?;

    let priority = Priority::from_label(&parsed.priority).ok_or_else(|| {
      EngineError::provider(format!("classifier returned unknown priority {:?}", parsed.priority))
    })?;
    Ok(Classification {
      priority,
      confidence: parsed.confidence,
      reason: parsed.reason,
    })
  }
}
