//! Shared application state: engines and the priority cascade.

use std::sync::Arc;

use correlation_engine::{
  Config, CorrelationEngine, EmbeddingProvider, FallbackClassifier, HashingEmbedder,
  KeywordClassifier, PriorityCascade,
};
use tracing::info;

use crate::config::ServiceConfig;
use crate::http::{HttpClassifier, HttpEmbedder};

pub struct AppState {
  /// `None` when no image embedding backend is configured.
  pub images: Option<CorrelationEngine>,
  pub texts: CorrelationEngine,
  pub priority: PriorityCascade,
}

impl AppState {
  pub fn new(
    engine_config: Config,
    image_embedder: Option<Arc<dyn EmbeddingProvider>>,
    text_embedder: Arc<dyn EmbeddingProvider>,
    fallback: Arc<dyn FallbackClassifier>,
  ) -> Self {
    Self {
      images: image_embedder.map(|e| CorrelationEngine::new(engine_config.clone(), e)),
      texts: CorrelationEngine::new(engine_config.clone(), text_embedder),
      priority: PriorityCascade::new(engine_config, fallback),
    }
  }

  /// Offline state: hashing text embedder, keyword classifier, no image backend.
  pub fn offline() -> Self {
    Self::new(
      Config::default(),
      None,
      Arc::new(HashingEmbedder::default()),
      Arc::new(KeywordClassifier::new()),
    )
  }

  /// Wire backends from configuration.
  pub fn from_config(config: &ServiceConfig) -> Result<Self, reqwest::Error> {
    let image_embedder: Option<Arc<dyn EmbeddingProvider>> = match &config.image_embedding_url {
      Some(url) => {
        info!(%url, "image embeddings via HTTP");
        let embedder: Arc<dyn EmbeddingProvider> =
          Arc::new(HttpEmbedder::new(url.clone(), config.provider_timeout)?);
        Some(embedder)
      }
      None => {
        info!("no IMAGE_EMBEDDING_URL; image dedup disabled");
        None
      }
    };

    let text_embedder: Arc<dyn EmbeddingProvider> = match &config.text_embedding_url {
      Some(url) => {
        info!(%url, "text embeddings via HTTP");
        Arc::new(HttpEmbedder::new(url.clone(), config.provider_timeout)?)
      }
      None => {
        info!("text embeddings via offline hashing embedder");
        Arc::new(HashingEmbedder::default())
      }
    };

    let fallback: Arc<dyn FallbackClassifier> = match &config.classifier_url {
      Some(url) => {
        info!(%url, "fallback priority classifier via HTTP");
        Arc::new(HttpClassifier::new(url.clone(), config.provider_timeout)?)
      }
      None => {
        info!("fallback priority classifier: offline keyword rules");
        Arc::new(KeywordClassifier::new())
      }
    };

    Ok(Self::new(Config::default(), image_embedder, text_embedder, fallback))
  }
}
