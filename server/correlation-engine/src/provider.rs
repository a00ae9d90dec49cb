//! External collaborators: embedding providers and fallback priority classifiers.
//!
//! The engine only sees these traits. Network-backed implementations live in the
//! service crate; `HashingEmbedder` is a deterministic offline text embedder.

use async_trait::async_trait;

use crate::error::EngineError;
use crate::types::{Classification, Embedding, PriorityInput};

/// What gets embedded: an opaque image reference or cleaned report text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmbedInput {
  Image(String),
  Text(String),
}

impl EmbedInput {
  pub fn kind(&self) -> &'static str {
    match self {
      Self::Image(_) => "image",
      Self::Text(_) => "text",
    }
  }

  pub fn value(&self) -> &str {
    match self {
      Self::Image(s) | Self::Text(s) => s,
    }
  }
}

/// Turns an input into a fixed-length embedding. May block on I/O.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
  async fn embed(&self, input: &EmbedInput) -> Result<Embedding, EngineError>;
}

/// Open-ended priority classifier consulted when no hard rule fires.
#[async_trait]
pub trait FallbackClassifier: Send + Sync {
  async fn classify(&self, input: &PriorityInput) -> Result<Classification, EngineError>;
}

/// Signed feature hashing of unigrams and bigrams (blake3) into a fixed dimension.
///
/// Identical cleaned text maps to identical vectors; shared vocabulary raises cosine.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
  dim: usize,
}

impl HashingEmbedder {
  pub const DEFAULT_DIM: usize = 256;

  pub fn new(dim: usize) -> Self {
    Self { dim: dim.max(1) }
  }

  fn bucket(&self, feature: &str) -> (usize, f32) {
    let hash = blake3::hash(feature.as_bytes());
    let bytes = hash.as_bytes();
    let mut idx = [0u8; 8];
    idx.copy_from_slice(&bytes[..8]);
    let index = (u64::from_le_bytes(idx) % self.dim as u64) as usize;
    let sign = if bytes[8] & 1 == 0 { 1.0 } else { -1.0 };
    (index, sign)
  }

  /// Punctuation is stripped from words; text made only of symbols (`"!!!"`, emoji)
  /// is hashed as-is so it still embeds. Only blank text is rejected.
  pub fn embed_text(&self, text: &str) -> Result<Embedding, EngineError> {
    let mut tokens: Vec<String> = text
      .split_whitespace()
      .map(|t| {
        t.chars()
          .filter(|c| c.is_alphanumeric())
          .flat_map(char::to_lowercase)
          .collect::<String>()
      })
      .filter(|t| !t.is_empty())
      .collect();
    if tokens.is_empty() {
      tokens = text.split_whitespace().map(str::to_lowercase).collect();
    }
    if tokens.is_empty() {
      return Err(EngineError::provider("text has no embeddable tokens"));
    }

    let mut values = vec![0.0f32; self.dim];
    for token in &tokens {
      let (i, sign) = self.bucket(token);
      values[i] += sign;
    }
    for pair in tokens.windows(2) {
      let (i, sign) = self.bucket(&format!("{} {}", pair[0], pair[1]));
      values[i] += 0.5 * sign;
    }

    let norm = values.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
      values.iter_mut().for_each(|v| *v /= norm);
    }
    Embedding::new(values)
  }
}

impl Default for HashingEmbedder {
  fn default() -> Self {
    Self::new(Self::DEFAULT_DIM)
  }
}

#[async_trait]
impl EmbeddingProvider for HashingEmbedder {
  async fn embed(&self, input: &EmbedInput) -> Result<Embedding, EngineError> {
    match input {
      EmbedInput::Text(text) => self.embed_text(text),
      EmbedInput::Image(_) => Err(EngineError::provider(
        "hashing embedder cannot embed images",
      )),
    }
  }
}
