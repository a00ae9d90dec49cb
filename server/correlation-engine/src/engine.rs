//! Correlation decision engine: batch image scoring and single-verdict text dedup.

use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::EngineError;
use crate::fusion;
use crate::history::IncidentHistory;
use crate::normalize;
use crate::provider::{EmbedInput, EmbeddingProvider};
use crate::similarity;
use crate::types::*;
use crate::window;

/// Score one candidate against the new image once both embeddings are known.
pub fn score_image_pair(
  config: &Config,
  new_image: &ImageReport,
  new_embedding: &Embedding,
  candidate: &CandidateImage,
  candidate_embedding: &Embedding,
) -> Result<CandidateOutcome, EngineError> {
  let content = similarity::embedding_similarity(new_embedding, candidate_embedding)?;
  let triple = SimilarityTriple::new(
    content,
    similarity::geo_similarity(&new_image.location, &candidate.location),
    similarity::time_similarity(&new_image.timestamp, &candidate.timestamp),
  );
  let score = fusion::fuse_triple(&config.fusion_weights, &triple);
  Ok(CandidateOutcome::Scored {
    triple,
    score,
    decision: fusion::decide(score, config.decision_threshold),
  })
}

/// The correlation engine. Owns the text-report history for its deployment.
pub struct CorrelationEngine {
  config: Config,
  embedder: Arc<dyn EmbeddingProvider>,
  history: IncidentHistory,
}

impl CorrelationEngine {
  pub fn new(config: Config, embedder: Arc<dyn EmbeddingProvider>) -> Self {
    Self {
      config,
      embedder,
      history: IncidentHistory::new(),
    }
  }

  pub fn with_defaults(embedder: Arc<dyn EmbeddingProvider>) -> Self {
    Self::new(Config::default(), embedder)
  }

  pub fn config(&self) -> &Config {
    &self.config
  }

  pub fn history(&self) -> &IncidentHistory {
    &self.history
  }

  // -------------------------------------------------------------------------
  // Batch multi-candidate mode (images)
  // -------------------------------------------------------------------------

  /// Validate and score an image dedup request.
  pub async fn deduplicate_images(
    &self,
    raw: &InboundImageRequest,
  ) -> Result<ImageDedupResponse, EngineError> {
    let batch = normalize::normalize_image_request(raw)?;
    self.score_batch(&batch).await
  }

  /// Score every candidate independently. Only the new image's own embedding can fail
  /// the whole batch; candidate faults become `candidate_processing_error` entries.
  pub async fn score_batch(&self, batch: &ImageBatch) -> Result<ImageDedupResponse, EngineError> {
    let new_embedding = self
      .embedder
      .embed(&EmbedInput::Image(batch.new_image.image_ref.clone()))
      .await?;

    let outcomes = join_all(
      batch
        .candidates
        .iter()
        .map(|c| self.score_candidate(&batch.new_image, &new_embedding, c)),
    )
    .await;

    let image_matches = batch
      .candidates
      .iter()
      .zip(outcomes)
      .map(|(candidate, outcome)| {
        if let CandidateOutcome::Failed(e) = &outcome {
          let stage = if e.is_candidate_fault() { "scoring" } else { "embedding" };
          warn!(image_id = %candidate.image_id, stage, error = %e, "candidate processing failed");
        }
        ImageMatch {
          image_id: candidate.image_id.clone(),
          incident_id: candidate.incident_id.clone(),
          similarity_score: outcome.score(),
          decision: outcome.decision(),
        }
      })
      .collect();

    Ok(ImageDedupResponse { image_matches })
  }

  async fn score_candidate(
    &self,
    new_image: &ImageReport,
    new_embedding: &Embedding,
    candidate: &CandidateImage,
  ) -> CandidateOutcome {
    let candidate_embedding = match self
      .embedder
      .embed(&EmbedInput::Image(candidate.image_ref.clone()))
      .await
    {
      Ok(e) => e,
      Err(e) => return CandidateOutcome::Failed(e),
    };

    match score_image_pair(
      &self.config,
      new_image,
      new_embedding,
      candidate,
      &candidate_embedding,
    ) {
      Ok(outcome) => {
        debug!(
          image_id = %candidate.image_id,
          score = outcome.score(),
          "candidate scored"
        );
        outcome
      }
      Err(e) => CandidateOutcome::Failed(e),
    }
  }

  // -------------------------------------------------------------------------
  // Single-verdict mode (text)
  // -------------------------------------------------------------------------

  /// Validate a text report, decide whether it duplicates a recent one, then record it.
  ///
  /// Validation failures return before any provider call.
  pub async fn check_text_report(
    &self,
    raw: &InboundTextReport,
  ) -> Result<TextDedupResponse, EngineError> {
    let record = normalize::normalize_text_report(raw)?;
    self.check_record(record).await
  }

  /// Window, score and append an already validated record.
  pub async fn check_record(&self, record: IncidentRecord) -> Result<TextDedupResponse, EngineError> {
    let snapshot = self.history.snapshot();
    let candidates = window::candidate_window(&record, &snapshot, &self.config);

    let new_embedding = self
      .embedder
      .embed(&EmbedInput::Text(record.text.clone()))
      .await?;

    let scores = join_all(
      candidates
        .iter()
        .map(|candidate| self.text_similarity(&new_embedding, candidate)),
    )
    .await;

    let best = scores.into_iter().flatten().fold(None, |best: Option<f64>, s| {
      Some(best.map_or(s, |b| b.max(s)))
    });
    let duplicate = best.is_some_and(|s| s > self.config.text_duplicate_threshold);

    info!(
      history = snapshot.len(),
      window = candidates.len(),
      best_similarity = best.unwrap_or(0.0),
      duplicate,
      "text report checked"
    );

    self.history.append(record);
    Ok(TextDedupResponse { duplicate })
  }

  /// Similarity to one windowed record; `None` if it could not be scored.
  async fn text_similarity(&self, new_embedding: &Embedding, record: &IncidentRecord) -> Option<f64> {
    let result = match self.embedder.embed(&EmbedInput::Text(record.text.clone())).await {
      Ok(embedding) => similarity::embedding_similarity(new_embedding, &embedding),
      Err(e) => Err(e),
    };
    match result {
      Ok(s) => Some(s),
      Err(e) => {
        warn!(error = %e, "skipping history record that could not be scored");
        None
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::provider::HashingEmbedder;
  use async_trait::async_trait;
  use chrono::{DateTime, Duration, TimeZone, Utc};
  use std::collections::HashMap;
  use std::sync::atomic::{AtomicUsize, Ordering};

  /// Serves fixed vectors per input; unknown inputs fail like an unreachable image.
  struct FixedEmbedder(HashMap<String, Vec<f32>>);

  impl FixedEmbedder {
    fn new(entries: &[(&str, Vec<f32>)]) -> Arc<Self> {
      Arc::new(Self(
        entries
          .iter()
          .map(|(k, v)| (k.to_string(), v.clone()))
          .collect(),
      ))
    }
  }

  #[async_trait]
  impl EmbeddingProvider for FixedEmbedder {
    async fn embed(&self, input: &EmbedInput) -> Result<Embedding, EngineError> {
      match self.0.get(input.value()) {
        Some(v) => Embedding::new(v.clone()),
        None => Err(EngineError::provider(format!("cannot resolve {}", input.value()))),
      }
    }
  }

  fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 12, 28, 18, 40, 0).unwrap()
  }

  fn new_image() -> ImageReport {
    ImageReport {
      image_ref: "new.jpg".into(),
      location: GeoPoint::new(12.9716, 77.5946),
      timestamp: t0(),
    }
  }

  fn candidate(id: &str, image_ref: &str, minutes: i64) -> CandidateImage {
    CandidateImage {
      image_ref: image_ref.into(),
      incident_id: format!("inc-{}", id),
      image_id: id.into(),
      location: GeoPoint::new(12.9716, 77.5946),
      timestamp: t0() + Duration::minutes(minutes),
    }
  }

  /// Unit vector whose cosine with [1, 0] is `cos`.
  fn at_cosine(cos: f32) -> Vec<f32> {
    vec![cos, (1.0 - cos * cos).sqrt()]
  }

  #[tokio::test]
  async fn near_identical_candidate_is_same_incident() {
    let embedder = FixedEmbedder::new(&[("new.jpg", vec![1.0, 0.0]), ("c1.jpg", at_cosine(0.98))]);
    let engine = CorrelationEngine::with_defaults(embedder);
    let batch = ImageBatch {
      new_image: new_image(),
      candidates: vec![candidate("c1", "c1.jpg", 2)],
    };

    let resp = engine.score_batch(&batch).await.unwrap();
    assert_eq!(resp.image_matches.len(), 1);
    assert_eq!(resp.image_matches[0].similarity_score, 0.986);
    assert_eq!(resp.image_matches[0].decision, Decision::SameIncident);
  }

  #[tokio::test]
  async fn bad_candidate_is_isolated_and_order_kept() {
    let embedder = FixedEmbedder::new(&[
      ("new.jpg", vec![1.0, 0.0]),
      ("c1.jpg", vec![1.0, 0.0]),
      ("c3.jpg", vec![0.0, 1.0]),
    ]);
    let engine = CorrelationEngine::with_defaults(embedder);
    let batch = ImageBatch {
      new_image: new_image(),
      candidates: vec![
        candidate("c1", "c1.jpg", 1),
        candidate("c2", "missing.jpg", 1),
        candidate("c3", "c3.jpg", 1),
      ],
    };

    let resp = engine.score_batch(&batch).await.unwrap();
    let ids: Vec<&str> = resp.image_matches.iter().map(|m| m.image_id.as_str()).collect();
    assert_eq!(ids, vec!["c1", "c2", "c3"]);

    assert_eq!(resp.image_matches[0].decision, Decision::SameIncident);
    assert_eq!(resp.image_matches[1].decision, Decision::CandidateProcessingError);
    assert_eq!(resp.image_matches[1].similarity_score, 0.0);
    // Orthogonal image, same place and time: 0.2 + 0.1.
    assert_eq!(resp.image_matches[2].similarity_score, 0.3);
    assert_eq!(resp.image_matches[2].decision, Decision::NewIncident);
  }

  #[tokio::test]
  async fn degenerate_and_mismatched_embeddings_are_candidate_errors() {
    let embedder = FixedEmbedder::new(&[
      ("new.jpg", vec![1.0, 0.0]),
      ("zero.jpg", vec![0.0, 0.0]),
      ("wide.jpg", vec![1.0, 0.0, 0.0]),
    ]);
    let engine = CorrelationEngine::with_defaults(embedder);
    let batch = ImageBatch {
      new_image: new_image(),
      candidates: vec![candidate("z", "zero.jpg", 0), candidate("w", "wide.jpg", 0)],
    };

    let resp = engine.score_batch(&batch).await.unwrap();
    assert!(resp
      .image_matches
      .iter()
      .all(|m| m.decision == Decision::CandidateProcessingError && m.similarity_score == 0.0));
  }

  #[tokio::test]
  async fn new_image_failure_fails_the_request() {
    let embedder = FixedEmbedder::new(&[("c1.jpg", vec![1.0, 0.0])]);
    let engine = CorrelationEngine::with_defaults(embedder);
    let batch = ImageBatch {
      new_image: new_image(),
      candidates: vec![candidate("c1", "c1.jpg", 0)],
    };

    let err = engine.score_batch(&batch).await.unwrap_err();
    assert!(matches!(err, EngineError::Provider(_)));
  }

  #[test]
  fn antiparallel_image_contributes_nothing() {
    let config = Config::default();
    let new_emb = Embedding::new(vec![1.0, 0.0]).unwrap();
    let cand_emb = Embedding::new(vec![-1.0, 0.0]).unwrap();
    let outcome = score_image_pair(
      &config,
      &new_image(),
      &new_emb,
      &candidate("c", "c.jpg", 0),
      &cand_emb,
    )
    .unwrap();
    assert_eq!(outcome.score(), 0.3);
  }

  fn text(text: &str, area: &str, ts: &str) -> InboundTextReport {
    InboundTextReport {
      text: text.into(),
      timestamp: ts.into(),
      area_id: Some(area.into()),
      latitude: None,
      longitude: None,
    }
  }

  #[tokio::test]
  async fn text_duplicate_scenario() {
    let engine = CorrelationEngine::with_defaults(Arc::new(HashingEmbedder::default()));
    let first = engine
      .check_text_report(&text("Fire reported in a residential building", "sector_21", "2025-12-28T18:40:00"))
      .await
      .unwrap();
    assert!(!first.duplicate);

    let second = engine
      .check_text_report(&text("Fire reported in a residential building", "sector_21", "2025-12-28T18:45:00"))
      .await
      .unwrap();
    assert!(second.duplicate);

    let third = engine
      .check_text_report(&text("Fire reported in a residential building", "sector_99", "2025-12-28T18:50:00"))
      .await
      .unwrap();
    assert!(!third.duplicate);

    assert_eq!(engine.history().len(), 3);
  }

  #[tokio::test]
  async fn invalid_text_report_is_not_recorded() {
    let engine = CorrelationEngine::with_defaults(Arc::new(HashingEmbedder::default()));
    let raw = InboundTextReport {
      text: "Fire incident".into(),
      timestamp: "2025-12-28T19:00:00".into(),
      area_id: None,
      latitude: None,
      longitude: None,
    };
    let err = engine.check_text_report(&raw).await.unwrap_err();
    assert!(matches!(err, EngineError::Validation { .. }));
    assert!(engine.history().is_empty());
  }

  /// Hashing embedder that counts calls and fails for the listed texts.
  struct ScriptedTextEmbedder {
    inner: HashingEmbedder,
    failing: Vec<String>,
    calls: AtomicUsize,
  }

  impl ScriptedTextEmbedder {
    fn failing_on(texts: &[&str]) -> Arc<Self> {
      Arc::new(Self {
        inner: HashingEmbedder::default(),
        failing: texts.iter().map(|t| t.to_string()).collect(),
        calls: AtomicUsize::new(0),
      })
    }

    fn calls(&self) -> usize {
      self.calls.load(Ordering::SeqCst)
    }
  }

  #[async_trait]
  impl EmbeddingProvider for ScriptedTextEmbedder {
    async fn embed(&self, input: &EmbedInput) -> Result<Embedding, EngineError> {
      self.calls.fetch_add(1, Ordering::SeqCst);
      if self.failing.iter().any(|t| t == input.value()) {
        return Err(EngineError::provider(format!("backend rejected {:?}", input.value())));
      }
      self.inner.embed(input).await
    }
  }

  fn area_record(text: &str, area: &str, minutes: i64) -> IncidentRecord {
    IncidentRecord {
      text: text.into(),
      timestamp: t0() + Duration::minutes(minutes),
      location: Location::Area(area.into()),
    }
  }

  #[tokio::test]
  async fn unscorable_history_record_is_skipped() {
    let embedder = ScriptedTextEmbedder::failing_on(&["garbled upload"]);
    let engine = CorrelationEngine::with_defaults(embedder.clone());
    engine.history().append(area_record("garbled upload", "sector_21", 0));
    engine.history().append(area_record("fire reported in a residential building", "sector_21", 1));

    let resp = engine
      .check_text_report(&text("Fire reported in a residential building", "sector_21", "2025-12-28T18:45:00"))
      .await
      .unwrap();
    assert!(resp.duplicate);
    assert_eq!(embedder.calls(), 3);
    assert_eq!(engine.history().len(), 3);
  }

  #[tokio::test]
  async fn only_unscorable_history_is_not_a_duplicate() {
    let embedder = ScriptedTextEmbedder::failing_on(&["garbled upload"]);
    let engine = CorrelationEngine::with_defaults(embedder);
    engine.history().append(area_record("garbled upload", "sector_21", 0));

    let resp = engine
      .check_text_report(&text("garbled upload again", "sector_21", "2025-12-28T18:45:00"))
      .await
      .unwrap();
    assert!(!resp.duplicate);
    assert_eq!(engine.history().len(), 2);
  }

  #[tokio::test]
  async fn failed_new_report_embedding_fails_and_is_not_recorded() {
    let embedder = ScriptedTextEmbedder::failing_on(&["tree fallen on power line"]);
    let engine = CorrelationEngine::with_defaults(embedder);
    engine.history().append(area_record("fire reported in a residential building", "sector_21", 0));

    let err = engine
      .check_text_report(&text("Tree fallen on power line", "sector_21", "2025-12-28T18:45:00"))
      .await
      .unwrap_err();
    assert!(matches!(err, EngineError::Provider(_)));
    assert_eq!(engine.history().len(), 1);
  }

  #[tokio::test]
  async fn validation_failure_never_reaches_the_provider() {
    let embedder = ScriptedTextEmbedder::failing_on(&[]);
    let engine = CorrelationEngine::with_defaults(embedder.clone());
    engine.history().append(area_record("fire reported in a residential building", "sector_21", 0));

    let missing_location = InboundTextReport {
      area_id: None,
      ..text("Fire reported in a residential building", "sector_21", "2025-12-28T18:45:00")
    };
    let bad_timestamp = text("Fire reported in a residential building", "sector_21", "28/12/2025");
    let blank = text("   ", "sector_21", "2025-12-28T18:45:00");

    for raw in [missing_location, bad_timestamp, blank] {
      let err = engine.check_text_report(&raw).await.unwrap_err();
      assert!(matches!(err, EngineError::Validation { .. }));
    }
    assert_eq!(embedder.calls(), 0);
    assert_eq!(engine.history().len(), 1);
  }

  #[tokio::test]
  async fn symbol_only_reports_are_checked_and_recorded() {
    let engine = CorrelationEngine::with_defaults(Arc::new(HashingEmbedder::default()));
    let first = engine
      .check_text_report(&text("!!!", "sector_21", "2025-12-28T18:40:00"))
      .await
      .unwrap();
    assert!(!first.duplicate);
    engine
      .check_text_report(&text("🔥🔥🔥", "sector_21", "2025-12-28T18:41:00"))
      .await
      .unwrap();
    let again = engine
      .check_text_report(&text("!!!", "sector_21", "2025-12-28T18:42:00"))
      .await
      .unwrap();
    assert!(again.duplicate);
    assert_eq!(engine.history().len(), 3);
  }

  #[tokio::test]
  async fn stale_history_is_not_a_duplicate() {
    let engine = CorrelationEngine::with_defaults(Arc::new(HashingEmbedder::default()));
    engine
      .check_text_report(&text("Water logging on main road", "sector_5", "2025-12-28T10:00:00"))
      .await
      .unwrap();
    let later = engine
      .check_text_report(&text("Water logging on main road", "sector_5", "2025-12-28T13:00:01"))
      .await
      .unwrap();
    assert!(!later.duplicate);
  }
}
