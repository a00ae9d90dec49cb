//! Append-only in-memory incident history.
//!
//! One store per deployment, owned by the engine. Readers take a snapshot (a copy of the
//! `Arc` list) so a scan never observes a concurrent append; the lock is released before
//! the snapshot is returned and is never held across a provider call.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::types::IncidentRecord;

#[derive(Debug, Default)]
pub struct IncidentHistory {
  records: RwLock<Vec<Arc<IncidentRecord>>>,
}

impl IncidentHistory {
  pub fn new() -> Self {
    Self::default()
  }

  /// Point-in-time view of the history, in arrival order.
  pub fn snapshot(&self) -> Vec<Arc<IncidentRecord>> {
    self.records.read().clone()
  }

  pub fn append(&self, record: IncidentRecord) {
    self.records.write().push(Arc::new(record));
  }

  pub fn len(&self) -> usize {
    self.records.read().len()
  }

  pub fn is_empty(&self) -> bool {
    self.records.read().is_empty()
  }

  /// Reset hook for tests and operator tooling.
  pub fn clear(&self) {
    self.records.write().clear();
  }
}
