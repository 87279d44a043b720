//! [`MemoryStore`] — an in-process implementation of [`RecordStore`].

use std::{
  collections::{HashMap, HashSet},
  sync::{Arc, Mutex},
};

use chrono::Utc;
use thiserror::Error;

use crate::{
  record::{ExternalId, RecordId, RecordStatus, ReferenceRecord},
  store::{ApplyFailure, Batch, BatchAck, RecordStore},
};

#[derive(Debug, Error)]
pub enum MemoryStoreError {
  #[error("record {0} is missing or already retired")]
  StaleRecord(RecordId),

  #[error("external id {0} would have two active records")]
  DuplicateActive(ExternalId),

  #[error("memory store lock poisoned")]
  Poisoned,
}

/// A record store held in a `Vec` behind a mutex.
///
/// Both halves of a batch are validated and applied under one lock
/// acquisition, so a batch is all-or-nothing. Cloning is cheap and clones
/// share the same records.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
  records: Arc<Mutex<Vec<ReferenceRecord>>>,
}

impl MemoryStore {
  pub fn new() -> Self { Self::default() }

  /// Seed a store with existing records, e.g. history loaded elsewhere.
  pub fn with_records(records: Vec<ReferenceRecord>) -> Self {
    Self { records: Arc::new(Mutex::new(records)) }
  }

  /// A copy of every record, active and retired.
  pub fn records(&self) -> Result<Vec<ReferenceRecord>, MemoryStoreError> {
    Ok(self.records.lock().map_err(|_| MemoryStoreError::Poisoned)?.clone())
  }
}

impl RecordStore for MemoryStore {
  type Error = MemoryStoreError;

  async fn load_active(&self) -> Result<Vec<ReferenceRecord>, Self::Error> {
    let records = self.records.lock().map_err(|_| MemoryStoreError::Poisoned)?;
    Ok(records.iter().filter(|r| r.active).cloned().collect())
  }

  async fn load_all(&self) -> Result<Vec<ReferenceRecord>, Self::Error> {
    let mut all = self.records()?;
    all.sort_by_key(|r| r.created_at);
    Ok(all)
  }

  async fn apply_batch(
    &self,
    batch: Batch,
  ) -> Result<BatchAck, ApplyFailure<Self::Error>> {
    let mut records = self.records.lock().map_err(|_| MemoryStoreError::Poisoned)?;

    // Validate everything before the first mutation.
    let by_id: HashMap<RecordId, usize> = records
      .iter()
      .enumerate()
      .map(|(pos, r)| (r.record_id, pos))
      .collect();
    let mut transitions = Vec::with_capacity(batch.deactivations.len());
    let mut retiring: HashSet<usize> = HashSet::new();
    for id in &batch.deactivations {
      let stale = || ApplyFailure::stale(MemoryStoreError::StaleRecord(*id));
      let pos = *by_id.get(id).ok_or_else(stale)?;
      // Naming the same record twice is as stale as naming a retired one.
      if !retiring.insert(pos) {
        return Err(stale());
      }
      let next = records[pos]
        .status()
        .transition_to(RecordStatus::Retired)
        .ok_or_else(stale)?;
      transitions.push((pos, next));
    }

    let mut still_active: HashSet<ExternalId> = records
      .iter()
      .enumerate()
      .filter(|(pos, r)| r.status().is_active() && !retiring.contains(pos))
      .map(|(_, r)| r.external_id)
      .collect();
    for new in &batch.insertions {
      if !still_active.insert(new.external_id) {
        return Err(MemoryStoreError::DuplicateActive(new.external_id).into());
      }
    }

    for &(pos, next) in &transitions {
      records[pos].active = next.is_active();
    }

    let now = Utc::now();
    let inserted: Vec<ReferenceRecord> = batch
      .insertions
      .into_iter()
      .map(|new| new.into_record(now))
      .collect();
    records.extend(inserted.iter().cloned());

    Ok(BatchAck { deactivated: transitions.len(), inserted })
  }
}
