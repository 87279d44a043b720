//! The in-memory baseline for one run: the active records keyed by external
//! id.

use std::collections::HashMap;

use crate::{
  Error, Result,
  record::{ExternalId, ReferenceRecord},
};

/// Active records indexed by [`ExternalId`], built in one pass.
///
/// Iteration order is the order the store returned the records in.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
  records: Vec<ReferenceRecord>,
  index:   HashMap<ExternalId, usize>,
}

impl Snapshot {
  /// Index `records`. Rejects retired records and duplicate active external
  /// ids, either of which means the store broke its contract.
  pub fn index(records: Vec<ReferenceRecord>) -> Result<Self> {
    let mut index = HashMap::with_capacity(records.len());

    for (pos, record) in records.iter().enumerate() {
      if !record.active {
        return Err(Error::InconsistentSnapshot(format!(
          "record {} (external id {}) is retired",
          record.record_id, record.external_id
        )));
      }
      if index.insert(record.external_id, pos).is_some() {
        return Err(Error::InconsistentSnapshot(format!(
          "external id {} has more than one active record",
          record.external_id
        )));
      }
    }

    Ok(Self { records, index })
  }

  pub fn get(&self, external_id: ExternalId) -> Option<&ReferenceRecord> {
    self.index.get(&external_id).map(|&pos| &self.records[pos])
  }

  pub fn iter(&self) -> impl Iterator<Item = &ReferenceRecord> {
    self.records.iter()
  }

  pub fn len(&self) -> usize { self.records.len() }

  pub fn is_empty(&self) -> bool { self.records.is_empty() }
}
