//! Reconciliation: upstream list + active snapshot → minimal store operations.
//!
//! Computes the set of insertions, supersessions, and retirements needed to
//! make the active records match the upstream list. Pure; runs in
//! O(n + m) for n upstream entries and m active records.

use std::collections::{HashMap, HashSet};

use crate::{
  record::{ExternalId, NewRecord, RecordId, ReferenceRecord},
  report::SyncCounts,
  snapshot::Snapshot,
  source::ExternalEntry,
  store::Batch,
};

/// An active record whose upstream name changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Supersession {
  /// The version to retire.
  pub old: ReferenceRecord,
  /// Its replacement.
  pub new: NewRecord,
}

/// The result of reconciling an upstream list against a snapshot.
///
/// The three operation sets are disjoint by external id.
#[derive(Debug, Clone, Default)]
pub struct Plan {
  pub to_insert:    Vec<NewRecord>,
  pub to_supersede: Vec<Supersession>,
  pub to_retire:    Vec<ReferenceRecord>,
  /// External ids that appeared more than once upstream. The last occurrence
  /// was used.
  pub duplicates:   Vec<ExternalId>,
  /// Whether the upstream list had no entries at all.
  pub source_empty: bool,
}

impl Plan {
  pub fn counts(&self) -> SyncCounts {
    SyncCounts {
      inserted: self.to_insert.len(),
      updated:  self.to_supersede.len(),
      retired:  self.to_retire.len(),
    }
  }

  /// Flatten into the two store batches: retirements plus the old half of
  /// every supersession, then insertions plus the new half.
  pub fn to_batch(&self) -> Batch {
    let deactivations: Vec<RecordId> = self
      .to_retire
      .iter()
      .chain(self.to_supersede.iter().map(|s| &s.old))
      .map(|r| r.record_id)
      .collect();

    let insertions: Vec<NewRecord> = self
      .to_insert
      .iter()
      .cloned()
      .chain(self.to_supersede.iter().map(|s| s.new.clone()))
      .collect();

    Batch { deactivations, insertions }
  }
}

/// Classify every upstream entry and every active record.
///
/// If an external id appears more than once upstream, the later entry wins
/// and the id is reported in [`Plan::duplicates`].
pub fn reconcile(entries: &[ExternalEntry], snapshot: &Snapshot) -> Plan {
  // Position of the winning (last) entry for every external id.
  let mut winner: HashMap<ExternalId, usize> = HashMap::with_capacity(entries.len());
  let mut duplicates: Vec<ExternalId> = vec![];
  let mut reported: HashSet<ExternalId> = HashSet::new();
  for (pos, entry) in entries.iter().enumerate() {
    if winner.insert(entry.external_id, pos).is_some()
      && reported.insert(entry.external_id)
    {
      duplicates.push(entry.external_id);
    }
  }

  let mut to_insert: Vec<NewRecord> = vec![];
  let mut to_supersede: Vec<Supersession> = vec![];
  let mut seen: HashSet<ExternalId> = HashSet::with_capacity(winner.len());

  for (pos, entry) in entries.iter().enumerate() {
    if winner.get(&entry.external_id) != Some(&pos) {
      continue;
    }
    seen.insert(entry.external_id);

    match snapshot.get(entry.external_id) {
      None => {
        to_insert.push(NewRecord::new(entry.external_id, entry.name.clone()));
      }
      Some(current) if current.name == entry.name => {
        // Unchanged — no-op.
      }
      Some(current) => {
        to_supersede.push(Supersession {
          old: current.clone(),
          new: NewRecord::new(entry.external_id, entry.name.clone()),
        });
      }
    }
  }

  // Any active record not named upstream → retirement.
  let to_retire: Vec<ReferenceRecord> = snapshot
    .iter()
    .filter(|r| !seen.contains(&r.external_id))
    .cloned()
    .collect();

  Plan {
    to_insert,
    to_supersede,
    to_retire,
    duplicates,
    source_empty: entries.is_empty(),
  }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
