//! [`Syncer`] — one reconciliation run, end to end, under a single-writer lock.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::{
  Error, Result,
  apply::apply,
  reconcile::reconcile,
  report::{SyncResult, summarize},
  snapshot::Snapshot,
  source::{Source, SourceEntry, validate},
  store::RecordStore,
};

/// Drives reconciliation runs for one upstream source against one store.
///
/// The run lock is held from snapshot load until the batch is written, so two
/// runs never interleave. Waiting callers are served in arrival order. Build
/// exactly one `Syncer` per source and share it (it is cheap to wrap in an
/// [`Arc`]).
pub struct Syncer<S> {
  store: Arc<S>,
  lock:  Mutex<()>,
}

impl<S: RecordStore> Syncer<S> {
  pub fn new(store: Arc<S>) -> Self {
    Self { store, lock: Mutex::new(()) }
  }

  pub fn store(&self) -> &Arc<S> { &self.store }

  /// Pull trigger: fetch the list from `source`, then reconcile.
  pub async fn pull<P: Source>(&self, source: &P) -> Result<SyncResult> {
    let entries = source
      .fetch()
      .await
      .map_err(|e| Error::SourceUnavailable(Box::new(e)))?;
    self.import(entries).await
  }

  /// Import trigger: reconcile a list supplied directly by the caller.
  pub async fn import(&self, entries: Vec<SourceEntry>) -> Result<SyncResult> {
    let entries = validate(entries)?;
    info!(count = entries.len(), "starting reconciliation run");

    let _guard = self.lock.lock().await;

    let active = self
      .store
      .load_active()
      .await
      .map_err(|e| Error::StoreUnavailable(Box::new(e)))?;
    let snapshot = Snapshot::index(active)?;

    let plan = reconcile(&entries, &snapshot);
    if plan.source_empty {
      warn!(active = snapshot.len(), "upstream list is empty");
    }
    for id in &plan.duplicates {
      warn!(external_id = %id, "external id repeated upstream; last occurrence used");
    }

    apply(self.store.as_ref(), &plan).await?;

    let result = summarize(&plan);
    info!(
      inserted = result.inserted,
      updated = result.updated,
      retired = result.retired,
      "{}",
      result.message
    );
    Ok(result)
  }
}
