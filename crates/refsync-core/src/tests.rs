//! End-to-end runs of [`Syncer`] against [`MemoryStore`] and a deliberately
//! non-atomic store.

use std::{
  collections::HashMap,
  sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
  },
};

use chrono::Utc;

use crate::{
  Error, MemoryStore, SyncResult, Syncer,
  record::{ExternalId, NewRecord, ReferenceRecord},
  report::SyncCounts,
  source::{Source, SourceEntry, StaticSource},
  store::{ApplyFailure, Batch, BatchAck, RecordStore},
};

fn entries(pairs: &[(i64, &str)]) -> Vec<SourceEntry> {
  pairs.iter().map(|&(id, name)| SourceEntry::new(id, name)).collect()
}

async fn seeded(pairs: &[(i64, &str)]) -> Syncer<MemoryStore> {
  let syncer = Syncer::new(Arc::new(MemoryStore::new()));
  syncer.import(entries(pairs)).await.unwrap();
  syncer
}

async fn active_names(store: &MemoryStore) -> HashMap<i64, String> {
  store
    .load_active()
    .await
    .unwrap()
    .into_iter()
    .map(|r| (r.external_id.0, r.name))
    .collect()
}

fn assert_counts(result: &SyncResult, inserted: usize, updated: usize, retired: usize) {
  assert_eq!(
    result.counts(),
    SyncCounts { inserted, updated, retired },
    "message: {}",
    result.message
  );
}

/// No external id has more than one active record.
fn assert_at_most_one_active(records: &[ReferenceRecord]) {
  let mut seen = HashMap::new();
  for r in records.iter().filter(|r| r.active) {
    assert!(
      seen.insert(r.external_id, r.record_id).is_none(),
      "external id {} has two active records",
      r.external_id
    );
  }
}

// ─── Scenarios ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn pure_insert() {
  let syncer = Syncer::new(Arc::new(MemoryStore::new()));
  let result = syncer.import(entries(&[(1, "North"), (2, "South")])).await.unwrap();
  assert_counts(&result, 2, 0, 0);
}

#[tokio::test]
async fn pure_retirement() {
  let syncer = seeded(&[(1, "North"), (2, "South"), (3, "East")]).await;
  let result = syncer.import(entries(&[(1, "North")])).await.unwrap();
  assert_counts(&result, 0, 0, 2);

  let active = active_names(syncer.store()).await;
  assert_eq!(active.len(), 1);
  assert_eq!(active[&1], "North");
}

#[tokio::test]
async fn rename_supersedes() {
  let syncer = seeded(&[(1, "North")]).await;
  let result = syncer.import(entries(&[(1, "North Updated")])).await.unwrap();
  assert_counts(&result, 0, 1, 0);

  let all = syncer.store().records().unwrap();
  assert_eq!(all.len(), 2);
  let retired: Vec<_> = all.iter().filter(|r| !r.active).collect();
  let active: Vec<_> = all.iter().filter(|r| r.active).collect();
  assert_eq!(retired.len(), 1);
  assert_eq!((retired[0].external_id, retired[0].name.as_str()), (ExternalId(1), "North"));
  assert_eq!(active.len(), 1);
  assert_eq!(
    (active[0].external_id, active[0].name.as_str()),
    (ExternalId(1), "North Updated")
  );
}

#[tokio::test]
async fn mixed() {
  let syncer = seeded(&[(1, "North"), (2, "South"), (3, "East")]).await;
  let result = syncer
    .import(entries(&[(1, "North Updated"), (2, "South"), (4, "West")]))
    .await
    .unwrap();
  assert_counts(&result, 1, 1, 1);
}

#[tokio::test]
async fn empty_upstream() {
  let syncer = seeded(&[(1, "North")]).await;
  let result = syncer.import(vec![]).await.unwrap();
  assert_counts(&result, 0, 0, 1);
  assert!(result.message.contains("no entities found upstream"), "{}", result.message);
  assert!(active_names(syncer.store()).await.is_empty());
}

// ─── Properties ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn second_identical_run_is_noop() {
  let list = entries(&[(1, "North Updated"), (2, "South"), (4, "West")]);
  let syncer = seeded(&[(1, "North"), (2, "South"), (3, "East")]).await;

  syncer.import(list.clone()).await.unwrap();
  let before = syncer.store().records().unwrap().len();
  let again = syncer.import(list).await.unwrap();

  assert_counts(&again, 0, 0, 0);
  assert_eq!(syncer.store().records().unwrap().len(), before);
}

#[tokio::test]
async fn history_is_monotonic_and_upstream_is_covered() {
  let runs: &[&[(i64, &str)]] = &[
    &[(1, "North"), (2, "South")],
    &[(1, "North"), (2, "South 2"), (3, "East")],
    &[],
    &[(3, "East"), (5, "Far West")],
    &[(3, "East 2"), (5, "Far West"), (1, "North")],
  ];

  let syncer = Syncer::new(Arc::new(MemoryStore::new()));
  let mut previous_total = 0;

  for run in runs {
    syncer.import(entries(run)).await.unwrap();

    let all = syncer.store().records().unwrap();
    assert!(all.len() >= previous_total, "history shrank");
    previous_total = all.len();
    assert_at_most_one_active(&all);

    let active = active_names(syncer.store()).await;
    assert_eq!(active.len(), run.len());
    for (id, name) in run.iter() {
      assert_eq!(active.get(id).map(String::as_str), Some(*name));
    }
  }
}

#[tokio::test]
async fn retired_record_is_never_reactivated() {
  let syncer = seeded(&[(1, "North")]).await;
  syncer.import(vec![]).await.unwrap();
  let result = syncer.import(entries(&[(1, "North")])).await.unwrap();

  // The same value comes back as a fresh insertion, not a reactivation.
  assert_counts(&result, 1, 0, 0);
  let all = syncer.store().records().unwrap();
  assert_eq!(all.len(), 2);
  assert!(!all[0].active);
  assert!(all[1].active);
}

#[tokio::test]
async fn pull_and_import_agree() {
  let list = entries(&[(1, "North Updated"), (4, "West")]);
  let seed = &[(1, "North"), (2, "South")];

  let pulled = seeded(seed).await;
  let by_pull = pulled.pull(&StaticSource::new(list.clone())).await.unwrap();

  let imported = seeded(seed).await;
  let by_import = imported.import(list).await.unwrap();

  assert_eq!(by_pull, by_import);
}

#[tokio::test]
async fn concurrent_runs_are_serialised() {
  let syncer = Arc::new(seeded(&[(1, "North"), (2, "South")]).await);

  let mut tasks = vec![];
  for i in 0..16 {
    let syncer = syncer.clone();
    tasks.push(tokio::spawn(async move {
      let name = format!("North {}", i % 2);
      syncer.import(entries(&[(1, name.as_str()), (3, "East")])).await
    }));
  }
  for task in tasks {
    task.await.unwrap().unwrap();
  }

  let all = syncer.store().records().unwrap();
  assert_at_most_one_active(&all);
  let active = active_names(syncer.store()).await;
  assert_eq!(active.len(), 2);
  assert!(active.contains_key(&1) && active.contains_key(&3));
}

// ─── Failures ────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
#[error("upstream timed out")]
struct Timeout;

struct DownSource;

impl Source for DownSource {
  type Error = Timeout;

  async fn fetch(&self) -> Result<Vec<SourceEntry>, Self::Error> { Err(Timeout) }
}

#[tokio::test]
async fn unavailable_source_writes_nothing() {
  let syncer = seeded(&[(1, "North")]).await;
  let err = syncer.pull(&DownSource).await.unwrap_err();

  assert!(matches!(err, Error::SourceUnavailable(_)), "got {err:?}");
  assert!(err.is_retriable());
  assert_eq!(syncer.store().records().unwrap().len(), 1);
}

#[tokio::test]
async fn malformed_entry_writes_nothing() {
  let syncer = seeded(&[(1, "North")]).await;
  let mut list = entries(&[(2, "South")]);
  list.push(SourceEntry { id: None, name: "Nowhere".into() });

  let err = syncer.import(list).await.unwrap_err();
  assert!(matches!(err, Error::MalformedSourceEntry { index: 1 }));
  assert!(!err.is_retriable());
  assert_eq!(active_names(syncer.store()).await.len(), 1);
}

#[tokio::test]
async fn inconsistent_store_is_not_retried() {
  let twin = |name: &str| NewRecord::new(1, name).into_record(Utc::now());
  let store = Arc::new(MemoryStore::with_records(vec![twin("North"), twin("Norte")]));
  let syncer = Syncer::new(store.clone());

  let err = syncer.import(entries(&[(1, "North")])).await.unwrap_err();
  assert!(matches!(err, Error::InconsistentSnapshot(_)), "got {err:?}");
  assert!(!err.is_retriable());
  assert_eq!(store.records().unwrap().len(), 2);
}

#[derive(Debug, thiserror::Error)]
#[error("disk full")]
struct DiskFull;

/// Applies deactivations, then fails every insertion while `fail_inserts`
/// is set — the behaviour of a store without cross-batch transactions.
#[derive(Default)]
struct SplitStore {
  inner:        MemoryStore,
  fail_inserts: AtomicBool,
  offline:      AtomicBool,
}

impl RecordStore for SplitStore {
  type Error = DiskFull;

  async fn load_active(&self) -> Result<Vec<ReferenceRecord>, Self::Error> {
    if self.offline.load(Ordering::SeqCst) {
      return Err(DiskFull);
    }
    self.inner.load_active().await.map_err(|_| DiskFull)
  }

  async fn load_all(&self) -> Result<Vec<ReferenceRecord>, Self::Error> {
    self.inner.load_all().await.map_err(|_| DiskFull)
  }

  async fn apply_batch(
    &self,
    batch: Batch,
  ) -> Result<BatchAck, ApplyFailure<Self::Error>> {
    let retire = Batch { deactivations: batch.deactivations, insertions: vec![] };
    let ack = self.inner.apply_batch(retire).await.map_err(|_| DiskFull)?;

    if self.fail_inserts.load(Ordering::SeqCst) {
      return Err(ApplyFailure {
        error:                   DiskFull,
        deactivations_committed: ack.deactivated > 0,
        stale_snapshot:          false,
      });
    }

    let insert = Batch { deactivations: vec![], insertions: batch.insertions };
    let inserted = self.inner.apply_batch(insert).await.map_err(|_| DiskFull)?;
    Ok(BatchAck { deactivated: ack.deactivated, inserted: inserted.inserted })
  }
}

#[tokio::test]
async fn split_write_reports_partial_application_and_self_heals() {
  let store = Arc::new(SplitStore::default());
  let syncer = Syncer::new(store.clone());
  syncer.import(entries(&[(1, "North"), (2, "South")])).await.unwrap();

  store.fail_inserts.store(true, Ordering::SeqCst);
  let list = entries(&[(1, "North Updated"), (2, "South")]);
  let err = syncer.import(list.clone()).await.unwrap_err();

  assert!(matches!(err, Error::PartialApplication { .. }), "got {err:?}");
  assert_eq!(err.planned(), Some(SyncCounts { inserted: 0, updated: 1, retired: 0 }));
  assert!(err.to_string().contains("re-run"), "{err}");

  // The old version is gone and nothing replaced it yet.
  let active = store.load_active().await.unwrap();
  assert_eq!(active.len(), 1);

  store.fail_inserts.store(false, Ordering::SeqCst);
  let healed = syncer.import(list).await.unwrap();
  assert_counts(&healed, 1, 0, 0);

  let active: HashMap<_, _> = store
    .load_active()
    .await
    .unwrap()
    .into_iter()
    .map(|r| (r.external_id.0, r.name))
    .collect();
  assert_eq!(active[&1], "North Updated");
  assert_eq!(active[&2], "South");
}

#[tokio::test]
async fn failed_batch_with_nothing_committed_is_rejected() {
  let store = Arc::new(SplitStore::default());
  let syncer = Syncer::new(store.clone());

  store.fail_inserts.store(true, Ordering::SeqCst);
  let err = syncer.import(entries(&[(1, "North")])).await.unwrap_err();
  assert!(matches!(err, Error::BatchRejected { .. }), "got {err:?}");
  assert_eq!(err.planned().map(|c| c.inserted), Some(1));
}

#[tokio::test]
async fn unreachable_store_writes_nothing() {
  let store = Arc::new(SplitStore::default());
  store.offline.store(true, Ordering::SeqCst);
  let syncer = Syncer::new(store.clone());

  let err = syncer.import(entries(&[(1, "North")])).await.unwrap_err();
  assert!(matches!(err, Error::StoreUnavailable(_)), "got {err:?}");
  assert!(store.inner.records().unwrap().is_empty());
}

/// Lets a rival writer retire the first active record right after every
/// snapshot load, as another process sharing the database would.
struct RacedStore {
  inner: MemoryStore,
}

impl RecordStore for RacedStore {
  type Error = crate::memory::MemoryStoreError;

  async fn load_active(&self) -> Result<Vec<ReferenceRecord>, Self::Error> {
    let snapshot = self.inner.load_active().await?;
    if let Some(first) = snapshot.first() {
      let rival = Batch { deactivations: vec![first.record_id], insertions: vec![] };
      self.inner.apply_batch(rival).await.map_err(|f| f.error)?;
    }
    Ok(snapshot)
  }

  async fn load_all(&self) -> Result<Vec<ReferenceRecord>, Self::Error> {
    self.inner.load_all().await
  }

  async fn apply_batch(
    &self,
    batch: Batch,
  ) -> Result<BatchAck, ApplyFailure<Self::Error>> {
    self.inner.apply_batch(batch).await
  }
}

#[tokio::test]
async fn concurrent_external_write_is_a_retriable_conflict() {
  let inner = MemoryStore::new();
  Syncer::new(Arc::new(inner.clone()))
    .import(entries(&[(1, "North")]))
    .await
    .unwrap();
  let syncer = Syncer::new(Arc::new(RacedStore { inner: inner.clone() }));

  let err = syncer.import(entries(&[(1, "North Updated")])).await.unwrap_err();
  assert!(matches!(err, Error::StaleSnapshot { .. }), "got {err:?}");
  assert!(err.is_retriable());
  assert_eq!(err.planned().map(|c| c.updated), Some(1));

  // Only the rival's retirement landed; the superseding insert was rolled back.
  let all = inner.records().unwrap();
  assert_eq!(all.len(), 1);
  assert!(!all[0].active);
}
