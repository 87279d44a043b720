//! The `RecordStore` trait and the batch types it consumes.
//!
//! The trait is implemented by storage backends (e.g. `refsync-store-sqlite`
//! and [`crate::MemoryStore`]). The reconciliation engine depends on this
//! abstraction, not on any concrete backend.

use std::future::Future;

use crate::record::{NewRecord, RecordId, ReferenceRecord};

// ─── Batch ───────────────────────────────────────────────────────────────────

/// One run's worth of writes. Deactivations are always applied before
/// insertions so that no external id ever has two active records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Batch {
  pub deactivations: Vec<RecordId>,
  pub insertions:    Vec<NewRecord>,
}

impl Batch {
  pub fn is_empty(&self) -> bool {
    self.deactivations.is_empty() && self.insertions.is_empty()
  }
}

/// Acknowledgement of a fully applied [`Batch`].
#[derive(Debug, Clone, Default)]
pub struct BatchAck {
  pub deactivated: usize,
  /// The persisted records, with store-assigned ids and timestamps.
  pub inserted:    Vec<ReferenceRecord>,
}

/// A failed [`RecordStore::apply_batch`] call.
#[derive(Debug)]
pub struct ApplyFailure<E> {
  pub error: E,
  /// `true` if the deactivation half was durably written before the failure.
  /// Atomic stores always report `false`.
  pub deactivations_committed: bool,
  /// `true` if a deactivation named a record that was missing or already
  /// retired, i.e. the caller planned against an out-of-date snapshot.
  pub stale_snapshot: bool,
}

impl<E> ApplyFailure<E> {
  /// A failure that left the store untouched.
  pub fn rolled_back(error: E) -> Self {
    Self { error, deactivations_committed: false, stale_snapshot: false }
  }

  /// A rolled-back failure caused by an out-of-date snapshot.
  pub fn stale(error: E) -> Self {
    Self { error, deactivations_committed: false, stale_snapshot: true }
  }
}

impl<E> From<E> for ApplyFailure<E> {
  fn from(error: E) -> Self { Self::rolled_back(error) }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a refsync record store backend.
///
/// Records are never deleted and never edited, except for the one-way
/// `active: true → false` flip performed through [`Batch::deactivations`].
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait RecordStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Every record with `active = true`. Must never return retired history.
  fn load_active(
    &self,
  ) -> impl Future<Output = Result<Vec<ReferenceRecord>, Self::Error>> + Send + '_;

  /// Every record ever written, active and retired, oldest first.
  fn load_all(
    &self,
  ) -> impl Future<Output = Result<Vec<ReferenceRecord>, Self::Error>> + Send + '_;

  /// Deactivate `batch.deactivations`, then insert `batch.insertions`.
  ///
  /// Implementations should apply both halves in one transaction. A
  /// deactivation of a record that is missing or already retired means the
  /// caller's snapshot is stale and must fail the whole batch.
  fn apply_batch(
    &self,
    batch: Batch,
  ) -> impl Future<Output = Result<BatchAck, ApplyFailure<Self::Error>>> + Send + '_;
}
