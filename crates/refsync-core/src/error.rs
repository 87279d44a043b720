//! Error types for `refsync-core`.

use thiserror::Error;

use crate::report::SyncCounts;

/// A type-erased error from a collaborator (source fetcher or store backend).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Everything that can stop a reconciliation run.
///
/// The reconciler itself never fails; every variant originates in the source,
/// the store, or the write step.
#[derive(Debug, Error)]
pub enum Error {
  /// The upstream list could not be obtained. Nothing was written.
  #[error("upstream source unavailable")]
  SourceUnavailable(#[source] BoxError),

  /// An upstream entry has no usable external id. The run aborts before any
  /// write.
  #[error("upstream entry at index {index} has no usable external id")]
  MalformedSourceEntry { index: usize },

  /// The active snapshot could not be loaded. Nothing was written.
  #[error("record store unavailable")]
  StoreUnavailable(#[source] BoxError),

  /// The store returned a snapshot that breaks the one-active-per-id rule or
  /// contains retired records. Nothing was written.
  #[error("inconsistent snapshot: {0}")]
  InconsistentSnapshot(String),

  /// The write failed and was rolled back; the store is unchanged.
  #[error("batch rejected by record store ({planned})")]
  BatchRejected {
    planned: SyncCounts,
    #[source]
    source:  BoxError,
  },

  /// Another writer changed the store between snapshot load and write. The
  /// batch was rolled back; a re-run plans against fresh state.
  #[error("record store changed during reconciliation ({planned})")]
  StaleSnapshot {
    planned: SyncCounts,
    #[source]
    source:  BoxError,
  },

  /// Deactivations were committed but insertions were not.
  #[error(
    "partial application ({planned}): retirements committed, insertions \
     failed; re-run the reconciliation to converge"
  )]
  PartialApplication {
    planned: SyncCounts,
    #[source]
    source:  BoxError,
  },
}

impl Error {
  /// Whether an immediate re-run can be expected to make progress.
  ///
  /// A malformed upstream payload or a store that breaks its own invariants
  /// fails the same way on every retry.
  pub fn is_retriable(&self) -> bool {
    !matches!(
      self,
      Self::MalformedSourceEntry { .. } | Self::InconsistentSnapshot(_)
    )
  }

  /// Counts computed before the failure, if the run got that far.
  pub fn planned(&self) -> Option<SyncCounts> {
    match self {
      Self::BatchRejected { planned, .. }
      | Self::StaleSnapshot { planned, .. }
      | Self::PartialApplication { planned, .. } => Some(*planned),
      _ => None,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
