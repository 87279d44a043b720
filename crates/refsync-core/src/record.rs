//! Reference records — versioned copies of upstream entities.
//!
//! A record is never deleted and its content is never edited. A changed
//! upstream value is represented by retiring the old record and inserting a
//! new one with the same external id.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Identifiers ─────────────────────────────────────────────────────────────

/// Store-assigned identity of one record version.
pub type RecordId = Uuid;

/// The stable key supplied by the upstream source. Shared by every version of
/// one logical entity; unique among active records only.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ExternalId(pub i64);

impl fmt::Display for ExternalId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

impl From<i64> for ExternalId {
  fn from(v: i64) -> Self { Self(v) }
}

// ─── Status ──────────────────────────────────────────────────────────────────

/// Lifecycle of a single record. `Retired` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
  Active,
  Retired,
}

impl RecordStatus {
  pub fn from_active(active: bool) -> Self {
    if active { Self::Active } else { Self::Retired }
  }

  pub fn is_active(self) -> bool { matches!(self, Self::Active) }

  /// Apply a transition; only `Active → Retired` is legal.
  pub fn transition_to(self, next: Self) -> Option<Self> {
    match (self, next) {
      (Self::Active, Self::Retired) => Some(Self::Retired),
      _ => None,
    }
  }
}

// ─── Record ──────────────────────────────────────────────────────────────────

/// One version of a reference entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceRecord {
  pub record_id:   RecordId,
  pub external_id: ExternalId,
  pub name:        String,
  pub active:      bool,
  /// Server-assigned timestamp; never changes after creation.
  pub created_at:  DateTime<Utc>,
}

impl ReferenceRecord {
  pub fn status(&self) -> RecordStatus { RecordStatus::from_active(self.active) }
}

// ─── NewRecord ───────────────────────────────────────────────────────────────

/// Input to [`crate::store::RecordStore::apply_batch`].
/// `record_id` and `created_at` are always set by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRecord {
  pub external_id: ExternalId,
  pub name:        String,
}

impl NewRecord {
  pub fn new(external_id: impl Into<ExternalId>, name: impl Into<String>) -> Self {
    Self { external_id: external_id.into(), name: name.into() }
  }

  /// Materialise a record as a store would on insert.
  pub fn into_record(self, created_at: DateTime<Utc>) -> ReferenceRecord {
    ReferenceRecord {
      record_id: Uuid::new_v4(),
      external_id: self.external_id,
      name: self.name,
      active: true,
      created_at,
    }
  }
}
