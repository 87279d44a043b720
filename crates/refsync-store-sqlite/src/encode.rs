//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings; UUIDs are hyphenated lowercase strings.

use chrono::{DateTime, Utc};
use refsync_core::record::{ExternalId, ReferenceRecord};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `records` row, selected as
/// `record_id, external_id, name, active, created_at`.
pub struct RawRecord {
  pub record_id:   String,
  pub external_id: i64,
  pub name:        String,
  pub active:      bool,
  pub created_at:  String,
}

impl RawRecord {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      record_id:   row.get(0)?,
      external_id: row.get(1)?,
      name:        row.get(2)?,
      active:      row.get(3)?,
      created_at:  row.get(4)?,
    })
  }

  pub fn into_record(self) -> Result<ReferenceRecord> {
    Ok(ReferenceRecord {
      record_id:   decode_uuid(&self.record_id)?,
      external_id: ExternalId(self.external_id),
      name:        self.name,
      active:      self.active,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}
