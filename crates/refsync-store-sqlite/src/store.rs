//! [`SqliteStore`] — the SQLite implementation of [`RecordStore`].

use std::path::Path;

use chrono::Utc;
use refsync_core::{
  record::ReferenceRecord,
  store::{ApplyFailure, Batch, BatchAck, RecordStore},
};
use rusqlite::TransactionBehavior;
use tracing::debug;

use crate::{
  Error, Result,
  encode::{RawRecord, encode_dt, encode_uuid},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A refsync record store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn select_records(&self, sql: &'static str) -> Result<Vec<ReferenceRecord>> {
    let raws: Vec<RawRecord> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt
          .query_map([], RawRecord::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawRecord::into_record).collect()
  }
}

// ─── RecordStore impl ────────────────────────────────────────────────────────

impl RecordStore for SqliteStore {
  type Error = Error;

  async fn load_active(&self) -> Result<Vec<ReferenceRecord>> {
    self
      .select_records(
        "SELECT record_id, external_id, name, active, created_at
         FROM records
         WHERE active = 1
         ORDER BY created_at, rowid",
      )
      .await
  }

  async fn load_all(&self) -> Result<Vec<ReferenceRecord>> {
    self
      .select_records(
        "SELECT record_id, external_id, name, active, created_at
         FROM records
         ORDER BY created_at, rowid",
      )
      .await
  }

  async fn apply_batch(
    &self,
    batch: Batch,
  ) -> Result<BatchAck, ApplyFailure<Error>> {
    let now = Utc::now();
    let ids = batch.deactivations;
    let inserted: Vec<ReferenceRecord> = batch
      .insertions
      .into_iter()
      .map(|new| new.into_record(now))
      .collect();

    let deactivate: Vec<String> = ids.iter().copied().map(encode_uuid).collect();
    let rows: Vec<(String, i64, String, String)> = inserted
      .iter()
      .map(|r| {
        (encode_uuid(r.record_id), r.external_id.0, r.name.clone(), encode_dt(r.created_at))
      })
      .collect();

    // `Err(pos)` names the first stale deactivation; the transaction is
    // dropped without commit, which rolls it back.
    let outcome: std::result::Result<usize, usize> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        for (pos, id) in deactivate.iter().enumerate() {
          let changed = tx.execute(
            "UPDATE records SET active = 0 WHERE record_id = ?1 AND active = 1",
            rusqlite::params![id],
          )?;
          if changed == 0 {
            return Ok(Err(pos));
          }
        }

        {
          let mut stmt = tx.prepare(
            "INSERT INTO records (record_id, external_id, name, active, created_at)
             VALUES (?1, ?2, ?3, 1, ?4)",
          )?;
          for (record_id, external_id, name, created_at) in &rows {
            stmt.execute(rusqlite::params![record_id, external_id, name, created_at])?;
          }
        }

        tx.commit()?;
        Ok(Ok(deactivate.len()))
      })
      .await
      .map_err(Error::from)?;

    let deactivated =
      outcome.map_err(|pos| ApplyFailure::stale(Error::StaleRecord(ids[pos])))?;
    debug!(deactivated, inserted = inserted.len(), "batch committed");

    Ok(BatchAck { deactivated, inserted })
  }
}

