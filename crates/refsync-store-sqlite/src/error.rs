//! Error type for `refsync-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A deactivation named a record that is missing or already retired; the
  /// caller's snapshot is out of date. The batch was rolled back.
  #[error("record {0} is missing or already retired")]
  StaleRecord(uuid::Uuid),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
