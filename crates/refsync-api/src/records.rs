//! Read-only views over the record store.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/records` | Every version, retired history included, oldest first |
//! | `GET`  | `/records/active` | Current versions only |
//! | `GET`  | `/health` | Loads the active set to prove the store answers |

use axum::{Json, extract::State};
use refsync_core::{record::ReferenceRecord, source::Source, store::RecordStore};
use serde_json::{Value, json};

use crate::{AppState, error::ApiError};

/// `GET /records`
pub async fn list_all<S, P>(
  State(state): State<AppState<S, P>>,
) -> Result<Json<Vec<ReferenceRecord>>, ApiError>
where
  S: RecordStore + 'static,
  P: Source + 'static,
{
  let records = state
    .syncer
    .store()
    .load_all()
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(records))
}

/// `GET /records/active`
pub async fn list_active<S, P>(
  State(state): State<AppState<S, P>>,
) -> Result<Json<Vec<ReferenceRecord>>, ApiError>
where
  S: RecordStore + 'static,
  P: Source + 'static,
{
  let records = state
    .syncer
    .store()
    .load_active()
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(records))
}

/// `GET /health`
pub async fn health<S, P>(
  State(state): State<AppState<S, P>>,
) -> Result<Json<Value>, ApiError>
where
  S: RecordStore + 'static,
  P: Source + 'static,
{
  let active = state
    .syncer
    .store()
    .load_active()
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(json!({ "status": "up", "active_records": active.len() })))
}
