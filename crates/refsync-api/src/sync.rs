//! The two trigger endpoints. Both end in
//! [`Syncer::import`](refsync_core::Syncer::import), so the same
//! effective list always produces the same [`SyncResult`].
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/sync` | Pull the list from the configured upstream source |
//! | `POST` | `/import` | Body: JSON array of `{"id": 1, "name": "..."}` |

use axum::{Json, extract::State};
use refsync_core::{
  SyncResult,
  source::{Source, SourceEntry},
  store::RecordStore,
};

use crate::{AppState, error::ApiError};

/// `POST /sync`
pub async fn pull<S, P>(
  State(state): State<AppState<S, P>>,
) -> Result<Json<SyncResult>, ApiError>
where
  S: RecordStore + 'static,
  P: Source + 'static,
{
  let result = state.syncer.pull(state.source.as_ref()).await?;
  Ok(Json(result))
}

/// `POST /import`
pub async fn import<S, P>(
  State(state): State<AppState<S, P>>,
  Json(entries): Json<Vec<SourceEntry>>,
) -> Result<Json<SyncResult>, ApiError>
where
  S: RecordStore + 'static,
  P: Source + 'static,
{
  let result = state.syncer.import(entries).await?;
  Ok(Json(result))
}
