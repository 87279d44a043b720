//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use refsync_core::Error as SyncError;
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error(transparent)]
  Sync(#[from] SyncError),

  #[error("store error")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  fn status(&self) -> StatusCode {
    match self {
      ApiError::Sync(e) => match e {
        SyncError::SourceUnavailable(_) => StatusCode::BAD_GATEWAY,
        SyncError::MalformedSourceEntry { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        SyncError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        SyncError::StaleSnapshot { .. } => StatusCode::CONFLICT,
        SyncError::InconsistentSnapshot(_)
        | SyncError::BatchRejected { .. }
        | SyncError::PartialApplication { .. } => StatusCode::INTERNAL_SERVER_ERROR,
      },
      ApiError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    let body = match self {
      ApiError::Sync(e) => {
        let retriable = e.is_retriable();
        let planned = e.planned();
        let chain = format!("{:#}", anyhow::Error::from(e));
        tracing::error!(error = %chain, "reconciliation run failed");
        json!({
          "error":     chain,
          "retriable": retriable,
          "planned":   planned,
        })
      }
      ApiError::Store(e) => json!({ "error": format!("{:#}", anyhow::anyhow!(e)) }),
    };
    (status, Json(body)).into_response()
  }
}
