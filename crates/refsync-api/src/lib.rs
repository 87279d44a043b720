//! JSON REST API for refsync.
//!
//! Exposes an axum [`Router`] backed by a [`Syncer`] over any
//! [`RecordStore`] and an upstream [`Source`]. Auth, TLS, and transport
//! concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", refsync_api::api_router(syncer.clone(), source.clone()))
//! ```

pub mod error;
pub mod records;
pub mod sync;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use refsync_core::{Syncer, source::Source, store::RecordStore};

pub use error::ApiError;

/// Shared state threaded through all handlers.
pub struct AppState<S, P> {
  pub syncer: Arc<Syncer<S>>,
  pub source: Arc<P>,
}

impl<S, P> Clone for AppState<S, P> {
  fn clone(&self) -> Self {
    Self { syncer: self.syncer.clone(), source: self.source.clone() }
  }
}

/// Build a fully-materialised API router.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S, P>(syncer: Arc<Syncer<S>>, source: Arc<P>) -> Router<()>
where
  S: RecordStore + 'static,
  P: Source + 'static,
{
  Router::new()
    // Triggers
    .route("/sync", post(sync::pull::<S, P>))
    .route("/import", post(sync::import::<S, P>))
    // Reads
    .route("/records", get(records::list_all::<S, P>))
    .route("/records/active", get(records::list_active::<S, P>))
    .route("/health", get(records::health::<S, P>))
    .with_state(AppState { syncer, source })
}
