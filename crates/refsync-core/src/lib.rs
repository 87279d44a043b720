//! Core types, ports and the reconciliation engine for refsync.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Storage backends implement [`store::RecordStore`]; upstream fetchers
//! implement [`source::Source`]. Everything between the two lives here.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod apply;
pub mod error;
pub mod memory;
pub mod reconcile;
pub mod record;
pub mod report;
pub mod snapshot;
pub mod source;
pub mod store;
pub mod sync;

pub use error::{Error, Result};
pub use memory::MemoryStore;
pub use report::SyncResult;
pub use sync::Syncer;

#[cfg(test)]
mod tests;
