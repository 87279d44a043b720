//! [`HttpSource`] — pulls the upstream list from a JSON endpoint.

use std::time::Duration;

use refsync_core::source::{Source, SourceEntry};
use reqwest::{Client, StatusCode};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HttpSourceError {
  #[error("request to upstream failed")]
  Request(#[from] reqwest::Error),

  #[error("upstream answered {0}")]
  Status(StatusCode),
}

/// Fetches `GET <url>` and expects a JSON array of `{"id": .., "name": ..}`.
///
/// Cheap to clone — the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct HttpSource {
  client: Client,
  url:    String,
}

impl HttpSource {
  pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, HttpSourceError> {
    let client = Client::builder().timeout(timeout).build()?;
    Ok(Self { client, url: url.into() })
  }
}

impl Source for HttpSource {
  type Error = HttpSourceError;

  async fn fetch(&self) -> Result<Vec<SourceEntry>, Self::Error> {
    let resp = self.client.get(&self.url).send().await?;
    if !resp.status().is_success() {
      return Err(HttpSourceError::Status(resp.status()));
    }
    // A `null` body is treated as an empty list.
    let entries: Option<Vec<SourceEntry>> = resp.json().await?;
    let entries = entries.unwrap_or_default();
    tracing::debug!(url = %self.url, count = entries.len(), "fetched upstream list");
    Ok(entries)
  }
}
