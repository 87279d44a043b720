//! The source port: where the authoritative upstream list comes from.

use std::future::Future;

use serde::{Deserialize, Deserializer, Serialize, de::IgnoredAny};

use crate::{
  Error, Result,
  record::ExternalId,
};

// ─── Wire shape ──────────────────────────────────────────────────────────────

/// One upstream entry exactly as it arrives, `{"id": 1, "name": "North"}`.
///
/// `id` is optional here so that a missing or unusable id can be reported as
/// [`Error::MalformedSourceEntry`] instead of a generic parse failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceEntry {
  #[serde(default, deserialize_with = "lenient_id")]
  pub id:   Option<i64>,
  pub name: String,
}

impl SourceEntry {
  pub fn new(id: i64, name: impl Into<String>) -> Self {
    Self { id: Some(id), name: name.into() }
  }
}

/// Anything that is not an integer in `i64` range decodes to `None`: strings,
/// floats, out-of-range numbers and `null`.
fn lenient_id<'de, D: Deserializer<'de>>(de: D) -> Result<Option<i64>, D::Error> {
  #[derive(Deserialize)]
  #[serde(untagged)]
  enum RawId {
    Int(i64),
    Other(IgnoredAny),
  }

  Ok(match RawId::deserialize(de)? {
    RawId::Int(id) => Some(id),
    RawId::Other(_) => None,
  })
}

/// A validated upstream entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalEntry {
  pub external_id: ExternalId,
  pub name:        String,
}

/// Validate a whole upstream payload. Fails closed on the first entry without
/// an id; no entry is skipped.
pub fn validate(entries: Vec<SourceEntry>) -> Result<Vec<ExternalEntry>> {
  entries
    .into_iter()
    .enumerate()
    .map(|(index, entry)| match entry.id {
      Some(id) => Ok(ExternalEntry { external_id: ExternalId(id), name: entry.name }),
      None => Err(Error::MalformedSourceEntry { index }),
    })
    .collect()
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Supplies the authoritative upstream list.
///
/// Implemented by the HTTP fetcher in `refsync-server` and by
/// [`StaticSource`] for lists supplied directly by a caller.
pub trait Source: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Fetch the complete current list. Order is preserved.
  fn fetch(
    &self,
  ) -> impl Future<Output = Result<Vec<SourceEntry>, Self::Error>> + Send + '_;
}

/// A source that always yields the same in-memory list.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
  entries: Vec<SourceEntry>,
}

impl StaticSource {
  pub fn new(entries: Vec<SourceEntry>) -> Self { Self { entries } }
}

impl Source for StaticSource {
  type Error = std::convert::Infallible;

  async fn fetch(&self) -> Result<Vec<SourceEntry>, Self::Error> {
    Ok(self.entries.clone())
  }
}
