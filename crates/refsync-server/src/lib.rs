//! Server-side wiring for refsync: configuration and the HTTP upstream
//! source.

pub mod http_source;

pub use http_source::{HttpSource, HttpSourceError};

use std::path::{Path, PathBuf};

use serde::Deserialize;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime configuration, deserialised from `config.toml` and `REFSYNC_*`
/// environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:                String,
  pub port:                u16,
  pub store_path:          PathBuf,
  /// Endpoint returning the upstream list as a JSON array of `{id, name}`.
  /// Only the pull trigger needs it.
  #[serde(default)]
  pub source_url:          String,
  #[serde(default = "default_source_timeout")]
  pub source_timeout_secs: u64,
}

fn default_source_timeout() -> u64 { 30 }

impl ServerConfig {
  /// Layer the optional TOML file at `path` under the environment.
  pub fn load(path: &Path) -> Result<Self, config::ConfigError> {
    config::Config::builder()
      .set_default("host", "127.0.0.1")?
      .set_default("port", 8080)?
      .set_default("store_path", "refsync.db")?
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("REFSYNC"))
      .build()?
      .try_deserialize()
  }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
