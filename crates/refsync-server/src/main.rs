//! refsync server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), opens the
//! SQLite record store, and either serves the JSON API or runs one
//! reconciliation from the command line.
//!
//! ```text
//! refsync serve
//! refsync sync
//! refsync import entities.json
//! ```

use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use refsync_core::{Syncer, source::SourceEntry};
use refsync_server::{HttpSource, ServerConfig, expand_tilde};
use refsync_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Reconcile an upstream reference list into a versioned store")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Serve the JSON API.
  Serve,
  /// Pull the upstream list once, reconcile, and print the result.
  Sync,
  /// Reconcile a JSON array of `{"id": .., "name": ..}` read from FILE.
  Import { file: PathBuf },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let cfg = ServerConfig::load(&cli.config).context("failed to load configuration")?;

  let store_path = expand_tilde(&cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let syncer = Arc::new(Syncer::new(Arc::new(store)));
  let source = Arc::new(
    HttpSource::new(&cfg.source_url, Duration::from_secs(cfg.source_timeout_secs))
      .context("failed to build HTTP client")?,
  );

  match cli.command {
    Command::Serve => {
      let app = axum::Router::new()
        .nest("/api", refsync_api::api_router(syncer, source))
        .layer(TraceLayer::new_for_http());
      let address = format!("{}:{}", cfg.host, cfg.port);

      tracing::info!("Listening on http://{address}");
      let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;
      axum::serve(listener, app).await.context("server error")?;
    }
    Command::Sync => {
      anyhow::ensure!(!cfg.source_url.is_empty(), "source_url is not configured");
      let result = syncer.pull(source.as_ref()).await.context("sync failed")?;
      println!("{}", serde_json::to_string_pretty(&result)?);
    }
    Command::Import { file } => {
      let raw = tokio::fs::read_to_string(&file)
        .await
        .with_context(|| format!("reading {}", file.display()))?;
      let entries: Vec<SourceEntry> =
        serde_json::from_str(&raw).context("parsing import file")?;
      let result = syncer.import(entries).await.context("import failed")?;
      println!("{}", serde_json::to_string_pretty(&result)?);
    }
  }

  Ok(())
}
