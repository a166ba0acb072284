//! photoshare server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) and any
//! `PHOTOSHARE_*` environment variables, opens the SQLite store, and serves
//! the photo-sharing API over HTTP until Ctrl+C or SIGTERM.

use std::{path::PathBuf, process::ExitCode};

use anyhow::Context as _;
use clap::Parser;
use photoshare_server::{ServerConfig, app_state, open_store, router, shutdown_signal};
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Photo-sharing API server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  match run(Cli::parse()).await {
    Ok(()) => ExitCode::SUCCESS,
    Err(e) => {
      tracing::error!("{e:#}");
      ExitCode::FAILURE
    }
  }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("PHOTOSHARE").try_parsing(true))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let store = open_store(&server_cfg).await?;

  let state = app_state(store, &server_cfg).context("failed to build media relay")?;
  let app = router(state.clone(), &server_cfg);
  let address = server_cfg.address();

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

  // The router is gone, so this is the last handle to the store.
  match std::sync::Arc::try_unwrap(state.store) {
    Ok(store) => {
      store.close().await.context("failed to close database")?;
      tracing::info!("database closed");
    }
    Err(_) => tracing::warn!("store still shared at shutdown, leaving it to drop"),
  }

  Ok(())
}
