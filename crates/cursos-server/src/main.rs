//! cursos-server binary.
//!
//! Reads `config.toml` (or the path given with `--config`), opens the
//! SQLite preference store, and serves the capture API over HTTP.
//!
//! The Gemini key can come from the environment instead of the file:
//!
//! ```text
//! CURSOS__GEMINI__API_KEY=... cursos-server
//! ```

mod config;

use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::Context as _;
use clap::Parser;
use cursos_api::{AppState, SessionRegistry};
use cursos_capture::{gemini::GeminiModel, registry::RegistryClient};
use cursos_core::event::OriginPolicy;
use cursos_store_sqlite::SqlitePreferenceStore;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::config::{ServerConfig, expand_tilde};

const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Parser)]
#[command(author, version, about = "Cursos.vet capture server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let server_cfg =
    ServerConfig::load(&cli.config).context("failed to read server configuration")?;

  let store_path = expand_tilde(&server_cfg.store_path);
  if let Some(parent) = store_path.parent() {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {parent:?}"))?;
  }
  let preferences = SqlitePreferenceStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let timeout = Duration::from_secs(server_cfg.gemini.timeout_secs);
  let model = GeminiModel::new(server_cfg.gemini.clone())
    .context("failed to build the Gemini client")?;
  let idle_ttl = Duration::from_secs(server_cfg.session_idle_secs);
  let sessions = SessionRegistry::new(Arc::new(model))
    .with_timeout(timeout)
    .with_max_sessions(server_cfg.max_sessions)
    .with_idle_ttl(idle_ttl);

  let origins = OriginPolicy::new(&server_cfg.allowed_origins);
  if origins.is_open() {
    tracing::warn!("allowed_origins is empty; widget messages are accepted from any origin");
  }

  let mut state = AppState::new(sessions, Arc::new(preferences))
    .with_origins(origins)
    .with_max_image_bytes(server_cfg.max_image_bytes);
  if server_cfg.registry.enabled {
    let registry = RegistryClient::new(&server_cfg.registry)
      .context("failed to build the registry client")?;
    state = state.with_registry(registry);
    tracing::info!(url = %server_cfg.registry.base_url, "CRMV lookup enabled");
  }

  // Idle sessions are also swept below the cap.
  let sweeper = state.sessions.clone();
  tokio::spawn(async move {
    let mut tick = tokio::time::interval(SWEEP_INTERVAL.min(idle_ttl).max(Duration::from_secs(1)));
    loop {
      tick.tick().await;
      sweeper.evict_idle().await;
    }
  });

  let app = cursos_api::api_router(state).layer(TraceLayer::new_for_http());
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!(model = %server_cfg.gemini.model, "Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}
