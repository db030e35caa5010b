//! Server configuration, read from `config.toml` and `CURSOS__*` variables.

use std::path::{Path, PathBuf};

use cursos_api::{
  session::{DEFAULT_IDLE_TTL, DEFAULT_MAX_SESSIONS},
  state::DEFAULT_MAX_IMAGE_BYTES,
};
use cursos_capture::{gemini::GeminiConfig, registry::RegistryConfig};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:              String,
  #[serde(default = "default_port")]
  pub port:              u16,
  #[serde(default = "default_store_path")]
  pub store_path:        PathBuf,
  /// Origins allowed to post widget messages. Empty accepts any origin.
  #[serde(default)]
  pub allowed_origins:   Vec<String>,
  #[serde(default = "default_max_sessions")]
  pub max_sessions:      usize,
  /// Sessions untouched for this long are evicted.
  #[serde(default = "default_session_idle_secs")]
  pub session_idle_secs: u64,
  #[serde(default = "default_max_image_bytes")]
  pub max_image_bytes:   usize,
  pub gemini:            GeminiConfig,
  #[serde(default)]
  pub registry:          RegistryConfig,
}

fn default_host() -> String { "127.0.0.1".to_string() }

fn default_port() -> u16 { 8080 }

fn default_store_path() -> PathBuf { PathBuf::from("~/.local/share/cursos/preferences.db") }

fn default_max_sessions() -> usize { DEFAULT_MAX_SESSIONS }

fn default_session_idle_secs() -> u64 { DEFAULT_IDLE_TTL.as_secs() }

fn default_max_image_bytes() -> usize { DEFAULT_MAX_IMAGE_BYTES }

impl ServerConfig {
  /// Layer `path` (optional) under the `CURSOS` environment.
  pub fn load(path: &Path) -> Result<Self, config::ConfigError> {
    Self::from_sources(config::File::from(path).required(false))
  }

  fn from_sources<S>(file: S) -> Result<Self, config::ConfigError>
  where
    S: config::Source + Send + Sync + 'static,
  {
    config::Config::builder()
      .add_source(file)
      .add_source(
        config::Environment::with_prefix("CURSOS")
          .separator("__")
          .list_separator(",")
          .with_list_parse_key("allowed_origins")
          .try_parsing(true),
      )
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
