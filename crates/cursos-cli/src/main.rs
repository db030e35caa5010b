//! `cursos`: command-line client for the Cursos.vet capture server.
//!
//! # Usage
//!
//! ```text
//! cursos capture --name "Jane Doe" --email jane@example.com --phone 11999990000 --image rg.jpg
//! cursos theme set dark
//! cursos --url http://localhost:8080 crmv "SP 12345"
//! ```

mod client;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use client::{ApiClient, ApiConfig, ContactReply, ExtractReply};
use cursos_core::{preference::DisplayMode, validation::ContactForm};
use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

const DEFAULT_URL: &str = "http://localhost:8080";

/// Must exceed the server-side extraction timeout.
const DEFAULT_TIMEOUT_SECS: u64 = 90;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "cursos", about = "Client for the Cursos.vet capture server")]
struct Args {
  /// Path to a TOML config file (url, timeout_secs).
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Base URL of the server (default: http://localhost:8080).
  #[arg(long, env = "CURSOS_URL")]
  url: Option<String>,

  /// Request timeout in seconds.
  #[arg(long, env = "CURSOS_TIMEOUT")]
  timeout: Option<u64>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Save contact details, then read an identity document photo.
  Capture {
    #[arg(long)]
    name:       String,
    #[arg(long)]
    email:      String,
    #[arg(long)]
    phone:      String,
    /// Photo of a CNH or RG. Omit to stop after the contact step.
    #[arg(long)]
    image:      Option<PathBuf>,
    /// Media type of the photo; guessed from the extension otherwise.
    #[arg(long)]
    media_type: Option<String>,
  },
  /// Look up a CRMV registration number.
  Crmv { number: String },
  /// Show or change the display mode.
  Theme {
    /// `light` or `dark`; omit to print the current mode.
    #[arg(value_parser = parse_mode)]
    mode: Option<DisplayMode>,
  },
}

fn parse_mode(s: &str) -> Result<DisplayMode, String> {
  s.parse().map_err(|e| format!("{e}"))
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default, Debug)]
struct ConfigFile {
  #[serde(default)]
  url:          String,
  #[serde(default)]
  timeout_secs: Option<u64>,
}

/// Flags and env override the config file, which overrides defaults.
fn resolve(url: Option<String>, timeout: Option<u64>, file: &ConfigFile) -> ApiConfig {
  ApiConfig {
    base_url:     url
      .or_else(|| (!file.url.is_empty()).then(|| file.url.clone()))
      .unwrap_or_else(|| DEFAULT_URL.to_string()),
    timeout_secs: timeout.or(file.timeout_secs).unwrap_or(DEFAULT_TIMEOUT_SECS),
  }
}

/// Guess an image media type from the file extension. Unknown extensions
/// are sent as-is and left for the server to reject.
fn guess_media_type(path: &Path) -> &'static str {
  let ext = path
    .extension()
    .and_then(|e| e.to_str())
    .map(str::to_ascii_lowercase)
    .unwrap_or_default();
  match ext.as_str() {
    "jpg" | "jpeg" => "image/jpeg",
    "png" => "image/png",
    "webp" => "image/webp",
    "gif" => "image/gif",
    "heic" => "image/heic",
    "pdf" => "application/pdf",
    _ => "application/octet-stream",
  }
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let args = Args::parse();

  let file_cfg: ConfigFile = if let Some(path) = &args.config {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };

  let client = ApiClient::new(resolve(args.url, args.timeout, &file_cfg))?;

  match args.command {
    Command::Capture { name, email, phone, image, media_type } => {
      let form = ContactForm::new(name, email, phone);
      capture(&client, &form, image.as_deref(), media_type.as_deref()).await
    }
    Command::Crmv { number } => {
      let session = client.create_session().await?;
      let verified = client.verify_registration(session, &number).await;
      client.delete_session(session).await.ok();
      let verified = verified?;
      println!("{}: {}", verified.status, verified.message);
      Ok(())
    }
    Command::Theme { mode: Some(mode) } => {
      client.set_display_mode(mode).await?;
      println!("{mode}");
      Ok(())
    }
    Command::Theme { mode: None } => {
      println!("{}", client.display_mode().await?);
      Ok(())
    }
  }
}

/// Run one capture in a fresh session and print the resulting profile.
/// The session is removed afterwards whether or not the capture succeeded.
async fn capture(
  client: &ApiClient,
  form: &ContactForm,
  image: Option<&Path>,
  media_type: Option<&str>,
) -> Result<()> {
  let session = client.create_session().await?;
  tracing::debug!(%session, "session opened");
  let result = run_capture(client, session, form, image, media_type).await;
  if let Err(e) = client.delete_session(session).await {
    tracing::warn!(error = %e, "failed to close session");
  }
  result
}

async fn run_capture(
  client: &ApiClient,
  session: uuid::Uuid,
  form: &ContactForm,
  image: Option<&Path>,
  media_type: Option<&str>,
) -> Result<()> {
  let mut profile = match client.save_contact(session, form).await? {
    ContactReply::Saved(profile) => profile,
    ContactReply::Rejected(fields) => {
      for message in [fields.name, fields.email, fields.phone].into_iter().flatten() {
        eprintln!("{message}");
      }
      bail!("contact details were rejected");
    }
  };

  if let Some(path) = image {
    let bytes = std::fs::read(path)
      .with_context(|| format!("reading image {}", path.display()))?;
    let media_type = media_type.unwrap_or_else(|| guess_media_type(path));
    let file_name = path.file_name().and_then(|n| n.to_str());
    client.upload_image(session, bytes, media_type, file_name).await?;

    match client.extract(session).await? {
      ExtractReply::Extracted(extracted) => {
        tracing::debug!(result = ?extracted.result, "document read");
        profile = extracted.profile;
      }
      ExtractReply::NothingStaged => bail!("the server had no image to read"),
    }
  }

  println!("{}", serde_json::to_string_pretty(&profile)?);
  Ok(())
}
