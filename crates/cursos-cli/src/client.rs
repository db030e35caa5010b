//! Async HTTP client wrapping the cursos JSON API.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use cursos_core::{
  preference::DisplayMode,
  profile::{ExtractionResult, UserProfile},
  validation::{ContactForm, FieldErrors},
};
use reqwest::{Client, Response, StatusCode, header};
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

/// Connection settings for the cursos API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url:     String,
  pub timeout_secs: u64,
}

/// Async HTTP client for the cursos JSON REST API.
#[derive(Clone)]
pub struct ApiClient {
  client: Client,
  config: ApiConfig,
}

#[derive(Debug, Deserialize)]
pub struct SessionInfo {
  pub session_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct Extracted {
  pub result:  ExtractionResult,
  pub profile: UserProfile,
}

/// What `POST /sessions/{id}/document/extract` answered.
#[derive(Debug)]
pub enum ExtractReply {
  Extracted(Box<Extracted>),
  NothingStaged,
}

/// Outcome of `PUT /sessions/{id}/contact`.
#[derive(Debug)]
pub enum ContactReply {
  Saved(UserProfile),
  Rejected(FieldErrors),
}

#[derive(Debug, Deserialize)]
struct ProfileBody {
  profile: UserProfile,
}

#[derive(Debug, Deserialize)]
struct ModeBody {
  mode: DisplayMode,
}

#[derive(Debug, Deserialize)]
pub struct Verified {
  pub status:  String,
  pub message: String,
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, config })
  }

  fn url(&self, path: &str) -> String {
    format!("{}/api{}", self.config.base_url.trim_end_matches('/'), path)
  }

  // ── Sessions ──────────────────────────────────────────────────────────────

  /// `POST /api/sessions`
  pub async fn create_session(&self) -> Result<Uuid> {
    let resp = self
      .client
      .post(self.url("/sessions"))
      .send()
      .await
      .context("POST /sessions failed")?;
    let info: SessionInfo = expect_success(resp, "POST /sessions")
      .await?
      .json()
      .await
      .context("deserialising session")?;
    Ok(info.session_id)
  }

  /// `DELETE /api/sessions/{id}`
  pub async fn delete_session(&self, id: Uuid) -> Result<()> {
    let resp = self
      .client
      .delete(self.url(&format!("/sessions/{id}")))
      .send()
      .await
      .context("DELETE /sessions failed")?;
    expect_success(resp, "DELETE /sessions").await?;
    Ok(())
  }

  // ── Capture ───────────────────────────────────────────────────────────────

  /// `PUT /api/sessions/{id}/contact`
  pub async fn save_contact(&self, id: Uuid, form: &ContactForm) -> Result<ContactReply> {
    let resp = self
      .client
      .put(self.url(&format!("/sessions/{id}/contact")))
      .json(form)
      .send()
      .await
      .context("PUT /contact failed")?;

    if resp.status() == StatusCode::UNPROCESSABLE_ENTITY {
      let body: Value = resp.json().await.context("deserialising field errors")?;
      let fields = serde_json::from_value(body["fields"].clone())
        .context("deserialising field errors")?;
      return Ok(ContactReply::Rejected(fields));
    }
    let body: ProfileBody = expect_success(resp, "PUT /contact")
      .await?
      .json()
      .await
      .context("deserialising saved contact")?;
    Ok(ContactReply::Saved(body.profile))
  }

  /// `PUT /api/sessions/{id}/document/image`
  pub async fn upload_image(
    &self,
    id: Uuid,
    bytes: Vec<u8>,
    media_type: &str,
    file_name: Option<&str>,
  ) -> Result<()> {
    let mut req = self
      .client
      .put(self.url(&format!("/sessions/{id}/document/image")))
      .header(header::CONTENT_TYPE, media_type);
    if let Some(name) = file_name {
      req = req.header("x-file-name", name);
    }
    let resp = req
      .body(bytes)
      .send()
      .await
      .context("PUT /document/image failed")?;
    expect_success(resp, "PUT /document/image").await?;
    Ok(())
  }

  /// `POST /api/sessions/{id}/document/extract`
  pub async fn extract(&self, id: Uuid) -> Result<ExtractReply> {
    let resp = self
      .client
      .post(self.url(&format!("/sessions/{id}/document/extract")))
      .send()
      .await
      .context("POST /document/extract failed")?;
    if resp.status() == StatusCode::NO_CONTENT {
      return Ok(ExtractReply::NothingStaged);
    }
    let body: Extracted = expect_success(resp, "POST /document/extract")
      .await?
      .json()
      .await
      .context("deserialising extraction")?;
    Ok(ExtractReply::Extracted(Box::new(body)))
  }

  /// `POST /api/sessions/{id}/registration`
  pub async fn verify_registration(&self, id: Uuid, crmv: &str) -> Result<Verified> {
    let resp = self
      .client
      .post(self.url(&format!("/sessions/{id}/registration")))
      .json(&json!({ "crmv": crmv }))
      .send()
      .await
      .context("POST /registration failed")?;
    expect_success(resp, "POST /registration")
      .await?
      .json()
      .await
      .context("deserialising registry status")
  }

  // ── Preferences ───────────────────────────────────────────────────────────

  /// `GET /api/preferences/display-mode`
  pub async fn display_mode(&self) -> Result<DisplayMode> {
    let resp = self
      .client
      .get(self.url("/preferences/display-mode"))
      .send()
      .await
      .context("GET /preferences/display-mode failed")?;
    let body: ModeBody = expect_success(resp, "GET /preferences/display-mode")
      .await?
      .json()
      .await
      .context("deserialising display mode")?;
    Ok(body.mode)
  }

  /// `PUT /api/preferences/display-mode`
  pub async fn set_display_mode(&self, mode: DisplayMode) -> Result<()> {
    let resp = self
      .client
      .put(self.url("/preferences/display-mode"))
      .json(&json!({ "mode": mode }))
      .send()
      .await
      .context("PUT /preferences/display-mode failed")?;
    expect_success(resp, "PUT /preferences/display-mode").await?;
    Ok(())
  }
}

/// Pass `resp` through when it succeeded; otherwise turn the server's
/// `{"error": ...}` body into an error.
async fn expect_success(resp: Response, what: &str) -> Result<Response> {
  let status = resp.status();
  if status.is_success() {
    return Ok(resp);
  }
  let message = resp
    .json::<Value>()
    .await
    .ok()
    .and_then(|v| v["error"].as_str().map(str::to_string))
    .unwrap_or_else(|| status.to_string());
  Err(anyhow!("{what} → {status}: {message}"))
}
