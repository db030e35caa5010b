//! Google Gemini `generateContent` client.
//!
//! Sends the instruction and one inline image, returns the concatenated text
//! parts of the first candidate.

use std::{future::Future, time::Duration};

use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::model::{DocumentModel, InlineImage};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

// ─── Configuration ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct GeminiConfig {
  pub api_key:      String,
  #[serde(default = "default_model")]
  pub model:        String,
  #[serde(default = "default_base_url")]
  pub base_url:     String,
  /// Transport-level timeout for one request.
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
}

fn default_model() -> String { DEFAULT_MODEL.to_string() }

fn default_base_url() -> String { DEFAULT_BASE_URL.to_string() }

fn default_timeout_secs() -> u64 { 60 }

impl GeminiConfig {
  pub fn new(api_key: impl Into<String>) -> Self {
    Self {
      api_key:      api_key.into(),
      model:        default_model(),
      base_url:     default_base_url(),
      timeout_secs: default_timeout_secs(),
    }
  }

  pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
    self.base_url = url.into();
    self
  }
}

// ─── Errors ──────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum GeminiError {
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("gemini returned {status}: {body}")]
  Status { status: u16, body: String },

  #[error("gemini blocked the request: {0}")]
  Blocked(String),

  #[error("gemini returned no text")]
  NoText,
}

// ─── Wire types ──────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct GenerateRequest<'a> {
  contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
  parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part<'a> {
  Text { text: &'a str },
  Inline { inline_data: InlineData<'a> },
}

#[derive(Serialize)]
struct InlineData<'a> {
  mime_type: &'a str,
  data:      &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
  #[serde(default)]
  candidates:      Vec<Candidate>,
  prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
struct Candidate {
  content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
  #[serde(default)]
  parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
  text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
  block_reason: Option<String>,
}

impl GenerateResponse {
  fn into_text(self) -> Result<String, GeminiError> {
    if let Some(reason) = self.prompt_feedback.and_then(|f| f.block_reason) {
      return Err(GeminiError::Blocked(reason));
    }
    let text: String = self
      .candidates
      .into_iter()
      .next()
      .and_then(|c| c.content)
      .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
      .unwrap_or_default();
    if text.is_empty() {
      return Err(GeminiError::NoText);
    }
    Ok(text)
  }
}

// ─── Client ──────────────────────────────────────────────────────────────────

/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct GeminiModel {
  client: Client,
  config: GeminiConfig,
}

impl GeminiModel {
  pub fn new(config: GeminiConfig) -> Result<Self, GeminiError> {
    let client = Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()?;
    Ok(Self { client, config })
  }

  fn url(&self) -> String {
    format!(
      "{}/models/{}:generateContent",
      self.config.base_url.trim_end_matches('/'),
      self.config.model
    )
  }

  async fn generate_content(
    &self,
    prompt: &str,
    image: &InlineImage,
  ) -> Result<String, GeminiError> {
    let body = GenerateRequest {
      contents: vec![Content {
        parts: vec![
          Part::Text { text: prompt },
          Part::Inline {
            inline_data: InlineData {
              mime_type: &image.media_type,
              data:      &image.data,
            },
          },
        ],
      }],
    };

    debug!(
      model = %self.config.model,
      media_type = %image.media_type,
      "sending generateContent request"
    );

    let resp = self
      .client
      .post(self.url())
      .header("x-goog-api-key", &self.config.api_key)
      .json(&body)
      .send()
      .await?;

    let status = resp.status();
    if !status.is_success() {
      let body = resp.text().await.unwrap_or_default();
      return Err(GeminiError::Status { status: status.as_u16(), body });
    }

    let parsed: GenerateResponse = resp.json().await?;
    parsed.into_text()
  }
}

impl DocumentModel for GeminiModel {
  type Error = GeminiError;

  fn name(&self) -> &str { &self.config.model }

  fn generate<'a>(
    &'a self,
    prompt: &'a str,
    image: &'a InlineImage,
  ) -> impl Future<Output = Result<String, GeminiError>> + Send + 'a {
    self.generate_content(prompt, image)
  }
}
