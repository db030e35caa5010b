//! Staged image uploads.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use bytes::Bytes;
use serde::Serialize;

use crate::{Error, ExtractionError, Result, model::InlineImage};

/// An image waiting to be sent to the model. The bytes are shared, so
/// cloning an upload never copies the payload.
#[derive(Debug, Clone)]
pub struct ImageUpload {
  bytes:      Bytes,
  media_type: String,
  file_name:  Option<String>,
}

/// What the UI shows about the staged image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageMeta {
  pub media_type: String,
  pub size:       usize,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub file_name:  Option<String>,
}

impl ImageUpload {
  /// Accept `bytes` only when `media_type` is an `image/*` type and the
  /// payload is non-empty.
  pub fn new(bytes: impl Into<Bytes>, media_type: &str) -> Result<Self> {
    let bytes = bytes.into();
    let media_type = normalise_media_type(media_type);
    if !is_image_media_type(&media_type) || bytes.is_empty() {
      return Err(Error::InvalidFileType { media_type });
    }
    Ok(Self { bytes, media_type, file_name: None })
  }

  /// Attach the name the file had on the visitor's device. Blank names are
  /// dropped.
  pub fn with_file_name(mut self, name: impl Into<String>) -> Self {
    let name = name.into();
    self.file_name = (!name.trim().is_empty()).then(|| name.trim().to_string());
    self
  }

  pub fn media_type(&self) -> &str { &self.media_type }

  pub fn file_name(&self) -> Option<&str> { self.file_name.as_deref() }

  pub fn len(&self) -> usize { self.bytes.len() }

  pub fn is_empty(&self) -> bool { self.bytes.is_empty() }

  pub fn meta(&self) -> ImageMeta {
    ImageMeta {
      media_type: self.media_type.clone(),
      size:       self.bytes.len(),
      file_name:  self.file_name.clone(),
    }
  }

  /// Base64-encode the payload on the blocking pool.
  pub async fn encode(&self) -> Result<InlineImage, ExtractionError> {
    let bytes = self.bytes.clone();
    let data = tokio::task::spawn_blocking(move || STANDARD.encode(&bytes))
      .await
      .map_err(|e| ExtractionError::Encode(e.to_string()))?;
    Ok(InlineImage { media_type: self.media_type.clone(), data })
  }
}

/// Lower-case and drop any parameters (`image/png; q=1` → `image/png`).
fn normalise_media_type(raw: &str) -> String {
  raw
    .split(';')
    .next()
    .unwrap_or_default()
    .trim()
    .to_ascii_lowercase()
}

pub fn is_image_media_type(media_type: &str) -> bool {
  media_type
    .strip_prefix("image/")
    .is_some_and(|sub| !sub.is_empty())
}
