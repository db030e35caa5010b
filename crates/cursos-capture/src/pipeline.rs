//! The document extraction pipeline.
//!
//! ```text
//! Idle -> submit_image -> ImageStaged -> extract -> Extracting -> Extracted
//!                                                   Extracting -> Error
//! any phase -> reset -> Idle
//! ```
//!
//! The pipeline is shared by reference. Its lock is only held between
//! awaits, never across the model call; a generation counter makes replies
//! that arrive after a reset or a newer image into no-ops.

use std::{
  sync::{Arc, Mutex, MutexGuard},
  time::Duration,
};

use bytes::Bytes;
use cursos_core::{
  profile::{ExtractionResult, ProfilePatch},
  store::ProfileStore,
};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
  ExtractionError, Result,
  error::{EXTRACTION_FAILED, INVALID_FILE_TYPE},
  image::{ImageMeta, ImageUpload},
  model::DocumentModel,
  prompt::EXTRACTION_PROMPT,
  reply::parse_reply,
};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

// ─── Observable state ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
  #[default]
  Idle,
  ImageStaged,
  Extracting,
  Extracted,
  Error,
}

/// Snapshot of the pipeline for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineView {
  pub phase:  Phase,
  pub image:  Option<ImageMeta>,
  pub result: Option<ExtractionResult>,
  pub error:  Option<String>,
}

/// What a call to [`ExtractionPipeline::extract`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractOutcome {
  /// Nothing staged; no model call was made.
  NoPendingImage,
  /// Another extraction is in flight; no model call was made.
  AlreadyRunning,
  /// The reply parsed and was merged into the profile.
  Extracted(ExtractionResult),
  /// The call failed; the message is the one shown to the visitor.
  Failed(String),
  /// The pipeline was reset or given a new image while the call was in
  /// flight; the reply was dropped.
  Superseded,
}

// ─── Pipeline ────────────────────────────────────────────────────────────────

#[derive(Default)]
struct Inner {
  image:      Option<ImageUpload>,
  phase:      Phase,
  result:     Option<ExtractionResult>,
  error:      Option<String>,
  generation: u64,
}

pub struct ExtractionPipeline<M> {
  model:   Arc<M>,
  store:   Arc<dyn ProfileStore>,
  timeout: Duration,
  inner:   Mutex<Inner>,
}

fn lock(inner: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
  match inner.lock() {
    Ok(g) => g,
    Err(poisoned) => poisoned.into_inner(),
  }
}

impl<M: DocumentModel> ExtractionPipeline<M> {
  pub fn new(model: Arc<M>, store: Arc<dyn ProfileStore>) -> Self {
    Self {
      model,
      store,
      timeout: DEFAULT_TIMEOUT,
      inner: Mutex::new(Inner::default()),
    }
  }

  /// Upper bound on one model call.
  pub fn with_timeout(mut self, timeout: Duration) -> Self {
    self.timeout = timeout;
    self
  }

  pub fn view(&self) -> PipelineView {
    let inner = lock(&self.inner);
    PipelineView {
      phase:  inner.phase,
      image:  inner.image.as_ref().map(ImageUpload::meta),
      result: inner.result.clone(),
      error:  inner.error.clone(),
    }
  }

  pub fn phase(&self) -> Phase { lock(&self.inner).phase }

  /// Stage an image for extraction.
  ///
  /// A non-image is refused before anything else happens; the previously
  /// staged image (if any) stays in place and the refusal is shown as the
  /// current error.
  pub fn submit_image(
    &self,
    bytes: impl Into<Bytes>,
    media_type: &str,
  ) -> Result<ImageMeta> {
    self.submit_named_image(bytes, media_type, None)
  }

  /// [`Self::submit_image`] carrying the original file name for display.
  pub fn submit_named_image(
    &self,
    bytes: impl Into<Bytes>,
    media_type: &str,
    file_name: Option<&str>,
  ) -> Result<ImageMeta> {
    let mut inner = lock(&self.inner);
    let upload = match ImageUpload::new(bytes, media_type) {
      Ok(u) => match file_name {
        Some(name) => u.with_file_name(name),
        None => u,
      },
      Err(e) => {
        inner.error = Some(INVALID_FILE_TYPE.to_string());
        return Err(e);
      }
    };
    let meta = upload.meta();
    inner.generation += 1;
    inner.image = Some(upload);
    inner.phase = Phase::ImageStaged;
    inner.result = None;
    inner.error = None;
    debug!(media_type = %meta.media_type, size = meta.size, "document image staged");
    Ok(meta)
  }

  /// Clear the staged image, result and error. Any call in flight is
  /// superseded.
  pub fn reset(&self) {
    let mut inner = lock(&self.inner);
    let generation = inner.generation + 1;
    *inner = Inner { generation, ..Inner::default() };
  }

  /// Send the staged image to the model and merge the parsed fields.
  ///
  /// Every call makes a fresh request; the staged image is kept afterwards
  /// so a failed or doubtful read can be retried.
  pub async fn extract(&self) -> ExtractOutcome {
    let (image, generation) = {
      let mut inner = lock(&self.inner);
      if inner.phase == Phase::Extracting {
        return ExtractOutcome::AlreadyRunning;
      }
      let Some(image) = inner.image.clone() else {
        return ExtractOutcome::NoPendingImage;
      };
      inner.phase = Phase::Extracting;
      inner.result = None;
      inner.error = None;
      (image, inner.generation)
    };

    let mut in_flight = InFlight { inner: &self.inner, generation, armed: true };
    let outcome = self.run(&image).await;
    in_flight.armed = false;

    let mut inner = lock(&self.inner);
    if inner.generation != generation {
      debug!("dropping extraction reply for a superseded image");
      return ExtractOutcome::Superseded;
    }

    match outcome {
      Ok(result) => {
        self.store.merge_profile(ProfilePatch::document(result.clone()));
        info!(
          model = self.model.name(),
          document_type = result.document_type.as_deref().unwrap_or("-"),
          "document fields extracted"
        );
        inner.phase = Phase::Extracted;
        inner.result = Some(result.clone());
        ExtractOutcome::Extracted(result)
      }
      Err(e) => {
        warn!(model = self.model.name(), error = %e, "document extraction failed");
        inner.phase = Phase::Error;
        inner.error = Some(EXTRACTION_FAILED.to_string());
        ExtractOutcome::Failed(EXTRACTION_FAILED.to_string())
      }
    }
  }

  async fn run(
    &self,
    image: &ImageUpload,
  ) -> Result<ExtractionResult, ExtractionError> {
    let inline = image.encode().await?;
    let reply = tokio::time::timeout(
      self.timeout,
      self.model.generate(EXTRACTION_PROMPT, &inline),
    )
    .await
    .map_err(|_| ExtractionError::Timeout(self.timeout))?
    .map_err(|e| ExtractionError::Model(Box::new(e)))?;
    parse_reply(&reply)
  }
}

/// Puts the pipeline back to `ImageStaged` if an `extract` future is dropped
/// before it finishes, so a cancelled request cannot wedge it in
/// `Extracting`.
struct InFlight<'a> {
  inner:      &'a Mutex<Inner>,
  generation: u64,
  armed:      bool,
}

impl Drop for InFlight<'_> {
  fn drop(&mut self) {
    if !self.armed {
      return;
    }
    let mut inner = lock(self.inner);
    if inner.generation == self.generation && inner.phase == Phase::Extracting {
      inner.phase = Phase::ImageStaged;
    }
  }
}
