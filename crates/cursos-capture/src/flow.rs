//! The profile capture flow: contact form first, then the document modal.
//!
//! One [`CaptureFlow`] stands for one visitor. It owns the visitor's
//! profile store, the open/closed state of both modals and the extraction
//! pipeline, and it is the only place the chat-widget signals are applied.

use std::sync::{Arc, Mutex, MutexGuard};

use bytes::Bytes;
use cursos_core::{
  event::{OriginPolicy, WidgetEvent},
  profile::UserProfile,
  store::ProfileStore,
  validation::ContactForm,
};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::{
  Error, Result,
  image::ImageMeta,
  model::DocumentModel,
  pipeline::{ExtractOutcome, ExtractionPipeline, PipelineView},
};

// ─── Modal state ─────────────────────────────────────────────────────────────

/// How the contact form opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FormMode {
  /// Fields are editable; used while contact data is incomplete.
  Edit,
  /// Read-only review of data already on file.
  View,
}

/// What the caller should show after a successful save.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NextStep {
  OpenDocumentModal,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ModalState {
  /// `Some` while the contact form is open.
  pub contact_form:        Option<FormMode>,
  pub document_modal_open: bool,
}

/// Result of [`CaptureFlow::save_contact_info`].
#[derive(Debug, Clone, Serialize)]
pub struct SavedContact {
  pub profile: UserProfile,
  pub next:    NextStep,
}

// ─── Flow ────────────────────────────────────────────────────────────────────

pub struct CaptureFlow<M> {
  store:    Arc<dyn ProfileStore>,
  pipeline: ExtractionPipeline<M>,
  modals:   Mutex<ModalState>,
}

impl<M: DocumentModel> CaptureFlow<M> {
  /// Build a flow around an injected store and an already-configured
  /// pipeline writing to that same store.
  pub fn new(store: Arc<dyn ProfileStore>, pipeline: ExtractionPipeline<M>) -> Self {
    Self { store, pipeline, modals: Mutex::new(ModalState::default()) }
  }

  fn modals_mut(&self) -> MutexGuard<'_, ModalState> {
    match self.modals.lock() {
      Ok(g) => g,
      Err(poisoned) => poisoned.into_inner(),
    }
  }

  pub fn profile(&self) -> UserProfile { self.store.snapshot() }

  pub fn modals(&self) -> ModalState { *self.modals_mut() }

  pub fn document_view(&self) -> PipelineView { self.pipeline.view() }

  // ── Contact form ──────────────────────────────────────────────────────────

  /// Open the contact form: editable when any contact field is missing,
  /// read-only otherwise.
  pub fn request_profile_capture(&self) -> FormMode {
    let mode = if self.store.snapshot().has_contact_info() {
      FormMode::View
    } else {
      FormMode::Edit
    };
    self.modals_mut().contact_form = Some(mode);
    debug!(?mode, "contact form opened");
    mode
  }

  pub fn close_contact_form(&self) {
    self.modals_mut().contact_form = None;
  }

  /// Validate and store the contact fields, then hand over to the document
  /// modal. Nothing is written when validation fails.
  pub fn save_contact_info(&self, form: &ContactForm) -> Result<SavedContact> {
    let info = form.validate().map_err(Error::Validation)?;
    let profile = self.store.merge_profile(info.into());
    {
      let mut modals = self.modals_mut();
      modals.contact_form = None;
      modals.document_modal_open = true;
    }
    info!("contact info saved; opening document modal");
    Ok(SavedContact { profile, next: NextStep::OpenDocumentModal })
  }

  // ── Document modal ────────────────────────────────────────────────────────

  pub fn open_document_modal(&self) {
    self.modals_mut().document_modal_open = true;
  }

  /// Close the modal and discard whatever it was working on.
  pub fn close_document_modal(&self) {
    self.modals_mut().document_modal_open = false;
    self.pipeline.reset();
  }

  fn require_document_modal(&self) -> Result<()> {
    if self.modals_mut().document_modal_open {
      Ok(())
    } else {
      Err(Error::ModalClosed)
    }
  }

  pub fn submit_image(
    &self,
    bytes: impl Into<Bytes>,
    media_type: &str,
    file_name: Option<&str>,
  ) -> Result<ImageMeta> {
    self.require_document_modal()?;
    self.pipeline.submit_named_image(bytes, media_type, file_name)
  }

  pub async fn extract(&self) -> Result<ExtractOutcome> {
    self.require_document_modal()?;
    Ok(self.pipeline.extract().await)
  }

  pub fn reset_document(&self) { self.pipeline.reset(); }

  // ── Widget signals ────────────────────────────────────────────────────────

  pub fn handle_event(&self, event: WidgetEvent) {
    match event {
      WidgetEvent::OpenModal { user_data } => {
        if let Some(seed) = user_data {
          let patch = seed.into_patch();
          if !patch.is_empty() {
            self.store.merge_profile(patch);
          }
        }
        self.open_document_modal();
        info!("document modal opened by widget");
      }
      WidgetEvent::CloseModal => {
        self.close_document_modal();
        info!("document modal closed by widget");
      }
    }
  }

  /// Apply a raw posted message if its sender and shape are acceptable.
  /// Returns whether anything happened.
  pub fn handle_message(
    &self,
    message: &Value,
    origin: Option<&str>,
    policy: &OriginPolicy,
  ) -> bool {
    if !policy.permits(origin) {
      warn!(origin = origin.unwrap_or("<none>"), "ignoring widget message from disallowed origin");
      return false;
    }
    match WidgetEvent::from_message(message) {
      Some(event) => {
        self.handle_event(event);
        true
      }
      None => {
        debug!("ignoring unrecognised widget message");
        false
      }
    }
  }
}
