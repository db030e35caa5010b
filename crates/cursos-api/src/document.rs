//! Handlers for the document modal.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/sessions/{id}/document` | Pipeline phase, image, result, error |
//! | `PUT`    | `/sessions/{id}/document/image` | Raw body; media type from `Content-Type`, optional `X-File-Name` |
//! | `POST`   | `/sessions/{id}/document/extract` | 200 / 204 nothing staged / 409 busy / 502 failed |
//! | `DELETE` | `/sessions/{id}/document` | Clears the pipeline |
//!
//! Image and extract requests get 409 while the modal is closed.

use axum::{
  Json,
  extract::{Path, State},
  http::{HeaderMap, StatusCode, header},
  response::{IntoResponse, Response},
};
use bytes::Bytes;
use cursos_capture::{
  image::ImageMeta,
  model::DocumentModel,
  pipeline::{ExtractOutcome, PipelineView},
};
use cursos_core::profile::{ExtractionResult, UserProfile};
use serde::Serialize;
use uuid::Uuid;

use crate::{error::ApiError, sessions::lookup, state::AppState};

pub const FILE_NAME_HEADER: &str = "x-file-name";

#[derive(Debug, Serialize)]
pub struct DocumentView {
  pub modal_open: bool,
  #[serde(flatten)]
  pub pipeline:   PipelineView,
}

/// `GET /sessions/{id}/document`
pub async fn show<M, P>(
  State(state): State<AppState<M, P>>,
  Path(id): Path<Uuid>,
) -> Result<Json<DocumentView>, ApiError>
where
  M: DocumentModel,
{
  let session = lookup(&state, id).await?;
  Ok(Json(DocumentView {
    modal_open: session.flow.modals().document_modal_open,
    pipeline:   session.flow.document_view(),
  }))
}

/// `PUT /sessions/{id}/document/image`
pub async fn upload<M, P>(
  State(state): State<AppState<M, P>>,
  Path(id): Path<Uuid>,
  headers: HeaderMap,
  body: Bytes,
) -> Result<Json<ImageMeta>, ApiError>
where
  M: DocumentModel,
{
  let session = lookup(&state, id).await?;
  let media_type = headers
    .get(header::CONTENT_TYPE)
    .and_then(|v| v.to_str().ok())
    .unwrap_or_default();
  let file_name = headers.get(FILE_NAME_HEADER).and_then(|v| v.to_str().ok());
  let meta = session.flow.submit_image(body, media_type, file_name)?;
  Ok(Json(meta))
}

#[derive(Debug, Serialize)]
pub struct Extracted {
  pub result:  ExtractionResult,
  pub profile: UserProfile,
}

/// `POST /sessions/{id}/document/extract`
pub async fn extract<M, P>(
  State(state): State<AppState<M, P>>,
  Path(id): Path<Uuid>,
) -> Result<Response, ApiError>
where
  M: DocumentModel,
{
  let session = lookup(&state, id).await?;
  match session.flow.extract().await? {
    ExtractOutcome::Extracted(result) => {
      let profile = session.flow.profile();
      Ok(Json(Extracted { result, profile }).into_response())
    }
    ExtractOutcome::NoPendingImage => Ok(StatusCode::NO_CONTENT.into_response()),
    ExtractOutcome::AlreadyRunning => {
      Err(ApiError::Conflict("an extraction is already running".into()))
    }
    ExtractOutcome::Superseded => {
      Err(ApiError::Conflict("the document was reset during extraction".into()))
    }
    ExtractOutcome::Failed(message) => Err(ApiError::Upstream(message)),
  }
}

/// `DELETE /sessions/{id}/document`
pub async fn reset<M, P>(
  State(state): State<AppState<M, P>>,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  M: DocumentModel,
{
  let session = lookup(&state, id).await?;
  session.flow.reset_document();
  Ok(StatusCode::NO_CONTENT)
}
