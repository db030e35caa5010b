//! Handlers for session lifecycle and the contact form.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/sessions` | 201; 503 when the session limit is reached |
//! | `DELETE` | `/sessions/{id}` | 204 |
//! | `GET`    | `/sessions/{id}/profile` | Current profile and modal state |
//! | `POST`   | `/sessions/{id}/capture` | Opens the contact form |
//! | `PUT`    | `/sessions/{id}/contact` | Body: `{"name","email","phone"}`; 422 on bad input |
//! | `DELETE` | `/sessions/{id}/contact` | Closes the contact form |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use cursos_capture::{
  flow::{FormMode, ModalState, SavedContact},
  model::DocumentModel,
};
use cursos_core::{profile::UserProfile, validation::ContactForm};
use serde::Serialize;
use uuid::Uuid;

use crate::{
  error::ApiError,
  session::{Session, SessionInfo},
  state::AppState,
};

pub(crate) async fn lookup<M, P>(
  state: &AppState<M, P>,
  id: Uuid,
) -> Result<Arc<Session<M>>, ApiError>
where
  M: DocumentModel,
{
  state
    .sessions
    .get(id)
    .await
    .ok_or_else(|| ApiError::NotFound(format!("session {id}")))
}

// ─── Lifecycle ────────────────────────────────────────────────────────────────

/// `POST /sessions`
pub async fn create<M, P>(
  State(state): State<AppState<M, P>>,
) -> Result<(StatusCode, Json<SessionInfo>), ApiError>
where
  M: DocumentModel,
{
  let session = state
    .sessions
    .create()
    .await
    .ok_or_else(|| ApiError::Unavailable("too many open sessions".into()))?;
  Ok((StatusCode::CREATED, Json(session.info())))
}

/// `DELETE /sessions/{id}`
pub async fn remove<M, P>(
  State(state): State<AppState<M, P>>,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  M: DocumentModel,
{
  if state.sessions.remove(id).await {
    Ok(StatusCode::NO_CONTENT)
  } else {
    Err(ApiError::NotFound(format!("session {id}")))
  }
}

// ─── Profile ──────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ProfileView {
  pub profile: UserProfile,
  pub modals:  ModalState,
}

/// `GET /sessions/{id}/profile`
pub async fn profile<M, P>(
  State(state): State<AppState<M, P>>,
  Path(id): Path<Uuid>,
) -> Result<Json<ProfileView>, ApiError>
where
  M: DocumentModel,
{
  let session = lookup(&state, id).await?;
  Ok(Json(ProfileView {
    profile: session.flow.profile(),
    modals:  session.flow.modals(),
  }))
}

// ─── Contact form ─────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct CaptureView {
  pub mode:    FormMode,
  pub profile: UserProfile,
}

/// `POST /sessions/{id}/capture`
pub async fn capture<M, P>(
  State(state): State<AppState<M, P>>,
  Path(id): Path<Uuid>,
) -> Result<Json<CaptureView>, ApiError>
where
  M: DocumentModel,
{
  let session = lookup(&state, id).await?;
  let mode = session.flow.request_profile_capture();
  Ok(Json(CaptureView { mode, profile: session.flow.profile() }))
}

/// `PUT /sessions/{id}/contact`
pub async fn save_contact<M, P>(
  State(state): State<AppState<M, P>>,
  Path(id): Path<Uuid>,
  Json(form): Json<ContactForm>,
) -> Result<Json<SavedContact>, ApiError>
where
  M: DocumentModel,
{
  let session = lookup(&state, id).await?;
  let saved = session.flow.save_contact_info(&form)?;
  Ok(Json(saved))
}

/// `DELETE /sessions/{id}/contact`
pub async fn close_contact<M, P>(
  State(state): State<AppState<M, P>>,
  Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError>
where
  M: DocumentModel,
{
  let session = lookup(&state, id).await?;
  session.flow.close_contact_form();
  Ok(StatusCode::NO_CONTENT)
}
