//! Handler for messages relayed from the embedded chat widget.
//!
//! The body is whatever the widget posted. Unrecognised shapes and senders
//! outside the configured origin allow-list are accepted and ignored.

use axum::{
  Json,
  extract::{Path, State},
  http::{HeaderMap, StatusCode, header},
};
use bytes::Bytes;
use cursos_capture::model::DocumentModel;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::{error::ApiError, sessions::lookup, state::AppState};

#[derive(Debug, Serialize)]
pub struct EventAck {
  pub handled: bool,
}

/// `POST /sessions/{id}/events`
pub async fn post<M, P>(
  State(state): State<AppState<M, P>>,
  Path(id): Path<Uuid>,
  headers: HeaderMap,
  body: Bytes,
) -> Result<(StatusCode, Json<EventAck>), ApiError>
where
  M: DocumentModel,
{
  let session = lookup(&state, id).await?;
  let origin = headers.get(header::ORIGIN).and_then(|v| v.to_str().ok());

  let handled = match serde_json::from_slice::<Value>(&body) {
    Ok(message) => session.flow.handle_message(&message, origin, &state.origins),
    Err(e) => {
      debug!(error = %e, "widget message is not JSON");
      false
    }
  };
  Ok((StatusCode::ACCEPTED, Json(EventAck { handled })))
}
