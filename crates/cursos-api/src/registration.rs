//! Handler for the CRMV registry lookup. Mounted always; answers 404 while
//! the lookup is disabled.

use axum::{
  Json,
  extract::{Path, State},
};
use cursos_capture::{model::DocumentModel, registry::RegistryStatus};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{error::ApiError, sessions::lookup, state::AppState};

#[derive(Debug, Deserialize)]
pub struct VerifyBody {
  #[serde(default)]
  pub crmv: String,
}

#[derive(Debug, Serialize)]
pub struct Verified {
  pub status:  RegistryStatus,
  pub message: &'static str,
}

/// `POST /sessions/{id}/registration` with body `{"crmv":"SP 12345"}`
pub async fn verify<M, P>(
  State(state): State<AppState<M, P>>,
  Path(id): Path<Uuid>,
  Json(body): Json<VerifyBody>,
) -> Result<Json<Verified>, ApiError>
where
  M: DocumentModel,
{
  lookup(&state, id).await?;
  let registry = state
    .registry
    .as_ref()
    .ok_or_else(|| ApiError::NotFound("registry lookup is disabled".into()))?;

  let status = registry
    .verify(&body.crmv)
    .await
    .map_err(cursos_capture::Error::from)?;
  Ok(Json(Verified { status, message: status.message() }))
}
