//! Handlers for `/preferences/display-mode`.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/preferences/display-mode` | `{"mode":"light"}` when nothing is stored |
//! | `PUT`  | `/preferences/display-mode` | Body: `{"mode":"dark"}` |

use axum::{Json, extract::State};
use cursos_core::preference::{DisplayMode, PreferenceStore};
use serde::{Deserialize, Serialize};

use crate::{error::ApiError, state::AppState};

#[derive(Debug, Serialize, Deserialize)]
pub struct DisplayModeBody {
  pub mode: DisplayMode,
}

/// `GET /preferences/display-mode`
pub async fn show<M, P>(
  State(state): State<AppState<M, P>>,
) -> Result<Json<DisplayModeBody>, ApiError>
where
  P: PreferenceStore,
{
  let mode = state
    .preferences
    .load_display_mode()
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(DisplayModeBody { mode }))
}

/// `PUT /preferences/display-mode`
pub async fn update<M, P>(
  State(state): State<AppState<M, P>>,
  Json(body): Json<DisplayModeBody>,
) -> Result<Json<DisplayModeBody>, ApiError>
where
  P: PreferenceStore,
{
  state
    .preferences
    .save_display_mode(body.mode)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  tracing::info!(mode = %body.mode, "display mode saved");
  Ok(Json(body))
}
