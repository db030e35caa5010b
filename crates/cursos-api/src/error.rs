//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use cursos_capture::Error as CaptureError;
use cursos_core::validation::FieldErrors;
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("unprocessable: {0}")]
  Unprocessable(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("validation failed: {0}")]
  Validation(FieldErrors),

  #[error("unsupported media type: {0}")]
  UnsupportedMediaType(String),

  #[error("unavailable: {0}")]
  Unavailable(String),

  /// An upstream service failed; the message is safe to show.
  #[error("upstream failure: {0}")]
  Upstream(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<CaptureError> for ApiError {
  fn from(e: CaptureError) -> Self {
    let message = e.user_message();
    match e {
      CaptureError::InvalidFileType { .. } => ApiError::UnsupportedMediaType(message),
      CaptureError::ModalClosed => ApiError::Conflict(message),
      CaptureError::Validation(fields) => ApiError::Validation(fields),
      CaptureError::Extraction(_) => ApiError::Upstream(message),
      CaptureError::Registry(cursos_capture::registry::RegistryError::MissingNumber) => {
        ApiError::Unprocessable(message)
      }
      CaptureError::Registry(_) => ApiError::Upstream(message),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, body) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, json!({ "error": m })),
      ApiError::Unprocessable(m) => (StatusCode::UNPROCESSABLE_ENTITY, json!({ "error": m })),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, json!({ "error": m })),
      ApiError::Validation(fields) => (
        StatusCode::UNPROCESSABLE_ENTITY,
        json!({ "error": fields.to_string(), "fields": fields }),
      ),
      ApiError::UnsupportedMediaType(m) => {
        (StatusCode::UNSUPPORTED_MEDIA_TYPE, json!({ "error": m }))
      }
      ApiError::Unavailable(m) => (StatusCode::SERVICE_UNAVAILABLE, json!({ "error": m })),
      ApiError::Upstream(m) => (StatusCode::BAD_GATEWAY, json!({ "error": m })),
      ApiError::Store(e) => {
        tracing::error!(error = %e, "preference store failure");
        (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": e.to_string() }))
      }
    };
    (status, Json(body)).into_response()
  }
}
