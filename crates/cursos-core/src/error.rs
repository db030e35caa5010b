//! Error types for `cursos-core`.

use thiserror::Error;

use crate::validation::FieldErrors;

#[derive(Debug, Error)]
pub enum Error {
  #[error("contact form is invalid: {0}")]
  Validation(FieldErrors),

  #[error("unknown display mode: {0:?}")]
  UnknownDisplayMode(String),

  #[error("expected a JSON object, found {0}")]
  NotAnObject(&'static str),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
