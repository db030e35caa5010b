//! Error types for `cursos-capture`.

use std::time::Duration;

use cursos_core::validation::FieldErrors;
use thiserror::Error;

use crate::registry::RegistryError;

/// Shown for every extraction failure, whatever the cause.
pub const EXTRACTION_FAILED: &str = "Falha ao ler o documento. Tente novamente.";

/// Shown when the selected file is not an image.
pub const INVALID_FILE_TYPE: &str =
  "Por favor, selecione um arquivo de imagem válido.";

#[derive(Debug, Error)]
pub enum Error {
  #[error("not an image: {media_type:?}")]
  InvalidFileType { media_type: String },

  #[error("the document modal is closed")]
  ModalClosed,

  #[error("contact form is invalid: {0}")]
  Validation(FieldErrors),

  #[error(transparent)]
  Extraction(#[from] ExtractionError),

  #[error(transparent)]
  Registry(#[from] RegistryError),
}

impl Error {
  /// The message a visitor sees for this error.
  pub fn user_message(&self) -> String {
    match self {
      Error::InvalidFileType { .. } => INVALID_FILE_TYPE.to_string(),
      Error::ModalClosed => "Abra o envio de documento para continuar.".to_string(),
      Error::Validation(fields) => fields.to_string(),
      Error::Extraction(_) => EXTRACTION_FAILED.to_string(),
      Error::Registry(e) => e.user_message().to_string(),
    }
  }
}

/// Anything that can go wrong between reading the image and parsing the
/// model's reply. Visitors only ever see [`EXTRACTION_FAILED`]; the variant
/// is for the logs.
#[derive(Debug, Error)]
pub enum ExtractionError {
  #[error("image encoding failed: {0}")]
  Encode(String),

  #[error("model call failed: {0}")]
  Model(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("model call timed out after {0:?}")]
  Timeout(Duration),

  #[error("model returned an empty reply")]
  EmptyReply,

  #[error("reply is not a valid extraction result: {0}")]
  Parse(#[source] cursos_core::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
