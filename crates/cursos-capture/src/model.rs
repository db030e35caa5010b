//! The `DocumentModel` trait: the seam to the hosted vision model.

use std::future::Future;

/// A base64-encoded image ready to be inlined in a model request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
  pub media_type: String,
  pub data:       String,
}

/// A hosted model that answers a text instruction about one image.
///
/// Implementations return the raw text of the reply; cleaning and parsing
/// are the pipeline's job.
pub trait DocumentModel: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Short identifier used in logs.
  fn name(&self) -> &str;

  fn generate<'a>(
    &'a self,
    prompt: &'a str,
    image: &'a InlineImage,
  ) -> impl Future<Output = Result<String, Self::Error>> + Send + 'a;
}
