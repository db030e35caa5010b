//! Cleaning and parsing the model's text reply.

use cursos_core::profile::ExtractionResult;

use crate::ExtractionError;

const FENCE: &str = "```";

/// Remove a leading ```` ``` ```` (with optional language tag) and a trailing
/// ```` ``` ````, then trim. Text without fences is returned trimmed.
pub fn strip_code_fences(text: &str) -> &str {
  let mut s = text.trim();
  if let Some(rest) = s.strip_prefix(FENCE) {
    let tag_len = rest
      .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'))
      .unwrap_or(rest.len());
    s = rest[tag_len..].trim_start();
  }
  if let Some(rest) = s.strip_suffix(FENCE) {
    s = rest;
  }
  s.trim()
}

/// Strip fences and parse the remainder as an [`ExtractionResult`].
pub fn parse_reply(reply: &str) -> Result<ExtractionResult, ExtractionError> {
  let cleaned = strip_code_fences(reply);
  if cleaned.is_empty() {
    return Err(ExtractionError::EmptyReply);
  }
  ExtractionResult::from_json(cleaned).map_err(ExtractionError::Parse)
}
