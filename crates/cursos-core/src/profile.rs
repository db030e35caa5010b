//! The visitor profile and the extraction result merged into it.
//!
//! A [`UserProfile`] is never written field by field. Every change is
//! expressed as a [`ProfilePatch`] and applied in one step by
//! [`crate::store::ProfileStore::merge_profile`].

use serde::{Deserialize, Deserializer, Serialize, de::Error as _};
use serde_json::Value;

// ─── Extraction result ───────────────────────────────────────────────────────

/// The identity document kinds the extraction instruction asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DocumentKind {
  /// Carteira Nacional de Habilitação (driver's licence).
  Cnh,
  /// Registro Geral (identity card).
  Rg,
}

impl DocumentKind {
  /// Recognise the free-text `tipo_documento` value returned by the model.
  pub fn from_label(label: &str) -> Option<Self> {
    match label.trim().to_ascii_uppercase().as_str() {
      "CNH" => Some(Self::Cnh),
      "RG" => Some(Self::Rg),
      _ => None,
    }
  }
}

/// The six fields read from an identity document.
///
/// Field names on the wire are the keys the extraction instruction asks the
/// model to use. Every field is nullable; a missing key reads as `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
  #[serde(rename = "tipo_documento", default, deserialize_with = "lenient_string")]
  pub document_type:        Option<String>,
  #[serde(rename = "nome_completo", default, deserialize_with = "lenient_string")]
  pub document_holder_name: Option<String>,
  #[serde(rename = "cpf", default, deserialize_with = "lenient_string")]
  pub tax_id:               Option<String>,
  /// Free-form `dd/mm/yyyy`; kept as text.
  #[serde(rename = "data_nascimento", default, deserialize_with = "lenient_string")]
  pub birth_date:           Option<String>,
  #[serde(rename = "nome_mae", default, deserialize_with = "lenient_string")]
  pub mother_name:          Option<String>,
  #[serde(rename = "numero_registro", default, deserialize_with = "lenient_string")]
  pub registration_number:  Option<String>,
}

impl ExtractionResult {
  /// Parse a reply body that is expected to hold a single JSON object.
  ///
  /// Arrays are refused up front; the derived impl would otherwise map
  /// their elements onto fields by position.
  pub fn from_json(text: &str) -> crate::Result<Self> {
    match serde_json::from_str::<Value>(text)? {
      object @ Value::Object(_) => Ok(serde_json::from_value(object)?),
      other => Err(crate::Error::NotAnObject(json_kind(&other))),
    }
  }

  pub fn document_kind(&self) -> Option<DocumentKind> {
    self.document_type.as_deref().and_then(DocumentKind::from_label)
  }
}

fn json_kind(value: &Value) -> &'static str {
  match value {
    Value::Null => "null",
    Value::Bool(_) => "a boolean",
    Value::Number(_) => "a number",
    Value::String(_) => "a string",
    Value::Array(_) => "an array",
    Value::Object(_) => "an object",
  }
}

/// Accept a string, a number (rendered as text) or `null`.
///
/// Registration numbers and CPFs occasionally come back as bare numbers.
fn lenient_string<'de, D>(de: D) -> Result<Option<String>, D::Error>
where
  D: Deserializer<'de>,
{
  match Option::<Value>::deserialize(de)? {
    None | Some(Value::Null) => Ok(None),
    Some(Value::String(s)) => Ok(Some(s)),
    Some(Value::Number(n)) => Ok(Some(n.to_string())),
    Some(other) => Err(D::Error::custom(format!(
      "expected a string or null, found {other}"
    ))),
  }
}

// ─── Profile ─────────────────────────────────────────────────────────────────

/// Contact and identity-document fields for the current visitor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
  pub name:                 String,
  pub email:                String,
  pub phone:                String,
  pub document_type:        Option<String>,
  pub document_holder_name: Option<String>,
  pub tax_id:               Option<String>,
  pub birth_date:           Option<String>,
  pub mother_name:          Option<String>,
  pub registration_number:  Option<String>,
}

impl UserProfile {
  /// `true` when name, email and phone are all non-blank.
  pub fn has_contact_info(&self) -> bool {
    [&self.name, &self.email, &self.phone]
      .iter()
      .all(|f| !f.trim().is_empty())
  }

  /// `true` once any document field has been merged.
  pub fn has_document(&self) -> bool {
    self.document_type.is_some()
      || self.document_holder_name.is_some()
      || self.tax_id.is_some()
      || self.birth_date.is_some()
      || self.mother_name.is_some()
      || self.registration_number.is_some()
  }

  /// Apply `patch` in place. Contact fields are overwritten only when the
  /// patch carries them; document fields are assigned together.
  pub fn apply(&mut self, patch: ProfilePatch) {
    let ProfilePatch { name, email, phone, document } = patch;
    if let Some(name) = name {
      self.name = name;
    }
    if let Some(email) = email {
      self.email = email;
    }
    if let Some(phone) = phone {
      self.phone = phone;
    }
    if let Some(doc) = document {
      self.document_type = doc.document_type;
      self.document_holder_name = doc.document_holder_name;
      self.tax_id = doc.tax_id;
      self.birth_date = doc.birth_date;
      self.mother_name = doc.mother_name;
      self.registration_number = doc.registration_number;
    }
  }
}

// ─── Patch ───────────────────────────────────────────────────────────────────

/// Input to [`crate::store::ProfileStore::merge_profile`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfilePatch {
  pub name:     Option<String>,
  pub email:    Option<String>,
  pub phone:    Option<String>,
  pub document: Option<ExtractionResult>,
}

impl ProfilePatch {
  /// A patch overwriting all three contact fields.
  pub fn contact(
    name: impl Into<String>,
    email: impl Into<String>,
    phone: impl Into<String>,
  ) -> Self {
    Self {
      name: Some(name.into()),
      email: Some(email.into()),
      phone: Some(phone.into()),
      document: None,
    }
  }

  /// A patch assigning the six document fields and nothing else.
  pub fn document(result: ExtractionResult) -> Self {
    Self { document: Some(result), ..Self::default() }
  }

  pub fn is_empty(&self) -> bool {
    self.name.is_none()
      && self.email.is_none()
      && self.phone.is_none()
      && self.document.is_none()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const FULL: &str = r#"{
    "tipo_documento": "RG",
    "nome_completo": "Maria da Silva",
    "cpf": "123.456.789-00",
    "data_nascimento": "01/02/1990",
    "nome_mae": "Ana da Silva",
    "numero_registro": "12.345.678-9"
  }"#;

  #[test]
  fn parses_all_six_wire_keys() {
    let r = ExtractionResult::from_json(FULL).unwrap();
    assert_eq!(r.document_type.as_deref(), Some("RG"));
    assert_eq!(r.document_holder_name.as_deref(), Some("Maria da Silva"));
    assert_eq!(r.tax_id.as_deref(), Some("123.456.789-00"));
    assert_eq!(r.birth_date.as_deref(), Some("01/02/1990"));
    assert_eq!(r.mother_name.as_deref(), Some("Ana da Silva"));
    assert_eq!(r.registration_number.as_deref(), Some("12.345.678-9"));
    assert_eq!(r.document_kind(), Some(DocumentKind::Rg));
  }

  #[test]
  fn null_field_is_none_not_the_string_null() {
    let r = ExtractionResult::from_json(r#"{"tipo_documento":"CNH","nome_mae":null}"#)
      .unwrap();
    assert_eq!(r.mother_name, None);
    assert_eq!(r.tax_id, None, "missing keys read as null");
  }

  #[test]
  fn numeric_values_become_text() {
    let r = ExtractionResult::from_json(r#"{"numero_registro": 987654}"#).unwrap();
    assert_eq!(r.registration_number.as_deref(), Some("987654"));
  }

  #[test]
  fn nested_values_are_rejected() {
    assert!(ExtractionResult::from_json(r#"{"cpf": {"a": 1}}"#).is_err());
    assert!(ExtractionResult::from_json("[1, 2]").is_err());
    assert!(ExtractionResult::from_json("not json at all").is_err());
  }

  #[test]
  fn positional_array_is_not_an_extraction() {
    let err = ExtractionResult::from_json(r#"["RG", "Maria", "123"]"#).unwrap_err();
    assert!(matches!(err, crate::Error::NotAnObject("an array")), "{err}");
    assert!(ExtractionResult::from_json(r#""RG""#).is_err());
    assert!(ExtractionResult::from_json("null").is_err());
  }

  #[test]
  fn document_patch_keeps_contact_fields() {
    let mut p = UserProfile::default();
    p.apply(ProfilePatch::contact("Jane", "jane@x.com", "119"));
    p.apply(ProfilePatch::document(ExtractionResult::from_json(FULL).unwrap()));

    assert_eq!(p.name, "Jane");
    assert_eq!(p.email, "jane@x.com");
    assert_eq!(p.phone, "119");
    assert!(p.has_document());
  }

  #[test]
  fn document_patch_replaces_every_document_field() {
    let mut p = UserProfile::default();
    p.apply(ProfilePatch::document(ExtractionResult::from_json(FULL).unwrap()));
    p.apply(ProfilePatch::document(ExtractionResult {
      document_type: Some("CNH".into()),
      ..ExtractionResult::default()
    }));

    assert_eq!(p.document_type.as_deref(), Some("CNH"));
    assert_eq!(p.tax_id, None);
    assert_eq!(p.mother_name, None);
  }

  #[test]
  fn has_contact_info_requires_all_three() {
    let mut p = UserProfile::default();
    assert!(!p.has_contact_info());
    p.apply(ProfilePatch { name: Some("Jane".into()), ..Default::default() });
    assert!(!p.has_contact_info());
    p.apply(ProfilePatch::contact("Jane", "jane@x.com", "  "));
    assert!(!p.has_contact_info());
    p.apply(ProfilePatch::contact("Jane", "jane@x.com", "119"));
    assert!(p.has_contact_info());
  }

  #[test]
  fn document_kind_is_case_insensitive() {
    assert_eq!(DocumentKind::from_label(" cnh "), Some(DocumentKind::Cnh));
    assert_eq!(DocumentKind::from_label("passaporte"), None);
  }
}
