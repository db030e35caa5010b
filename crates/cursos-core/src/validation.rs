//! Contact-form rules.
//!
//! Messages are the Portuguese strings shown next to each field.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::profile::ProfilePatch;

/// Single `@`, no whitespace, at least one dot in the domain part.
static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

pub const NAME_REQUIRED: &str = "Nome é obrigatório";
pub const EMAIL_INVALID: &str = "Email válido é obrigatório";
pub const PHONE_REQUIRED: &str = "Telefone é obrigatório";

/// Raw values typed into the contact form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactForm {
  #[serde(default)]
  pub name:  String,
  #[serde(default)]
  pub email: String,
  #[serde(default)]
  pub phone: String,
}

/// Validated, trimmed contact fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
  pub name:  String,
  pub email: String,
  pub phone: String,
}

impl From<ContactInfo> for ProfilePatch {
  fn from(c: ContactInfo) -> Self {
    ProfilePatch::contact(c.name, c.email, c.phone)
  }
}

/// Per-field messages; `None` means the field is fine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldErrors {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub name:  Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub email: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub phone: Option<String>,
}

impl FieldErrors {
  pub fn is_empty(&self) -> bool {
    self.name.is_none() && self.email.is_none() && self.phone.is_none()
  }
}

impl fmt::Display for FieldErrors {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let parts: Vec<&str> = [&self.name, &self.email, &self.phone]
      .into_iter()
      .flatten()
      .map(String::as_str)
      .collect();
    f.write_str(&parts.join("; "))
  }
}

pub fn is_valid_email(email: &str) -> bool {
  EMAIL_RE.is_match(email.trim())
}

impl ContactForm {
  pub fn new(
    name: impl Into<String>,
    email: impl Into<String>,
    phone: impl Into<String>,
  ) -> Self {
    Self { name: name.into(), email: email.into(), phone: phone.into() }
  }

  /// Check every field and report all failures at once.
  pub fn validate(&self) -> Result<ContactInfo, FieldErrors> {
    let name = self.name.trim();
    let email = self.email.trim();
    let phone = self.phone.trim();

    let errors = FieldErrors {
      name:  name.is_empty().then(|| NAME_REQUIRED.to_string()),
      email: (!is_valid_email(email)).then(|| EMAIL_INVALID.to_string()),
      phone: phone.is_empty().then(|| PHONE_REQUIRED.to_string()),
    };

    if errors.is_empty() {
      Ok(ContactInfo {
        name:  name.to_string(),
        email: email.to_string(),
        phone: phone.to_string(),
      })
    } else {
      Err(errors)
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn blank_name_is_the_only_error() {
    let err = ContactForm::new("", "a@b.com", "123").validate().unwrap_err();
    assert_eq!(err.name.as_deref(), Some(NAME_REQUIRED));
    assert_eq!(err.email, None);
    assert_eq!(err.phone, None);
  }

  #[test]
  fn malformed_email_is_the_only_error() {
    let err = ContactForm::new("Jane Doe", "not-an-email", "123")
      .validate()
      .unwrap_err();
    assert_eq!(err.name, None);
    assert_eq!(err.email.as_deref(), Some(EMAIL_INVALID));
    assert_eq!(err.phone, None);
  }

  #[test]
  fn valid_form_is_trimmed() {
    let info = ContactForm::new(" Jane Doe ", "jane@x.com ", "11999999999")
      .validate()
      .unwrap();
    assert_eq!(info.name, "Jane Doe");
    assert_eq!(info.email, "jane@x.com");
    assert_eq!(info.phone, "11999999999");
  }

  #[test]
  fn all_failures_are_reported_together() {
    let err = ContactForm::new("   ", "", "\t").validate().unwrap_err();
    assert!(err.name.is_some() && err.email.is_some() && err.phone.is_some());
    assert_eq!(
      err.to_string(),
      format!("{NAME_REQUIRED}; {EMAIL_INVALID}; {PHONE_REQUIRED}")
    );
  }

  #[test]
  fn email_shapes() {
    assert!(is_valid_email("jane@x.com"));
    assert!(is_valid_email("jane.doe+vet@mail.example.com.br"));
    assert!(!is_valid_email("jane@x"));
    assert!(!is_valid_email("jane@@x.com"));
    assert!(!is_valid_email("ja ne@x.com"));
    assert!(!is_valid_email("@x.com"));
  }
}
