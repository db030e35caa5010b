//! Messages posted by the embedded chat widget.
//!
//! Only two shapes are understood. Anything else, including malformed JSON
//! objects, is ignored rather than treated as an error.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::profile::ProfilePatch;

/// Contact fields the widget may collect before asking for the document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedContact {
  #[serde(default)]
  pub name:  Option<String>,
  #[serde(default)]
  pub email: Option<String>,
  #[serde(default)]
  pub phone: Option<String>,
}

impl SeedContact {
  /// Only non-blank values are carried over; seeding never clears a field.
  pub fn into_patch(self) -> ProfilePatch {
    fn keep(v: Option<String>) -> Option<String> {
      v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
    }
    ProfilePatch {
      name:     keep(self.name),
      email:    keep(self.email),
      phone:    keep(self.phone),
      document: None,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WidgetEvent {
  #[serde(rename = "OPEN_MODAL")]
  OpenModal {
    #[serde(rename = "userData", default, skip_serializing_if = "Option::is_none")]
    user_data: Option<SeedContact>,
  },
  #[serde(rename = "CLOSE_MODAL")]
  CloseModal,
}

impl WidgetEvent {
  /// Interpret an arbitrary posted message. Returns `None` for shapes this
  /// flow does not handle.
  pub fn from_message(message: &Value) -> Option<Self> {
    serde_json::from_value(message.clone()).ok()
  }
}

// ─── Origin policy ───────────────────────────────────────────────────────────

/// Which senders may drive the flow through widget messages.
///
/// An empty allow-list accepts every sender.
#[derive(Debug, Clone, Default)]
pub struct OriginPolicy {
  allowed: Vec<String>,
}

impl OriginPolicy {
  pub fn new<I, S>(allowed: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self {
      allowed: allowed
        .into_iter()
        .map(|s| s.into().trim_end_matches('/').to_ascii_lowercase())
        .filter(|s| !s.is_empty())
        .collect(),
    }
  }

  pub fn allow_all() -> Self { Self::default() }

  pub fn is_open(&self) -> bool { self.allowed.is_empty() }

  pub fn permits(&self, origin: Option<&str>) -> bool {
    if self.allowed.is_empty() {
      return true;
    }
    match origin {
      Some(o) => {
        let o = o.trim().trim_end_matches('/').to_ascii_lowercase();
        self.allowed.iter().any(|a| *a == o)
      }
      None => false,
    }
  }
}
