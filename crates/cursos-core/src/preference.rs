//! Display-mode preference and the storage seam that persists it.

use std::{fmt, future::Future, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::Error;

/// Key under which the preference is stored.
pub const DISPLAY_MODE_KEY: &str = "darkMode";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
  #[default]
  Light,
  Dark,
}

impl DisplayMode {
  pub fn is_dark(self) -> bool { matches!(self, Self::Dark) }

  /// The stored form: a JSON boolean, `true` meaning dark.
  pub fn to_stored(self) -> String {
    serde_json::Value::Bool(self.is_dark()).to_string()
  }

  /// Decode the stored form. Anything that is not a JSON boolean is
  /// rejected so the caller can fall back to the default.
  pub fn from_stored(raw: &str) -> crate::Result<Self> {
    match serde_json::from_str::<serde_json::Value>(raw)? {
      serde_json::Value::Bool(true) => Ok(Self::Dark),
      serde_json::Value::Bool(false) => Ok(Self::Light),
      _ => Err(Error::UnknownDisplayMode(raw.to_string())),
    }
  }
}

impl fmt::Display for DisplayMode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::Light => "light",
      Self::Dark => "dark",
    })
  }
}

impl FromStr for DisplayMode {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "light" => Ok(Self::Light),
      "dark" => Ok(Self::Dark),
      other => Err(Error::UnknownDisplayMode(other.to_string())),
    }
  }
}

/// Durable storage for visitor preferences.
pub trait PreferenceStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// The stored mode, or [`DisplayMode::default`] when nothing usable is
  /// stored.
  fn load_display_mode(
    &self,
  ) -> impl Future<Output = Result<DisplayMode, Self::Error>> + Send + '_;

  fn save_display_mode(
    &self,
    mode: DisplayMode,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
