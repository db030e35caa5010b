//! [`SqlitePreferenceStore`], the SQLite implementation of
//! [`PreferenceStore`].

use std::path::Path;

use chrono::{SecondsFormat, Utc};
use cursos_core::preference::{DISPLAY_MODE_KEY, DisplayMode, PreferenceStore};
use rusqlite::OptionalExtension as _;

use crate::{Result, schema::SCHEMA};

// ─── Store ───────────────────────────────────────────────────────────────────

/// Preference storage backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqlitePreferenceStore {
  conn: tokio_rusqlite::Connection,
}

impl SqlitePreferenceStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Raw stored value for `key`, if any.
  pub async fn get(&self, key: &str) -> Result<Option<String>> {
    let key = key.to_owned();
    let value = self
      .conn
      .call(move |conn| {
        let value = conn
          .query_row(
            "SELECT value FROM preferences WHERE key = ?1",
            rusqlite::params![key],
            |r| r.get::<_, String>(0),
          )
          .optional()?;
        Ok(value)
      })
      .await?;
    Ok(value)
  }

  /// Insert or replace the value stored under `key`.
  pub async fn set(&self, key: &str, value: String) -> Result<()> {
    let key = key.to_owned();
    let updated_at = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO preferences (key, value, updated_at) VALUES (?1, ?2, ?3)
           ON CONFLICT(key) DO UPDATE SET
             value      = excluded.value,
             updated_at = excluded.updated_at",
          rusqlite::params![key, value, updated_at],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── PreferenceStore impl ────────────────────────────────────────────────────

impl PreferenceStore for SqlitePreferenceStore {
  type Error = crate::Error;

  async fn load_display_mode(&self) -> Result<DisplayMode> {
    let Some(raw) = self.get(DISPLAY_MODE_KEY).await? else {
      return Ok(DisplayMode::default());
    };
    match DisplayMode::from_stored(&raw) {
      Ok(mode) => Ok(mode),
      Err(e) => {
        tracing::warn!("ignoring stored {DISPLAY_MODE_KEY} value {raw:?}: {e}");
        Ok(DisplayMode::default())
      }
    }
  }

  async fn save_display_mode(&self, mode: DisplayMode) -> Result<()> {
    self.set(DISPLAY_MODE_KEY, mode.to_stored()).await
  }
}
