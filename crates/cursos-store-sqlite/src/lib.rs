//! SQLite backend for durable visitor preferences.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Profiles are never written here; only
//! the preferences that must survive a reload are.

mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqlitePreferenceStore;
