//! The `ProfileStore` trait and its in-memory implementation.
//!
//! Consumers receive a store by constructor injection; nothing looks one up
//! ambiently. All writes go through [`ProfileStore::merge_profile`].

use std::sync::RwLock;

use crate::profile::{ProfilePatch, UserProfile};

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Holder of one visitor's profile.
pub trait ProfileStore: Send + Sync {
  /// A copy of the current profile.
  fn snapshot(&self) -> UserProfile;

  /// Apply `patch` as one step and return the resulting profile.
  fn merge_profile(&self, patch: ProfilePatch) -> UserProfile;
}

// ─── Memory store ────────────────────────────────────────────────────────────

/// A profile that lives only as long as its owner; never persisted.
#[derive(Debug, Default)]
pub struct MemoryProfileStore {
  profile: RwLock<UserProfile>,
}

impl MemoryProfileStore {
  pub fn new() -> Self { Self::default() }
}

impl ProfileStore for MemoryProfileStore {
  fn snapshot(&self) -> UserProfile {
    match self.profile.read() {
      Ok(p) => p.clone(),
      Err(poisoned) => poisoned.into_inner().clone(),
    }
  }

  fn merge_profile(&self, patch: ProfilePatch) -> UserProfile {
    let mut guard = match self.profile.write() {
      Ok(g) => g,
      Err(poisoned) => poisoned.into_inner(),
    };
    guard.apply(patch);
    guard.clone()
  }
}
