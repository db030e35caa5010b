//! Shared handler state.

use std::sync::Arc;

use cursos_capture::registry::RegistryClient;
use cursos_core::event::OriginPolicy;

use crate::session::SessionRegistry;

pub const DEFAULT_MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

pub struct AppState<M, P> {
  pub sessions:        Arc<SessionRegistry<M>>,
  pub preferences:     Arc<P>,
  pub origins:         Arc<OriginPolicy>,
  /// `None` when the CRMV lookup is disabled.
  pub registry:        Option<Arc<RegistryClient>>,
  pub max_image_bytes: usize,
}

impl<M, P> AppState<M, P> {
  pub fn new(sessions: SessionRegistry<M>, preferences: Arc<P>) -> Self {
    Self {
      sessions: Arc::new(sessions),
      preferences,
      origins: Arc::new(OriginPolicy::allow_all()),
      registry: None,
      max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
    }
  }

  pub fn with_origins(mut self, origins: OriginPolicy) -> Self {
    self.origins = Arc::new(origins);
    self
  }

  pub fn with_registry(mut self, registry: RegistryClient) -> Self {
    self.registry = Some(Arc::new(registry));
    self
  }

  pub fn with_max_image_bytes(mut self, max: usize) -> Self {
    self.max_image_bytes = max;
    self
  }
}

// Manual impl: `derive` would demand `M: Clone` and `P: Clone`.
impl<M, P> Clone for AppState<M, P> {
  fn clone(&self) -> Self {
    Self {
      sessions:        self.sessions.clone(),
      preferences:     self.preferences.clone(),
      origins:         self.origins.clone(),
      registry:        self.registry.clone(),
      max_image_bytes: self.max_image_bytes,
    }
  }
}
