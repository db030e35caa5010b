//! Per-visitor sessions.
//!
//! Each session owns one [`CaptureFlow`] with its own in-memory profile
//! store. Sessions live only as long as the process; nothing here is
//! persisted. A session untouched for longer than the idle TTL is evicted,
//! either by [`SessionRegistry::evict_idle`] or when a new session needs
//! its slot.

use std::{
  collections::HashMap,
  sync::{Arc, Mutex},
  time::{Duration, Instant},
};

use chrono::{DateTime, Utc};
use cursos_capture::{
  flow::CaptureFlow,
  model::DocumentModel,
  pipeline::{DEFAULT_TIMEOUT, ExtractionPipeline},
};
use cursos_core::store::{MemoryProfileStore, ProfileStore};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

pub const DEFAULT_MAX_SESSIONS: usize = 10_000;
pub const DEFAULT_IDLE_TTL: Duration = Duration::from_secs(30 * 60);

pub struct Session<M> {
  pub id:         Uuid,
  pub created_at: DateTime<Utc>,
  pub flow:       CaptureFlow<M>,
  last_seen:      Mutex<Instant>,
}

/// Body of `POST /sessions`.
#[derive(Debug, Clone, Serialize)]
pub struct SessionInfo {
  pub session_id: Uuid,
  pub created_at: DateTime<Utc>,
}

impl<M> Session<M> {
  pub fn info(&self) -> SessionInfo {
    SessionInfo { session_id: self.id, created_at: self.created_at }
  }

  fn last_seen(&self) -> std::sync::MutexGuard<'_, Instant> {
    match self.last_seen.lock() {
      Ok(g) => g,
      Err(poisoned) => poisoned.into_inner(),
    }
  }

  /// Mark the session as used now.
  pub fn touch(&self) { *self.last_seen() = Instant::now(); }

  pub fn idle_for(&self) -> Duration { self.last_seen().elapsed() }
}

/// Owns every live session and the model they share.
pub struct SessionRegistry<M> {
  model:        Arc<M>,
  timeout:      Duration,
  max_sessions: usize,
  idle_ttl:     Duration,
  sessions:     RwLock<HashMap<Uuid, Arc<Session<M>>>>,
}

impl<M: DocumentModel> SessionRegistry<M> {
  pub fn new(model: Arc<M>) -> Self {
    Self {
      model,
      timeout: DEFAULT_TIMEOUT,
      max_sessions: DEFAULT_MAX_SESSIONS,
      idle_ttl: DEFAULT_IDLE_TTL,
      sessions: RwLock::new(HashMap::new()),
    }
  }

  pub fn with_timeout(mut self, timeout: Duration) -> Self {
    self.timeout = timeout;
    self
  }

  pub fn with_max_sessions(mut self, max: usize) -> Self {
    self.max_sessions = max;
    self
  }

  /// Sessions idle for at least `ttl` are evicted.
  pub fn with_idle_ttl(mut self, ttl: Duration) -> Self {
    self.idle_ttl = ttl;
    self
  }

  pub fn idle_ttl(&self) -> Duration { self.idle_ttl }

  /// Start a new session, or `None` when the registry is full even after
  /// evicting idle sessions.
  pub async fn create(&self) -> Option<Arc<Session<M>>> {
    let mut sessions = self.sessions.write().await;
    if sessions.len() >= self.max_sessions {
      self.sweep(&mut sessions);
      if sessions.len() >= self.max_sessions {
        return None;
      }
    }

    let store: Arc<dyn ProfileStore> = Arc::new(MemoryProfileStore::new());
    let pipeline =
      ExtractionPipeline::new(self.model.clone(), store.clone()).with_timeout(self.timeout);
    let session = Arc::new(Session {
      id:         Uuid::new_v4(),
      created_at: Utc::now(),
      flow:       CaptureFlow::new(store, pipeline),
      last_seen:  Mutex::new(Instant::now()),
    });
    sessions.insert(session.id, session.clone());
    info!(session = %session.id, live = sessions.len(), "session created");
    Some(session)
  }

  /// Look up a session and mark it as used.
  pub async fn get(&self, id: Uuid) -> Option<Arc<Session<M>>> {
    let session = self.sessions.read().await.get(&id).cloned()?;
    session.touch();
    Some(session)
  }

  /// Drop a session. In-flight extractions keep their own handle and
  /// finish against a profile nobody can read any more.
  pub async fn remove(&self, id: Uuid) -> bool {
    let removed = self.sessions.write().await.remove(&id).is_some();
    if removed {
      info!(session = %id, "session removed");
    }
    removed
  }

  /// Evict every session idle for at least the TTL. Returns how many went.
  pub async fn evict_idle(&self) -> usize {
    let mut sessions = self.sessions.write().await;
    self.sweep(&mut sessions)
  }

  fn sweep(&self, sessions: &mut HashMap<Uuid, Arc<Session<M>>>) -> usize {
    let before = sessions.len();
    sessions.retain(|_, s| s.idle_for() < self.idle_ttl);
    let evicted = before - sessions.len();
    if evicted > 0 {
      info!(evicted, live = sessions.len(), "idle sessions evicted");
    }
    evicted
  }

  pub async fn len(&self) -> usize { self.sessions.read().await.len() }
}
