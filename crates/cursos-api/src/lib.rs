//! JSON HTTP API for the Cursos.vet capture flow.
//!
//! Exposes an axum [`Router`] over a [`SessionRegistry`] of per-visitor
//! capture flows and a shared [`PreferenceStore`]. TLS and auth are the
//! caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", cursos_api::api_router(state))
//! ```

pub mod document;
pub mod error;
pub mod events;
pub mod preferences;
pub mod registration;
pub mod session;
pub mod sessions;
pub mod state;

use axum::{
  Router,
  extract::DefaultBodyLimit,
  routing::{delete, get, post, put},
};
use cursos_capture::model::DocumentModel;
use cursos_core::preference::PreferenceStore;

pub use error::ApiError;
pub use session::SessionRegistry;
pub use state::AppState;

/// Build a fully-materialised API router for `state`.
pub fn api_router<M, P>(state: AppState<M, P>) -> Router<()>
where
  M: DocumentModel + 'static,
  P: PreferenceStore + 'static,
{
  let body_limit = state.max_image_bytes;
  Router::new()
    // Sessions
    .route("/sessions", post(sessions::create::<M, P>))
    .route("/sessions/{id}", delete(sessions::remove::<M, P>))
    .route("/sessions/{id}/profile", get(sessions::profile::<M, P>))
    .route("/sessions/{id}/capture", post(sessions::capture::<M, P>))
    .route(
      "/sessions/{id}/contact",
      put(sessions::save_contact::<M, P>).delete(sessions::close_contact::<M, P>),
    )
    .route("/sessions/{id}/events", post(events::post::<M, P>))
    .route("/sessions/{id}/registration", post(registration::verify::<M, P>))
    // Document modal
    .route(
      "/sessions/{id}/document",
      get(document::show::<M, P>).delete(document::reset::<M, P>),
    )
    .route("/sessions/{id}/document/image", put(document::upload::<M, P>))
    .route("/sessions/{id}/document/extract", post(document::extract::<M, P>))
    // Preferences
    .route(
      "/preferences/display-mode",
      get(preferences::show::<M, P>).put(preferences::update::<M, P>),
    )
    .layer(DefaultBodyLimit::max(body_limit))
    .with_state(state)
}

#[cfg(test)]
mod tests;
