//! Document capture for the Cursos.vet profile flow.
//!
//! Turns an uploaded identity-document image into structured fields by
//! asking a hosted vision model, and sequences that step after contact
//! collection.
//!
//! - [`pipeline::ExtractionPipeline`] stages an image, calls the model and
//!   merges the parsed fields into the visitor's profile.
//! - [`flow::CaptureFlow`] owns one visitor's profile, modal state and
//!   pipeline.
//! - [`gemini::GeminiModel`] is the production [`model::DocumentModel`].
//! - [`registry::RegistryClient`] is the optional CRMV lookup stage.

#![allow(async_fn_in_trait)]

pub mod error;
pub mod flow;
pub mod gemini;
pub mod image;
pub mod model;
pub mod pipeline;
pub mod prompt;
pub mod registry;
pub mod reply;

pub use error::{Error, ExtractionError, Result};
