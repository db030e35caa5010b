//! Core types and trait definitions for the Cursos.vet profile capture flow.
//!
//! This crate is deliberately free of HTTP and database dependencies. It owns
//! the visitor profile, the contact-form rules, the chat-widget message
//! shapes and the storage seams; every other crate depends on it.

#![allow(async_fn_in_trait)]

pub mod error;
pub mod event;
pub mod preference;
pub mod profile;
pub mod store;
pub mod validation;

pub use error::{Error, Result};
