//! Core business logic for terapie.
//!
//! Services sit between the HTTP layer and the repositories: they validate
//! input, enforce who may do what, and send the resulting emails and
//! realtime events.

pub mod services;

pub use services::*;
