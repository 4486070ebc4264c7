//! Adapter library around an external text-simplification model.
//!
//! This crate provides everything between a user-facing form and the
//! simplifier itself:
//! - The transformation adapter (`transform::Transformer`)
//! - The presentation-side memoising driver (`presenter::Presenter`)
//! - The lazily prepared model directory (`model::ModelArtifact`)
//! - The seam to the external simplifier (`pipeline::SimplificationPipeline`)
//! - Request validation, configuration and error types
//!
//! The model, its preprocessing algorithms and its decoding strategy are
//! external and opaque: this crate only parameterises and invokes them.

/// Settings loaded from TOML, and construction of a configured `Transformer`.
pub mod config;

/// Error types (`SimplifyError`, `ConfigError`).
pub mod error;

/// Line-oriented file helpers and temporary artifacts.
pub mod io;

/// Exact-value memoisation cache, unbounded or LRU.
pub mod memo;

/// Model directory preparation.
pub mod model;

/// External simplifier seam and its command-line implementation.
pub mod pipeline;

/// Preprocessing stage parameters handed to the simplifier.
pub mod preprocessor;

/// Render-pass driver with memoisation.
pub mod presenter;

/// Scoped log suppression.
pub mod quiet;

/// Requests, control ranges and validation.
pub mod request;

/// Word tokenization applied before simplification.
pub mod tokenize;

/// The transformation adapter.
pub mod transform;

pub use error::SimplifyError;
pub use request::SimplificationRequest;
pub use transform::{Transform, Transformer};
