//! Pretrained model handling.
//!
//! The model itself is opaque: this module only makes sure its directory
//! exists on disk before the simplifier is asked to use it.
//! - `ModelArtifact`: lazily prepared, process-wide model directory
//! - `ModelSource`: where a missing model directory comes from

/// Lazily prepared model directory with a once-guard.
pub mod artifact;

/// Providers able to materialise a model directory (HTTP archive, none).
pub mod source;

pub use artifact::ModelArtifact;
pub use source::{HttpArchiveSource, ModelSource, NoSource};
