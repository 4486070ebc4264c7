//! Seam between the adapter and the external simplifier.
//!
//! The simplifier (preprocessing stages, beam search, vocabulary) is an
//! opaque collaborator. Everything it needs for one call is bundled into a
//! `PipelineJob`; implementations read the source file and write one output
//! line per input line to the prediction file.

use std::path::Path;

use crate::error::SimplifyError;
use crate::preprocessor::Preprocessor;

/// Runs the simplifier as an external program.
pub mod command;

pub use command::CommandPipeline;

/// Everything a simplifier needs for one call.
#[derive(Debug, Clone, Copy)]
pub struct PipelineJob<'a> {
	/// Prepared model directory.
	pub model_dir: &'a Path,
	/// Beam width used for decoding.
	pub beam: usize,
	/// Preprocessing stages, in application order.
	pub preprocessors: &'a [Preprocessor],
	/// Tokenized input, one sentence per line.
	pub source: &'a Path,
	/// Where the simplified lines must be written.
	pub prediction: &'a Path,
}

/// A simplifier composed with its preprocessing stages.
///
/// Implemented by `CommandPipeline` in production and by deterministic
/// fakes in tests.
pub trait SimplificationPipeline: Send + Sync {
	/// Simplifies `job.source` into `job.prediction`.
	///
	/// # Errors
	/// Implementations report any failure as `SimplifyError::PipelineExecution`.
	fn run(&self, job: &PipelineJob<'_>) -> Result<(), SimplifyError>;
}
