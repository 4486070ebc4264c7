use std::path::PathBuf;
use std::sync::Arc;

use log::debug;

use crate::error::SimplifyError;
use crate::io::{create_artifact, read_lines, write_lines};
use crate::model::ModelArtifact;
use crate::pipeline::{PipelineJob, SimplificationPipeline};
use crate::preprocessor::PreprocessorConfig;
use crate::quiet::QuietGuard;
use crate::request::SimplificationRequest;
use crate::tokenize::Tokenization;

/// Beam width used for decoding: a single candidate (greedy). Not configurable.
pub const BEAM_WIDTH: usize = 1;

/// Anything able to turn a request into simplified lines.
///
/// Implemented by the local `Transformer` and by remote clients, so the
/// presentation layer does not care where the work happens.
pub trait Transform {
	type Error;

	fn transform(&self, request: &SimplificationRequest) -> Result<Vec<String>, Self::Error>;
}

impl<T: Transform + ?Sized> Transform for &T {
	type Error = T::Error;

	fn transform(&self, request: &SimplificationRequest) -> Result<Vec<String>, Self::Error> {
		(**self).transform(request)
	}
}

/// The transformation adapter.
///
/// Turns the raw text and the four knobs into a call to the external
/// simplifier and returns its output lines.
///
/// ## Steps
/// 1. Validate the knobs
/// 2. Split the text into lines and tokenize each one
/// 3. Write them to a temporary source artifact
/// 4. Make sure the model is prepared
/// 5. Run the pipeline (logging silenced) into a temporary prediction artifact
/// 6. Read the prediction back
///
/// Both artifacts are dropped, and so removed, on every exit path.
pub struct Transformer {
	model: Arc<ModelArtifact>,
	pipeline: Arc<dyn SimplificationPipeline>,
	tokenization: Tokenization,
	scratch_dir: Option<PathBuf>,
}

impl Transformer {
	pub fn new(model: Arc<ModelArtifact>, pipeline: Arc<dyn SimplificationPipeline>) -> Self {
		Self {
			model,
			pipeline,
			tokenization: Tokenization::default(),
			scratch_dir: None,
		}
	}

	pub fn with_tokenization(mut self, tokenization: Tokenization) -> Self {
		self.tokenization = tokenization;
		self
	}

	/// Creates temporary artifacts in `dir` instead of the system temp directory.
	pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
		self.scratch_dir = Some(dir.into());
		self
	}

	/// Shared model artifact, e.g. to report its status or warm it up.
	pub fn model(&self) -> &Arc<ModelArtifact> {
		&self.model
	}

	/// Simplifies `request.text`, one output line per input line.
	///
	/// Empty text yields an empty result without touching the model.
	///
	/// # Errors
	/// - `InvalidParameter` if a knob is out of range
	/// - `ModelUnavailable` if the model cannot be prepared
	/// - `PipelineExecution` if the simplifier fails
	/// - `Artifact` if a temporary file cannot be written or read
	pub fn transform(&self, request: &SimplificationRequest) -> Result<Vec<String>, SimplifyError> {
		request.validate()?;

		let lines: Vec<String> = request.text.lines().map(|line| self.tokenization.apply(line)).collect();
		if lines.is_empty() {
			return Ok(Vec::new());
		}

		let scratch = self.scratch_dir.as_deref();
		let source = create_artifact(scratch)?;
		write_lines(source.path(), &lines)?;

		let model_dir = self.model.ensure_ready()?;

		let preprocessors = PreprocessorConfig::from(request).stages();
		let prediction = create_artifact(scratch)?;
		let job = PipelineJob {
			model_dir,
			beam: BEAM_WIDTH,
			preprocessors: &preprocessors,
			source: source.path(),
			prediction: prediction.path(),
		};

		debug!("simplifying {} line(s) with beam {BEAM_WIDTH}", lines.len());
		{
			let _quiet = QuietGuard::acquire();
			self.pipeline.run(&job)?;
		}

		let output = read_lines(prediction.path())?;
		debug!("simplifier returned {} line(s)", output.len());
		Ok(output)
	}
}

impl Transform for Transformer {
	type Error = SimplifyError;

	fn transform(&self, request: &SimplificationRequest) -> Result<Vec<String>, Self::Error> {
		Transformer::transform(self, request)
	}
}
