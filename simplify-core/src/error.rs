use std::io;

use thiserror::Error;

/// Errors raised while turning a request into simplified lines.
///
/// Every variant is fatal for the request that produced it. Nothing here is
/// retried: callers get the error exactly as the failing step reported it.
#[derive(Debug, Error)]
pub enum SimplifyError {
	/// A knob is outside its declared range (or is not a number).
	#[error("{name} must be between {min} and {max}, got {value}")]
	InvalidParameter {
		name: &'static str,
		value: f64,
		min: f64,
		max: f64,
	},

	/// The model directory could not be prepared (download, extraction or storage fault).
	#[error("model unavailable: {message}")]
	ModelUnavailable { message: String },

	/// The external simplifier failed while decoding.
	#[error("simplification pipeline failed: {message}")]
	PipelineExecution { message: String },

	/// A temporary artifact could not be created, written or read back.
	#[error("temporary artifact I/O failed: {0}")]
	Artifact(#[from] io::Error),
}

impl SimplifyError {
	pub(crate) fn model_unavailable(message: impl Into<String>) -> Self {
		Self::ModelUnavailable { message: message.into() }
	}

	pub(crate) fn pipeline(message: impl Into<String>) -> Self {
		Self::PipelineExecution { message: message.into() }
	}

	/// Short machine-readable name of the variant.
	///
	/// Used by the HTTP layer to tag error bodies.
	pub fn kind(&self) -> &'static str {
		match self {
			Self::InvalidParameter { .. } => "invalid_parameter",
			Self::ModelUnavailable { .. } => "model_unavailable",
			Self::PipelineExecution { .. } => "pipeline_execution",
			Self::Artifact(_) => "artifact",
		}
	}
}

/// Errors raised while loading `Settings`.
#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("failed to read config file {path}: {source}")]
	Read {
		path: String,
		#[source]
		source: io::Error,
	},

	#[error("failed to parse config file {path}: {source}")]
	Parse {
		path: String,
		#[source]
		source: toml::de::Error,
	},
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn invalid_parameter_message_names_the_range() {
		let error = SimplifyError::InvalidParameter {
			name: "vocab_size",
			value: 4000.0,
			min: 5000.0,
			max: 30000.0,
		};
		assert_eq!(error.to_string(), "vocab_size must be between 5000 and 30000, got 4000");
		assert_eq!(error.kind(), "invalid_parameter");
	}

	#[test]
	fn io_errors_become_artifact_errors() {
		let error: SimplifyError = io::Error::new(io::ErrorKind::NotFound, "gone").into();
		assert_eq!(error.kind(), "artifact");
	}
}
