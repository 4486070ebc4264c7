use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::model::{HttpArchiveSource, ModelArtifact, ModelSource, NoSource};
use crate::pipeline::CommandPipeline;
use crate::tokenize::Tokenization;
use crate::transform::Transformer;

/// Environment variable holding the path of the config file.
pub const CONFIG_ENV: &str = "SIMPLIFY_CONFIG";

/// Published archive of the pretrained ACCESS model.
pub const DEFAULT_MODEL_URL: &str = "https://dl.fbaipublicfiles.com/access/best_model.tar.gz";

/// Whole configuration, read from TOML.
///
/// Every field has a default, so an empty file (or no file) is valid:
///
/// ```toml
/// [server]
/// port = 5000
///
/// [model]
/// dir = "./resources/models/best_model"
///
/// [pipeline]
/// program = "access-simplify"
/// ```
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct Settings {
	pub server: ServerSettings,
	pub model: ModelSettings,
	pub pipeline: PipelineSettings,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ServerSettings {
	pub host: String,
	pub port: u16,
	pub workers: usize,
	/// Maximum number of memoised results (LRU).
	pub cache_capacity: usize,
	/// Accept cross-origin requests from anywhere.
	pub cors_permissive: bool,
	/// Prepare the model before accepting requests.
	pub prepare_on_start: bool,
}

impl Default for ServerSettings {
	fn default() -> Self {
		Self {
			host: "127.0.0.1".to_owned(),
			port: 5000,
			workers: num_cpus::get(),
			cache_capacity: 256,
			cors_permissive: false,
			prepare_on_start: false,
		}
	}
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ModelSettings {
	pub dir: PathBuf,
	/// Archive downloaded when `dir` is missing. Empty disables downloads.
	pub url: Option<String>,
	pub download_timeout_secs: u64,
}

impl Default for ModelSettings {
	fn default() -> Self {
		Self {
			dir: PathBuf::from("./resources/models/best_model"),
			url: Some(DEFAULT_MODEL_URL.to_owned()),
			download_timeout_secs: 600,
		}
	}
}

impl ModelSettings {
	pub fn source(&self) -> Box<dyn ModelSource> {
		match &self.url {
			Some(url) if !url.trim().is_empty() => Box::new(HttpArchiveSource::new(
				url.clone(),
				Duration::from_secs(self.download_timeout_secs),
			)),
			_ => Box::new(NoSource),
		}
	}

	pub fn artifact(&self) -> ModelArtifact {
		ModelArtifact::new(&self.dir, self.source())
	}
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct PipelineSettings {
	/// External simplifier executable.
	pub program: String,
	/// Arguments placed before the generated ones.
	pub args: Vec<String>,
	pub tokenization: Tokenization,
	/// Directory for temporary artifacts (system temp dir when unset).
	pub scratch_dir: Option<PathBuf>,
}

impl Default for PipelineSettings {
	fn default() -> Self {
		Self {
			program: "access-simplify".to_owned(),
			args: Vec::new(),
			tokenization: Tokenization::Word,
			scratch_dir: None,
		}
	}
}

impl Settings {
	/// Parses settings from TOML text.
	pub fn from_toml(text: &str, origin: &str) -> Result<Self, ConfigError> {
		toml::from_str(text).map_err(|source| ConfigError::Parse {
			path: origin.to_owned(),
			source,
		})
	}

	/// Reads settings from a TOML file.
	pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
			path: path.display().to_string(),
			source,
		})?;
		Self::from_toml(&text, &path.display().to_string())
	}

	/// Resolves the settings to use.
	///
	/// - `explicit` path if given
	/// - else the file named by `SIMPLIFY_CONFIG`
	/// - else built-in defaults
	pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
		if let Some(path) = explicit {
			return Self::from_file(path);
		}
		match env::var_os(CONFIG_ENV) {
			Some(path) if !path.is_empty() => Self::from_file(PathBuf::from(path)),
			_ => Ok(Self::default()),
		}
	}

	/// Builds the transformation adapter these settings describe.
	pub fn transformer(&self) -> Transformer {
		let pipeline = CommandPipeline::new(&self.pipeline.program, &self.pipeline.args);
		let mut transformer = Transformer::new(Arc::new(self.model.artifact()), Arc::new(pipeline))
			.with_tokenization(self.pipeline.tokenization);
		if let Some(dir) = &self.pipeline.scratch_dir {
			transformer = transformer.with_scratch_dir(dir);
		}
		transformer
	}
}
