use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};

use log::{debug, info, warn};

use super::source::ModelSource;
use crate::error::SimplifyError;
use crate::io::{is_populated_dir, sibling_path, single_child_dir};

/// Process-wide pretrained model directory.
///
/// The directory is prepared at most once, on the first `ensure_ready`
/// call, and is read-only afterwards.
///
/// ## Preparation
/// - An already populated directory is used as-is (no-op)
/// - Otherwise the `ModelSource` fills a `<dir>.partial` staging directory,
///   which is renamed into place only once complete
/// - A failed preparation leaves nothing behind and is retried by the next call
///
/// ## Concurrency
/// `ready` is the lock-free fast path. `init` serialises first-time
/// preparation so concurrent callers never fetch the model twice.
pub struct ModelArtifact {
	dir: PathBuf,
	source: Box<dyn ModelSource>,
	ready: OnceLock<PathBuf>,
	init: Mutex<()>,
}

impl ModelArtifact {
	pub fn new(dir: impl Into<PathBuf>, source: Box<dyn ModelSource>) -> Self {
		Self {
			dir: dir.into(),
			source,
			ready: OnceLock::new(),
			init: Mutex::new(()),
		}
	}

	/// Configured model directory (may not exist yet).
	pub fn dir(&self) -> &Path {
		&self.dir
	}

	/// Returns `true` if the directory is already usable without fetching.
	pub fn is_prepared(&self) -> bool {
		self.ready.get().is_some() || is_populated_dir(&self.dir)
	}

	/// Makes sure the model directory is present and returns its path.
	///
	/// # Errors
	/// Returns `SimplifyError::ModelUnavailable` if the source fails or the
	/// directory cannot be written.
	pub fn ensure_ready(&self) -> Result<&Path, SimplifyError> {
		if let Some(dir) = self.ready.get() {
			return Ok(dir);
		}

		let _init = self
			.init
			.lock()
			.map_err(|_| SimplifyError::model_unavailable("model preparation lock poisoned"))?;

		// Another caller may have finished while we were waiting
		if let Some(dir) = self.ready.get() {
			return Ok(dir);
		}

		if is_populated_dir(&self.dir) {
			debug!("model found at {}", self.dir.display());
		} else {
			self.prepare()?;
		}

		Ok(self.ready.get_or_init(|| self.dir.clone()))
	}

	fn prepare(&self) -> Result<(), SimplifyError> {
		info!("preparing model {} from {}", self.dir.display(), self.source.describe());

		let staging = sibling_path(&self.dir, "partial").map_err(storage_fault)?;
		if staging.exists() {
			warn!("removing stale staging directory {}", staging.display());
			fs::remove_dir_all(&staging).map_err(storage_fault)?;
		}
		fs::create_dir_all(&staging).map_err(storage_fault)?;

		let installed = self
			.source
			.fetch(&staging)
			.map_err(|e| SimplifyError::model_unavailable(e.to_string()))
			.and_then(|_| self.install(&staging));

		if staging.exists() {
			if let Err(e) = fs::remove_dir_all(&staging) {
				warn!("could not remove staging directory {}: {e}", staging.display());
			}
		}

		installed?;
		info!("model ready at {}", self.dir.display());
		Ok(())
	}

	/// Moves the fetched content of `staging` to the model directory.
	fn install(&self, staging: &Path) -> Result<(), SimplifyError> {
		if !is_populated_dir(staging) {
			return Err(SimplifyError::model_unavailable("model source produced an empty directory"));
		}

		let root = single_child_dir(staging)
			.map_err(storage_fault)?
			.unwrap_or_else(|| staging.to_owned());

		if let Some(parent) = self.dir.parent() {
			fs::create_dir_all(parent).map_err(storage_fault)?;
		}
		// Leftover empty directory from a previous run
		if self.dir.is_dir() {
			fs::remove_dir(&self.dir).map_err(storage_fault)?;
		}
		fs::rename(&root, &self.dir).map_err(storage_fault)
	}
}

fn storage_fault(error: io::Error) -> SimplifyError {
	SimplifyError::model_unavailable(format!("storage fault: {error}"))
}
