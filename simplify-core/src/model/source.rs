use std::error::Error;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;
use std::time::Duration;

use flate2::read::GzDecoder;
use reqwest::blocking::Client;

/// Error type returned by sources. Wrapped into `ModelUnavailable` by the caller.
pub type SourceError = Box<dyn Error + Send + Sync>;

/// Something able to fill an empty directory with a model.
///
/// Implementations write into `destination`, which exists and is empty when
/// `fetch` is called. They never need to clean up after a failure: the
/// caller discards `destination` on error.
pub trait ModelSource: Send + Sync {
	fn fetch(&self, destination: &Path) -> Result<(), SourceError>;

	/// Human readable origin, for logs.
	fn describe(&self) -> String;
}

/// Downloads a gzipped tarball over HTTP and unpacks it.
#[derive(Debug, Clone)]
pub struct HttpArchiveSource {
	url: String,
	timeout: Duration,
}

impl HttpArchiveSource {
	pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
		Self { url: url.into(), timeout }
	}
}

impl ModelSource for HttpArchiveSource {
	fn fetch(&self, destination: &Path) -> Result<(), SourceError> {
		let client = Client::builder().timeout(self.timeout).build()?;
		let mut response = client.get(&self.url).send()?.error_for_status()?;

		// Spool to disk first: model archives are too large to buffer in memory
		let mut archive = tempfile::tempfile()?;
		let size = response.copy_to(&mut archive)?;
		log::debug!("downloaded {size} bytes from {}", self.url);

		archive.seek(SeekFrom::Start(0))?;
		unpack_tar_gz(archive, destination)?;
		Ok(())
	}

	fn describe(&self) -> String {
		self.url.clone()
	}
}

/// Used when the model directory is provisioned out of band.
///
/// Fetching always fails, so a missing directory surfaces as
/// `ModelUnavailable` instead of an attempt to download.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSource;

impl ModelSource for NoSource {
	fn fetch(&self, _destination: &Path) -> Result<(), SourceError> {
		Err("no model source configured and the model directory is empty".into())
	}

	fn describe(&self) -> String {
		"nowhere (no source configured)".to_owned()
	}
}

/// Unpacks a `.tar.gz` stream into `destination`.
pub fn unpack_tar_gz<R: Read>(reader: R, destination: &Path) -> io::Result<()> {
	tar::Archive::new(GzDecoder::new(reader)).unpack(destination)
}
