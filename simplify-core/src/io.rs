use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

/// Prefix of every temporary artifact created by this crate.
pub const ARTIFACT_PREFIX: &str = "simplify-";

/// Creates a fresh, empty temporary artifact.
///
/// - Inside `dir` when given, otherwise in the system temp directory
/// - Removed from disk when the returned handle is dropped
pub fn create_artifact(dir: Option<&Path>) -> io::Result<NamedTempFile> {
	let mut builder = tempfile::Builder::new();
	builder.prefix(ARTIFACT_PREFIX).suffix(".txt");
	match dir {
		Some(dir) => builder.tempfile_in(dir),
		None => builder.tempfile(),
	}
}

/// Writes `lines` to `path`, one per line, replacing any previous content.
pub fn write_lines<P, I, S>(path: P, lines: I) -> io::Result<()>
where
	P: AsRef<Path>,
	I: IntoIterator<Item = S>,
	S: AsRef<str>,
{
	let mut writer = BufWriter::new(File::create(path)?);
	for line in lines {
		writer.write_all(line.as_ref().as_bytes())?;
		writer.write_all(b"\n")?;
	}
	writer.flush()
}

/// Reads a text file and returns all its lines as a `Vec<String>`.
///
/// - Splits on `\n` / `\r\n`
/// - A trailing newline does not produce an extra empty line
pub fn read_lines<P: AsRef<Path>>(path: P) -> io::Result<Vec<String>> {
	BufReader::new(File::open(path)?).lines().collect()
}

/// Returns `true` if `dir` is a directory with at least one entry.
pub(crate) fn is_populated_dir<P: AsRef<Path>>(dir: P) -> bool {
	fs::read_dir(dir).map(|mut entries| entries.next().is_some()).unwrap_or(false)
}

/// Returns the only entry of `dir` if it is a directory.
///
/// Archives usually wrap their content in one top-level folder; this finds it.
pub(crate) fn single_child_dir<P: AsRef<Path>>(dir: P) -> io::Result<Option<PathBuf>> {
	let mut entries = fs::read_dir(dir)?;
	let first = match entries.next() {
		Some(entry) => entry?.path(),
		None => return Ok(None),
	};
	if entries.next().is_some() || !first.is_dir() {
		return Ok(None);
	}
	Ok(Some(first))
}

/// Builds a sibling path of `path` with `suffix` appended to its file name.
///
/// Example:
/// `models/best_model` + `"partial"` → `models/best_model.partial`
pub(crate) fn sibling_path<P: AsRef<Path>>(path: P, suffix: &str) -> io::Result<PathBuf> {
	let path = path.as_ref();

	let parent = path.parent().unwrap_or_else(|| Path::new("."));
	let name = path
		.file_name()
		.ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "Path has no filename"))?;

	let mut sibling = name.to_os_string();
	sibling.push(".");
	sibling.push(suffix);
	Ok(parent.join(sibling))
}
