use crate::memo::Memo;
use crate::request::{RequestKey, SimplificationRequest};
use crate::transform::Transform;

/// Label shown above the output area.
pub const OUTPUT_LABEL: &str = "Transformed input";

/// Text shown under `OUTPUT_LABEL`: the lines joined by newlines.
pub fn display(lines: &[String]) -> String {
	lines.join("\n")
}

/// Presentation-side driver of a `Transform`.
///
/// Called on every render pass with the current control values. Identical
/// five-field tuples are answered from the memo cache, so the transform runs
/// once per distinct input no matter how often the surface redraws.
pub struct Presenter<T> {
	transformer: T,
	memo: Memo<RequestKey, Vec<String>>,
}

impl<T: Transform> Presenter<T> {
	/// Presenter with an unbounded cache (single user, process lifetime).
	pub fn new(transformer: T) -> Self {
		Self::with_memo(transformer, Memo::unbounded())
	}

	pub fn with_memo(transformer: T, memo: Memo<RequestKey, Vec<String>>) -> Self {
		Self { transformer, memo }
	}

	/// Returns the lines for `request`, transforming only on a cache miss.
	///
	/// # Errors
	/// Whatever the transform reports. Failures are not cached.
	pub fn render(&mut self, request: &SimplificationRequest) -> Result<&[String], T::Error> {
		let transformer = &self.transformer;
		self.memo
			.get_or_try_insert_with(request.key(), || transformer.transform(request))
			.map(Vec::as_slice)
	}

	pub fn transformer(&self) -> &T {
		&self.transformer
	}

	pub fn cache(&self) -> &Memo<RequestKey, Vec<String>> {
		&self.memo
	}
}
