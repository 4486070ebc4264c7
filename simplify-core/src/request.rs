use serde::{Deserialize, Serialize};

use crate::error::SimplifyError;

/// Description of one bounded numeric control.
///
/// Shared by the UI (slider ranges) and the server (`/v1/parameters`) so that
/// both surfaces agree on what a valid request looks like.
#[derive(Serialize, Clone, Copy, Debug, PartialEq)]
pub struct ControlSpec {
	/// Request field name.
	pub name: &'static str,
	/// Preprocessing stage the value is forwarded to.
	pub stage: &'static str,
	pub min: f64,
	pub max: f64,
	pub default: f64,
	pub step: f64,
}

impl ControlSpec {
	/// Returns `true` if `value` lies inside `[min, max]`.
	///
	/// NaN is never accepted.
	pub fn accepts(&self, value: f64) -> bool {
		(self.min..=self.max).contains(&value)
	}

	fn check(&self, value: f64) -> Result<(), SimplifyError> {
		if self.accepts(value) {
			Ok(())
		} else {
			Err(SimplifyError::InvalidParameter {
				name: self.name,
				value,
				min: self.min,
				max: self.max,
			})
		}
	}
}

pub const LENGTH_RATIO: ControlSpec = ControlSpec {
	name: "length_ratio",
	stage: "LengthRatioPreprocessor",
	min: 0.0,
	max: 1.0,
	default: 0.95,
	step: 0.05,
};

pub const LEVENSHTEIN_RATIO: ControlSpec = ControlSpec {
	name: "levenshtein_ratio",
	stage: "LevenshteinPreprocessor",
	min: 0.0,
	max: 1.0,
	default: 0.75,
	step: 0.05,
};

pub const WORD_RANK_RATIO: ControlSpec = ControlSpec {
	name: "word_rank_ratio",
	stage: "WordRankRatioPreprocessor",
	min: 0.0,
	max: 1.0,
	default: 0.75,
	step: 0.05,
};

pub const VOCAB_SIZE: ControlSpec = ControlSpec {
	name: "vocab_size",
	stage: "SentencePiecePreprocessor",
	min: 5000.0,
	max: 30000.0,
	default: 10000.0,
	step: 5000.0,
};

/// All controls, in stage order.
pub const CONTROLS: [ControlSpec; 4] = [LENGTH_RATIO, LEVENSHTEIN_RATIO, WORD_RANK_RATIO, VOCAB_SIZE];

/// One simplification request: the raw text and the four knobs.
///
/// Missing knobs deserialize to their defaults, so `{"text": "..."}` is a
/// complete request.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SimplificationRequest {
	/// Raw input, possibly several newline-delimited lines.
	pub text: String,
	#[serde(default = "default_length_ratio")]
	pub length_ratio: f64,
	#[serde(default = "default_levenshtein_ratio")]
	pub levenshtein_ratio: f64,
	#[serde(default = "default_word_rank_ratio")]
	pub word_rank_ratio: f64,
	#[serde(default = "default_vocab_size")]
	pub vocab_size: u32,
}

fn default_length_ratio() -> f64 {
	LENGTH_RATIO.default
}

fn default_levenshtein_ratio() -> f64 {
	LEVENSHTEIN_RATIO.default
}

fn default_word_rank_ratio() -> f64 {
	WORD_RANK_RATIO.default
}

fn default_vocab_size() -> u32 {
	VOCAB_SIZE.default as u32
}

impl Default for SimplificationRequest {
	fn default() -> Self {
		Self::new("")
	}
}

impl SimplificationRequest {
	/// Creates a request for `text` with every knob at its default.
	pub fn new(text: impl Into<String>) -> Self {
		Self {
			text: text.into(),
			length_ratio: default_length_ratio(),
			levenshtein_ratio: default_levenshtein_ratio(),
			word_rank_ratio: default_word_rank_ratio(),
			vocab_size: default_vocab_size(),
		}
	}

	/// Checks every knob against its `ControlSpec`.
	///
	/// # Errors
	/// Returns `SimplifyError::InvalidParameter` for the first knob out of range.
	pub fn validate(&self) -> Result<(), SimplifyError> {
		LENGTH_RATIO.check(self.length_ratio)?;
		LEVENSHTEIN_RATIO.check(self.levenshtein_ratio)?;
		WORD_RANK_RATIO.check(self.word_rank_ratio)?;
		VOCAB_SIZE.check(f64::from(self.vocab_size))
	}

	/// Exact-value memo key over all five fields.
	pub fn key(&self) -> RequestKey {
		RequestKey {
			text: self.text.clone(),
			length_ratio: ratio_bits(self.length_ratio),
			levenshtein_ratio: ratio_bits(self.levenshtein_ratio),
			word_rank_ratio: ratio_bits(self.word_rank_ratio),
			vocab_size: self.vocab_size,
		}
	}
}

/// Bit pattern of a ratio, with `-0.0` folded into `0.0`.
fn ratio_bits(value: f64) -> u64 {
	if value == 0.0 { 0.0_f64.to_bits() } else { value.to_bits() }
}

/// Hashable identity of a `SimplificationRequest`.
///
/// Ratios are compared by bit pattern: two requests share a key only when
/// every field is exactly equal (`-0.0` and `0.0` count as equal).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RequestKey {
	text: String,
	length_ratio: u64,
	levenshtein_ratio: u64,
	word_rank_ratio: u64,
	vocab_size: u32,
}
