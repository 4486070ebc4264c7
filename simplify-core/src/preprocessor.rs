use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use crate::request::SimplificationRequest;

/// One parameterised preprocessing stage handed to the external simplifier.
///
/// Only the parameters live here. What each stage does to the text is owned
/// by the simplifier itself.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Preprocessor {
	LengthRatio { target_ratio: f64 },
	Levenshtein { target_ratio: f64 },
	WordRankRatio { target_ratio: f64 },
	SentencePiece { vocab_size: u32 },
}

impl Preprocessor {
	/// Stage name as the external simplifier knows it.
	pub fn name(&self) -> &'static str {
		match self {
			Self::LengthRatio { .. } => "LengthRatioPreprocessor",
			Self::Levenshtein { .. } => "LevenshteinPreprocessor",
			Self::WordRankRatio { .. } => "WordRankRatioPreprocessor",
			Self::SentencePiece { .. } => "SentencePiecePreprocessor",
		}
	}
}

#[derive(Serialize)]
struct TargetRatio {
	target_ratio: f64,
}

#[derive(Serialize)]
struct VocabSize {
	vocab_size: u32,
}

/// Keyword arguments of a single stage, e.g. `{"target_ratio": 0.95}`.
impl Serialize for Preprocessor {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		match *self {
			Self::LengthRatio { target_ratio }
			| Self::Levenshtein { target_ratio }
			| Self::WordRankRatio { target_ratio } => TargetRatio { target_ratio }.serialize(serializer),
			Self::SentencePiece { vocab_size } => VocabSize { vocab_size }.serialize(serializer),
		}
	}
}

/// The full parameterisation surface of the simplifier.
///
/// Serializes as a mapping from stage name to keyword arguments, written in
/// stage order:
///
/// ```json
/// {"LengthRatioPreprocessor": {"target_ratio": 0.95},
///  "LevenshteinPreprocessor": {"target_ratio": 0.75},
///  "WordRankRatioPreprocessor": {"target_ratio": 0.75},
///  "SentencePiecePreprocessor": {"vocab_size": 10000}}
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct PreprocessorConfig {
	stages: [Preprocessor; 4],
}

impl PreprocessorConfig {
	pub fn new(length_ratio: f64, levenshtein_ratio: f64, word_rank_ratio: f64, vocab_size: u32) -> Self {
		Self {
			stages: [
				Preprocessor::LengthRatio { target_ratio: length_ratio },
				Preprocessor::Levenshtein { target_ratio: levenshtein_ratio },
				Preprocessor::WordRankRatio { target_ratio: word_rank_ratio },
				Preprocessor::SentencePiece { vocab_size },
			],
		}
	}

	/// Stages in the fixed order the simplifier applies them.
	pub fn stages(&self) -> Vec<Preprocessor> {
		self.stages.to_vec()
	}
}

impl From<&SimplificationRequest> for PreprocessorConfig {
	fn from(request: &SimplificationRequest) -> Self {
		Self::new(
			request.length_ratio,
			request.levenshtein_ratio,
			request.word_rank_ratio,
			request.vocab_size,
		)
	}
}

impl Serialize for PreprocessorConfig {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serialize_stages(&self.stages, serializer)
	}
}

/// Writes `stages` as an ordered `{name: kwargs}` mapping.
pub(crate) fn serialize_stages<S: Serializer>(stages: &[Preprocessor], serializer: S) -> Result<S::Ok, S::Error> {
	let mut map = serializer.serialize_map(Some(stages.len()))?;
	for stage in stages {
		map.serialize_entry(stage.name(), stage)?;
	}
	map.end()
}
