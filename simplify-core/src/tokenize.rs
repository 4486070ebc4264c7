use serde::{Deserialize, Serialize};

/// Characters split off the front of a word.
const LEADING: [char; 5] = ['"', '(', '[', '{', '`'];

/// Characters split off the end of a word.
///
/// A period is only split when it ends a sentence (see `word_tokenize`).
const TRAILING: [char; 10] = [',', ';', ':', '!', '?', ')', ']', '}', '"', '\''];

/// Clitics separated from the word they are attached to.
///
/// Checked in order, case-insensitively.
const CONTRACTIONS: [&str; 7] = ["n't", "'ll", "'re", "'ve", "'s", "'m", "'d"];

/// Words whose period never ends a sentence, lowercase and without the period.
const ABBREVIATIONS: [&str; 24] = [
	"mr", "mrs", "ms", "dr", "prof", "sr", "jr", "st", "mt", "vs", "etc", "inc", "ltd", "co", "corp",
	"gen", "gov", "sen", "rep", "jan", "feb", "aug", "sept", "oct",
];

/// How input lines are tokenized before they reach the simplifier.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Tokenization {
	/// Treebank-style word tokenization (`word_tokenize`).
	#[default]
	Word,
	/// Lines are forwarded untouched.
	None,
}

impl Tokenization {
	pub fn apply(&self, line: &str) -> String {
		match self {
			Self::Word => word_tokenize(line),
			Self::None => line.to_owned(),
		}
	}
}

/// Splits a line into space-separated word tokens.
///
/// Treebank-style rules:
/// - whitespace runs collapse to single spaces
/// - opening quotes and brackets are split from the front of a word
/// - closing punctuation is split from the end of a word
/// - a period (or ellipsis) is split where a sentence ends: on the last
///   word, or before a capitalised word unless it follows an abbreviation
///   (`Mr.`, an initial such as `J.`, or a dotted form such as `U.S.`)
/// - clitics are separated: `don't` → `do n't`, `it's` → `it 's`
///
/// Examples:
/// - `"The cat sat on the mat."` → `"The cat sat on the mat ."`
/// - `"It rained. Then it stopped."` → `"It rained . Then it stopped ."`
/// - `"I can't (really) go!"` → `"I ca n't ( really ) go !"`
pub fn word_tokenize(line: &str) -> String {
	let words: Vec<&str> = line.split_whitespace().collect();
	let last = words.len().saturating_sub(1);

	let mut tokens: Vec<&str> = Vec::with_capacity(words.len() * 2);
	for (index, word) in words.iter().enumerate() {
		let sentence_final = index == last
			|| (words.get(index + 1).is_some_and(|next| opens_sentence(next)) && !is_abbreviation(word));
		split_word(word, sentence_final, &mut tokens);
	}

	tokens.join(" ")
}

fn opens_sentence(word: &str) -> bool {
	word.trim_start_matches(&LEADING[..]).chars().next().is_some_and(char::is_uppercase)
}

fn is_abbreviation(word: &str) -> bool {
	let stem = word.trim_start_matches(&LEADING[..]).trim_end_matches('.');
	let mut chars = stem.chars();
	let initial = matches!((chars.next(), chars.next()), (Some(c), None) if c.is_alphabetic());
	initial || stem.contains('.') || ABBREVIATIONS.iter().any(|a| a.eq_ignore_ascii_case(stem))
}

fn split_word<'a>(word: &'a str, sentence_final: bool, tokens: &mut Vec<&'a str>) {
	let mut rest = word;

	// Leading punctuation, left to right
	while let Some(c) = rest.chars().next() {
		if !LEADING.contains(&c) || rest.len() == c.len_utf8() {
			break;
		}
		let (head, tail) = rest.split_at(c.len_utf8());
		tokens.push(head);
		rest = tail;
	}

	// Trailing punctuation, collected right to left
	let mut trailing: Vec<&'a str> = Vec::new();
	loop {
		if sentence_final && rest.len() > 3 && rest.ends_with("...") {
			let (head, tail) = rest.split_at(rest.len() - 3);
			trailing.push(tail);
			rest = head;
			continue;
		}
		match rest.chars().next_back() {
			Some(c)
				if rest.len() > c.len_utf8() && (TRAILING.contains(&c) || (c == '.' && sentence_final)) =>
			{
				let (head, tail) = rest.split_at(rest.len() - c.len_utf8());
				trailing.push(tail);
				rest = head;
			}
			_ => break,
		}
	}

	match split_contraction(rest) {
		Some((stem, clitic)) => {
			tokens.push(stem);
			tokens.push(clitic);
		}
		None => tokens.push(rest),
	}
	tokens.extend(trailing.into_iter().rev());
}

fn split_contraction(word: &str) -> Option<(&str, &str)> {
	CONTRACTIONS.iter().find_map(|suffix| {
		if word.len() <= suffix.len() {
			return None;
		}
		let at = word.len() - suffix.len();
		let tail = word.get(at..)?;
		if tail.eq_ignore_ascii_case(suffix) {
			Some(word.split_at(at))
		} else {
			None
		}
	})
}
