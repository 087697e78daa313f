//! Word extraction, stop-word filtering and stemming shared by index
//! generation and query parsing.

use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use std::sync::LazyLock;

/// English stop words dropped from both the index and queries.
pub const STOP_WORDS: &[&str] = &[
    "a", "and", "are", "as", "at", "be", "but", "by", "for", "if", "in", "into", "is", "it",
    "near", "no", "not", "of", "on", "or", "such", "that", "the", "their", "then", "there",
    "these", "they", "this", "to", "was", "will", "with",
];

static WORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\w+").expect("valid word regex"));

/// Creates the stemmer used for every index term.
pub fn english_stemmer() -> Stemmer {
    Stemmer::create(Algorithm::English)
}

/// Splits text into word runs (`\w+`, Unicode aware).
pub fn split_words(text: &str) -> impl Iterator<Item = &str> {
    WORD_RE.find_iter(text).map(|m| m.as_str())
}

pub fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.contains(&word)
}

/// Whether a (lowercased) word is worth indexing.
pub fn word_filter(word: &str) -> bool {
    !word.is_empty() && !is_stop_word(word)
}

/// Lowercases and stems a single word.
pub fn stem_word(word: &str, stemmer: &Stemmer) -> String {
    let lowercase = word.to_lowercase();
    stemmer.stem(&lowercase).into_owned()
}

/// Produces the index terms for a block of text.
///
/// The stem is kept when it passes [`word_filter`]; otherwise the lowercased
/// word itself is tried, so a stem that collapses onto a stop word does not
/// lose the original.
pub fn index_terms(text: &str, stemmer: &Stemmer) -> Vec<String> {
    let mut tokens = vec![];
    for word in split_words(text) {
        let lowercase = word.to_lowercase();
        let stemmed = stemmer.stem(&lowercase);
        if word_filter(&stemmed) {
            tokens.push(stemmed.into_owned());
        } else if word_filter(&lowercase) {
            tokens.push(lowercase);
        }
    }
    tokens
}
