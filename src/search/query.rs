//! Query string parsing.

use super::tokenize::{is_stop_word, split_words};
use rust_stemmers::Stemmer;

/// A single query word after normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryWord {
    /// Lowercased word as typed.
    pub original: String,
    /// Stemmed form used for index lookups.
    pub stem: String,
}

/// A parsed search query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedQuery {
    /// Words every matching document must contain.
    pub required: Vec<QueryWord>,
    /// Words whose documents are removed from the result (`-word`).
    pub excluded: Vec<QueryWord>,
}

impl ParsedQuery {
    pub fn is_empty(&self) -> bool {
        self.required.is_empty()
    }
}

/// Parses a user query into required and excluded words.
///
/// Whitespace separates chunks; a chunk starting with `-` excludes every word
/// in it. Stop words and words with an empty stem are dropped, and duplicates
/// keep their first occurrence.
pub fn parse_query(query: &str, stemmer: &Stemmer) -> ParsedQuery {
    let mut parsed = ParsedQuery::default();

    for chunk in query.split_whitespace() {
        let (excluded, body) = match chunk.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, chunk),
        };

        for word in split_words(body) {
            let original = word.to_lowercase();
            if is_stop_word(&original) {
                continue;
            }
            let stem = stemmer.stem(&original).into_owned();
            if stem.is_empty() {
                continue;
            }

            let target = if excluded {
                &mut parsed.excluded
            } else {
                &mut parsed.required
            };
            if !target.iter().any(|w| w.stem == stem) {
                target.push(QueryWord { original, stem });
            }
        }
    }

    parsed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::tokenize::english_stemmer;
    use assert2::check;
    use rstest::rstest;

    fn stems(words: &[QueryWord]) -> Vec<&str> {
        words.iter().map(|w| w.stem.as_str()).collect()
    }

    #[rstest]
    #[case("spectrum", &["spectrum"], &[])]
    #[case("Plotting the Gates", &["plot", "gate"], &[])]
    #[case("gate -spectrum", &["gate"], &["spectrum"])]
    #[case("gates gate GATE", &["gate"], &[])]
    #[case("SpecTclGateClient.list", &["spectclgatecli", "list"], &[])]
    fn test_parse_query(
        #[case] query: &str,
        #[case] required: &[&str],
        #[case] excluded: &[&str],
    ) {
        let parsed = parse_query(query, &english_stemmer());
        check!(stems(&parsed.required) == required);
        check!(stems(&parsed.excluded) == excluded);
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("the of a")]
    #[case("-")]
    fn test_empty_queries(#[case] query: &str) {
        check!(parse_query(query, &english_stemmer()).is_empty());
    }

    #[test]
    fn test_original_is_kept_lowercased() {
        let parsed = parse_query("Clients", &english_stemmer());
        check!(parsed.required[0].original == "clients");
        check!(parsed.required[0].stem == "client");
    }
}
