//! Relevance weights for document and object matches.

use serde::{Deserialize, Serialize};

/// Score contributions per kind of match.
///
/// The defaults reproduce the ranking of the documentation site's own search
/// page, so results line up with what readers see in a browser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Scorer {
    /// Exact hit in `titleterms`.
    pub title: i32,
    /// Query word is a substring of a title term.
    pub partial_title: i32,
    /// Exact hit in `terms`.
    pub term: i32,
    /// Query word is a substring of a term.
    pub partial_term: i32,
    /// Query equals an object's name or full name.
    pub obj_name_match: i32,
    /// Query is contained in the last component of the object's name.
    pub obj_partial_match: i32,
    /// Bonus for priority 0 (important) objects.
    pub obj_prio0: i32,
    /// Bonus for priority 1 (default) objects.
    pub obj_prio1: i32,
    /// Bonus for priority 2 (unimportant) objects.
    pub obj_prio2: i32,
    /// Bonus for any other priority.
    pub obj_prio_default: i32,
}

impl Default for Scorer {
    fn default() -> Self {
        Self {
            title: 15,
            partial_title: 7,
            term: 5,
            partial_term: 2,
            obj_name_match: 11,
            obj_partial_match: 6,
            obj_prio0: 15,
            obj_prio1: 5,
            obj_prio2: -5,
            obj_prio_default: 0,
        }
    }
}

impl Scorer {
    pub const fn object_priority(&self, priority: i32) -> i32 {
        match priority {
            0 => self.obj_prio0,
            1 => self.obj_prio1,
            2 => self.obj_prio2,
            _ => self.obj_prio_default,
        }
    }

    /// Scores a lowercased query against an object.
    ///
    /// `fullname` and `name` must already be lowercased. Returns `None` when the
    /// query is not contained in the full name.
    pub fn object_match(&self, query: &str, fullname: &str, name: &str, priority: i32) -> Option<i32> {
        if query.is_empty() || !fullname.contains(query) {
            return None;
        }
        let last = fullname.rsplit('.').next().unwrap_or(fullname);
        let mut score = 0;
        if fullname == query || name == query {
            score += self.obj_name_match;
        } else if last.contains(query) {
            score += self.obj_partial_match;
        }
        Some(score + self.object_priority(priority))
    }
}

/// Converts a raw score into a percentage of the best score in a result set.
pub fn relative_relevance(score: i32, best: i32) -> u8 {
    if best <= 0 {
        return 100;
    }
    let ratio = f64::from(score.max(0)) / f64::from(best);
    (ratio * 100.0).round().clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;
    use rstest::rstest;

    #[rstest]
    #[case("spectrum", "spectcl.spectrum", "spectrum", 1, Some(16))]
    #[case("spectcl.spectrum", "spectcl.spectrum", "spectrum", 1, Some(16))]
    #[case("spec", "spectcl.spectrum", "spectrum", 1, Some(11))]
    #[case("spectcl", "spectcl.spectrum.plot", "plot", 1, Some(5))]
    #[case("gate", "spectcl.spectrum", "spectrum", 1, None)]
    #[case("plot", "spectcl.spectrum.plot", "plot", 0, Some(26))]
    #[case("", "spectcl.spectrum", "spectrum", 1, None)]
    fn test_object_match(
        #[case] query: &str,
        #[case] fullname: &str,
        #[case] name: &str,
        #[case] priority: i32,
        #[case] expected: Option<i32>,
    ) {
        check!(Scorer::default().object_match(query, fullname, name, priority) == expected);
    }

    #[rstest]
    #[case(0, 15)]
    #[case(1, 5)]
    #[case(2, -5)]
    #[case(-1, 0)]
    fn test_object_priority(#[case] priority: i32, #[case] expected: i32) {
        check!(Scorer::default().object_priority(priority) == expected);
    }

    #[rstest]
    #[case(20, 20, 100)]
    #[case(10, 20, 50)]
    #[case(-3, 20, 0)]
    #[case(5, 0, 100)]
    fn test_relative_relevance(#[case] score: i32, #[case] best: i32, #[case] expected: u8) {
        check!(relative_relevance(score, best) == expected);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let scorer: Scorer = toml::from_str("title = 20").unwrap();
        check!(scorer.title == 20);
        check!(scorer.term == Scorer::default().term);
    }
}
