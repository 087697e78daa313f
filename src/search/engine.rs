//! Query resolution against a loaded search index.

use super::query::{ParsedQuery, QueryWord, parse_query};
use super::scoring::Scorer;
use super::tokenize::english_stemmer;
use crate::index::{DocRefs, SearchIndex, full_object_name};
use ahash::{AHashMap, AHashSet};
use rapidfuzz::distance::jaro_winkler;
use rust_stemmers::Stemmer;
use serde::Serialize;
use std::collections::BTreeMap;

/// Default minimum query word length for substring (partial) matches.
pub const DEFAULT_MIN_PARTIAL_LEN: usize = 3;

/// Minimum Jaro-Winkler similarity for a "did you mean" suggestion.
const SUGGESTION_THRESHOLD: f64 = 0.8;

const MAX_SUGGESTIONS: usize = 5;

/// A matching document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentHit {
    pub doc: usize,
    pub docname: String,
    pub filename: String,
    pub title: String,
    pub score: i32,
}

/// A matching API object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectHit {
    pub fullname: String,
    pub namespace: String,
    pub name: String,
    /// `domain:role`, e.g. `py:method`.
    pub role: String,
    /// Display label, e.g. `Python method`.
    pub label: Option<String>,
    pub docname: String,
    pub title: String,
    pub anchor: String,
    pub score: i32,
}

/// Results of one query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchResults {
    pub documents: Vec<DocumentHit>,
    pub objects: Vec<ObjectHit>,
    /// Index terms close to query words that matched nothing.
    pub suggestions: Vec<String>,
}

impl SearchResults {
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty() && self.objects.is_empty()
    }
}

/// Optional filter for [`SearchEngine::list_objects`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjectFilter<'q> {
    /// Restrict to one namespace (exact match).
    pub namespace: Option<&'q str>,
    /// Restrict to a role, e.g. `class` or `py:class`.
    pub kind: Option<&'q str>,
}

/// Read-only search over a [`SearchIndex`].
pub struct SearchEngine<'a> {
    index: &'a SearchIndex,
    scorer: Scorer,
    min_partial_len: usize,
    stemmer: Stemmer,
}

impl<'a> SearchEngine<'a> {
    pub fn new(index: &'a SearchIndex) -> Self {
        Self {
            index,
            scorer: Scorer::default(),
            min_partial_len: DEFAULT_MIN_PARTIAL_LEN,
            stemmer: english_stemmer(),
        }
    }

    pub fn with_scorer(mut self, scorer: Scorer) -> Self {
        self.scorer = scorer;
        self
    }

    pub fn with_min_partial_len(mut self, len: usize) -> Self {
        self.min_partial_len = len;
        self
    }

    pub const fn index(&self) -> &'a SearchIndex {
        self.index
    }

    /// Resolves a raw term, without stemming, to the documents mentioning it.
    ///
    /// Unknown terms resolve to an empty list.
    pub fn lookup_term(&self, term: &str) -> Vec<&'a str> {
        self.index
            .term_docs(term)
            .iter()
            .filter_map(|&doc| self.index.docnames().get(doc).map(String::as_str))
            .collect()
    }

    /// Runs a full query: documents and objects, at most `limit` of each.
    pub fn search(&self, query: &str, limit: usize) -> SearchResults {
        let parsed = parse_query(query, &self.stemmer);
        let (mut documents, suggestions) = self.search_documents(&parsed);
        let mut objects = self.search_objects(query, &parsed);

        documents.truncate(limit);
        objects.truncate(limit);

        tracing::debug!(
            "Query '{}': {} documents, {} objects",
            query,
            documents.len(),
            objects.len()
        );

        SearchResults {
            documents,
            objects,
            suggestions,
        }
    }

    /// Matches documents: required words intersect, excluded words subtract.
    pub fn search_documents(&self, parsed: &ParsedQuery) -> (Vec<DocumentHit>, Vec<String>) {
        if parsed.is_empty() {
            return (vec![], vec![]);
        }

        let excluded: AHashSet<usize> = parsed
            .excluded
            .iter()
            .flat_map(|word| {
                self.index
                    .term_docs(&word.stem)
                    .iter()
                    .chain(self.index.title_docs(&word.stem))
                    .copied()
            })
            .collect();

        let mut suggestions = vec![];
        let mut combined: Option<AHashMap<usize, i32>> = None;

        for word in &parsed.required {
            let scores = self.word_scores(&word.stem);
            if scores.is_empty() {
                for suggestion in self.suggest(word) {
                    if !suggestions.contains(&suggestion) {
                        suggestions.push(suggestion);
                    }
                }
            }

            combined = Some(match combined {
                None => scores,
                Some(acc) => acc
                    .into_iter()
                    .filter_map(|(doc, score)| scores.get(&doc).map(|s| (doc, score + s)))
                    .collect(),
            });
        }

        let mut hits: Vec<DocumentHit> = combined
            .unwrap_or_default()
            .into_iter()
            .filter(|(doc, _)| !excluded.contains(doc))
            .filter_map(|(doc, score)| {
                let found = self.index.doc(doc)?;
                Some(DocumentHit {
                    doc,
                    docname: found.docname.to_string(),
                    filename: found.filename.to_string(),
                    title: found.title.to_string(),
                    score,
                })
            })
            .collect();

        hits.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.docname.cmp(&b.docname)));
        suggestions.truncate(MAX_SUGGESTIONS);
        (hits, suggestions)
    }

    /// Best score each document earns for one stemmed word.
    fn word_scores(&self, stem: &str) -> AHashMap<usize, i32> {
        let mut scores = AHashMap::new();

        for &doc in self.index.term_docs(stem) {
            keep_best(&mut scores, doc, self.scorer.term);
        }
        for &doc in self.index.title_docs(stem) {
            keep_best(&mut scores, doc, self.scorer.title);
        }

        if stem.chars().count() >= self.min_partial_len {
            add_partial(&mut scores, self.index.terms(), stem, self.scorer.partial_term);
            add_partial(
                &mut scores,
                self.index.titleterms(),
                stem,
                self.scorer.partial_title,
            );
        }

        scores
    }

    /// Index terms similar to a word that matched nothing.
    fn suggest(&self, word: &QueryWord) -> Vec<String> {
        let mut candidates: Vec<(f64, &str)> = self
            .index
            .terms()
            .keys()
            .chain(self.index.titleterms().keys())
            .map(|term| {
                let score = jaro_winkler::similarity(word.stem.chars(), term.chars())
                    .max(jaro_winkler::similarity(word.original.chars(), term.chars()));
                (score, term.as_str())
            })
            .filter(|(score, _)| *score >= SUGGESTION_THRESHOLD)
            .collect();

        candidates.sort_by(|(a, ta), (b, tb)| b.total_cmp(a).then_with(|| ta.cmp(tb)));
        candidates.dedup_by(|(_, a), (_, b)| a == b);
        candidates
            .into_iter()
            .take(MAX_SUGGESTIONS)
            .map(|(_, term)| term.to_string())
            .collect()
    }

    /// Matches objects whose full name contains the query or one of its words.
    ///
    /// With several words, an object matched by one word must mention every
    /// other word in its full name, type label or page title.
    pub fn search_objects(&self, query: &str, parsed: &ParsedQuery) -> Vec<ObjectHit> {
        let words = object_query_words(query);
        if words.is_empty() {
            return vec![];
        }

        let whole = words.join(" ");
        let excluded: Vec<&str> = parsed.excluded.iter().map(|w| w.original.as_str()).collect();

        let mut best: BTreeMap<String, ObjectHit> = BTreeMap::new();

        for (namespace, entry) in self.index.objects().filter(|(_, e)| !e.is_hidden()) {
            let fullname = full_object_name(namespace, &entry.name);
            let fullname_lower = fullname.to_lowercase();
            let name_lower = entry.name.to_lowercase();
            let object_type = self.index.object_type(entry.objtype);
            let label = object_type.and_then(|t| t.label).unwrap_or_default();
            let title = self.index.doc(entry.doc).map_or("", |d| d.title);
            let haystack = format!("{} {} {}", fullname_lower, label, title).to_lowercase();

            if excluded.iter().any(|w| haystack.contains(w)) {
                continue;
            }

            let candidates = std::iter::once(whole.as_str()).chain(words.iter().map(String::as_str));
            let mut score: Option<i32> = None;
            for candidate in candidates {
                let matched =
                    self.scorer
                        .object_match(candidate, &fullname_lower, &name_lower, entry.priority);
                let Some(s) = matched else { continue };
                let others_present = words
                    .iter()
                    .filter(|w| w.as_str() != candidate && !candidate.contains(w.as_str()))
                    .all(|w| haystack.contains(w.as_str()));
                if others_present {
                    score = Some(score.map_or(s, |prev| prev.max(s)));
                }
            }

            let Some(score) = score else { continue };
            let Some(doc) = self.index.doc(entry.doc) else {
                continue;
            };

            let anchor = resolve_anchor(&fullname, &entry.anchor);

            let hit = ObjectHit {
                fullname: fullname.clone(),
                namespace: namespace.to_string(),
                name: entry.name.clone(),
                role: object_type.map_or_else(String::new, |t| t.qualified.to_string()),
                label: object_type.and_then(|t| t.label).map(str::to_string),
                docname: doc.docname.to_string(),
                title: doc.title.to_string(),
                anchor,
                score,
            };

            match best.get(&fullname) {
                Some(existing) if existing.score >= score => {}
                _ => {
                    best.insert(fullname, hit);
                }
            }
        }

        let mut hits: Vec<ObjectHit> = best.into_values().collect();
        hits.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.fullname.cmp(&b.fullname)));
        hits
    }

    /// Lists catalogued objects, optionally filtered by namespace and kind.
    pub fn list_objects(&self, filter: ObjectFilter<'_>) -> Vec<ObjectHit> {
        let mut hits: Vec<ObjectHit> = self
            .index
            .objects()
            .filter(|(_, entry)| !entry.is_hidden())
            .filter(|(namespace, _)| filter.namespace.is_none_or(|ns| ns == *namespace))
            .filter_map(|(namespace, entry)| {
                let object_type = self.index.object_type(entry.objtype);
                let role = object_type.map_or("", |t| t.qualified);
                if let Some(kind) = filter.kind
                    && role != kind
                    && role.rsplit(':').next() != Some(kind)
                {
                    return None;
                }
                let doc = self.index.doc(entry.doc)?;
                let fullname = full_object_name(namespace, &entry.name);
                Some(ObjectHit {
                    anchor: resolve_anchor(&fullname, &entry.anchor),
                    fullname,
                    namespace: namespace.to_string(),
                    name: entry.name.clone(),
                    role: role.to_string(),
                    label: object_type.and_then(|t| t.label).map(str::to_string),
                    docname: doc.docname.to_string(),
                    title: doc.title.to_string(),
                    score: self.scorer.object_priority(entry.priority),
                })
            })
            .collect();
        hits.sort_by(|a, b| a.fullname.cmp(&b.fullname));
        hits
    }
}

/// Lowercased non-excluded query words, first occurrence kept.
fn object_query_words(query: &str) -> Vec<String> {
    let mut seen = AHashSet::new();
    query
        .split_whitespace()
        .filter(|w| !w.starts_with('-'))
        .map(str::to_lowercase)
        .filter(|w| seen.insert(w.clone()))
        .collect()
}

/// Empty anchors stand for the full name, `-` for the page itself.
fn resolve_anchor(fullname: &str, anchor: &str) -> String {
    match anchor {
        "" => fullname.to_string(),
        "-" => String::new(),
        other => other.to_string(),
    }
}

fn keep_best(scores: &mut AHashMap<usize, i32>, doc: usize, score: i32) {
    scores
        .entry(doc)
        .and_modify(|best| *best = (*best).max(score))
        .or_insert(score);
}

fn add_partial(
    scores: &mut AHashMap<usize, i32>,
    postings: &BTreeMap<String, DocRefs>,
    stem: &str,
    score: i32,
) {
    for (term, refs) in postings {
        if term != stem && term.contains(stem) {
            for &doc in refs.as_slice() {
                keep_best(scores, doc, score);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::parse_index;
    use assert2::{check, let_assert};
    use rstest::{fixture, rstest};

    #[fixture]
    fn tiny() -> SearchIndex {
        parse_index(
            r#"{"docnames": ["a", "b"], "filenames": ["a.rst", "b.rst"], "titles": ["A", "B"],
            "terms": {"foo": [0, 1], "bar": 0}, "objects": {}, "objtypes": {}, "objnames": {},
            "titleterms": {}, "envversion": {}}"#,
        )
        .unwrap()
    }

    #[fixture]
    fn catalogue() -> SearchIndex {
        parse_index(
            r#"{"docnames": ["client", "spectrum", "util"],
            "filenames": ["client.rst", "spectrum.rst", "util.rst"],
            "titles": ["Clients", "Spectrum", "Utilities"],
            "terms": {"gate": [0, 1], "spectrum": [1, 2], "plot": 1, "gatecli": 0, "list": [0, 1]},
            "objects": {
                "spectcl": [[0, 0, 1, "", "GateClient"], [1, 1, 1, "", "Spectrum"]],
                "spectcl.Spectrum": [[1, 2, 1, "", "plot"], [1, 2, 1, "", "is_gated"]]
            },
            "objtypes": {"0": "py:attribute", "1": "py:class", "2": "py:method"},
            "objnames": {"0": ["py", "attribute", "Python attribute"],
                         "1": ["py", "class", "Python class"],
                         "2": ["py", "method", "Python method"]},
            "titleterms": {"client": 0, "spectrum": 1, "util": 2},
            "envversion": {}}"#,
        )
        .unwrap()
    }

    #[rstest]
    #[case("foo", &["a", "b"])]
    #[case("bar", &["a"])]
    #[case("baz", &[])]
    fn test_lookup_term(tiny: SearchIndex, #[case] term: &str, #[case] expected: &[&str]) {
        let engine = SearchEngine::new(&tiny);
        check!(engine.lookup_term(term) == expected);
    }

    #[rstest]
    fn test_unknown_word_is_empty_not_error(tiny: SearchIndex) {
        let results = SearchEngine::new(&tiny).search("baz", 10);
        check!(results.documents.is_empty());
        check!(results.is_empty());
    }

    #[rstest]
    fn test_title_hits_outrank_body_hits(catalogue: SearchIndex) {
        let results = SearchEngine::new(&catalogue).search("spectrum", 10);
        let names: Vec<_> = results.documents.iter().map(|d| d.docname.as_str()).collect();
        check!(names == ["spectrum", "util"]);
        check!(results.documents[0].score == 15);
        check!(results.documents[1].score == 5);
    }

    #[rstest]
    fn test_required_words_intersect(catalogue: SearchIndex) {
        let results = SearchEngine::new(&catalogue).search("gate plot", 10);
        let_assert!([hit] = results.documents.as_slice());
        check!(hit.docname == "spectrum");
        check!(hit.score == 10);
    }

    #[rstest]
    fn test_excluded_word_removes_documents(catalogue: SearchIndex) {
        let results = SearchEngine::new(&catalogue).search("gate -plot", 10);
        let names: Vec<_> = results.documents.iter().map(|d| d.docname.as_str()).collect();
        check!(names == ["client"]);
    }

    #[rstest]
    fn test_partial_matches(catalogue: SearchIndex) {
        // "gat" is a substring of "gate" and "gatecli" but not an exact term.
        let results = SearchEngine::new(&catalogue).search("gat", 10);
        let names: Vec<_> = results.documents.iter().map(|d| d.docname.as_str()).collect();
        check!(names == ["client", "spectrum"]);
        check!(results.documents.iter().all(|d| d.score == 2));
    }

    #[rstest]
    fn test_partial_disabled_below_min_len(catalogue: SearchIndex) {
        let results = SearchEngine::new(&catalogue)
            .with_min_partial_len(10)
            .search("gat", 10);
        check!(results.documents.is_empty());
    }

    #[rstest]
    fn test_object_search_ranks_name_match_first(catalogue: SearchIndex) {
        let results = SearchEngine::new(&catalogue).search("spectrum", 10);
        let names: Vec<_> = results.objects.iter().map(|o| o.fullname.as_str()).collect();
        check!(names[0] == "spectcl.Spectrum");
        check!(names.contains(&"spectcl.Spectrum.plot"));
        let first = &results.objects[0];
        check!(first.role == "py:class");
        check!(first.label.as_deref() == Some("Python class"));
        check!(first.anchor == "spectcl.Spectrum");
        check!(first.score == 16);
    }

    #[rstest]
    fn test_multi_word_object_search(catalogue: SearchIndex) {
        let results = SearchEngine::new(&catalogue).search("spectrum plot", 10);
        let names: Vec<_> = results.objects.iter().map(|o| o.fullname.as_str()).collect();
        check!(names == ["spectcl.Spectrum.plot"]);
    }

    #[rstest]
    fn test_suggestions_for_misspelling(catalogue: SearchIndex) {
        let results = SearchEngine::new(&catalogue).search("spectrun", 10);
        check!(results.documents.is_empty());
        check!(results.suggestions.contains(&"spectrum".to_string()));
    }

    #[rstest]
    fn test_limit_applies(catalogue: SearchIndex) {
        let results = SearchEngine::new(&catalogue).search("list", 1);
        check!(results.documents.len() == 1);
    }

    #[rstest]
    #[case(ObjectFilter::default(), 4)]
    #[case(ObjectFilter { namespace: Some("spectcl.Spectrum"), kind: None }, 2)]
    #[case(ObjectFilter { namespace: None, kind: Some("class") }, 1)]
    #[case(ObjectFilter { namespace: None, kind: Some("py:method") }, 2)]
    #[case(ObjectFilter { namespace: Some("nope"), kind: None }, 0)]
    fn test_list_objects(catalogue: SearchIndex, #[case] filter: ObjectFilter<'static>, #[case] expected: usize) {
        check!(SearchEngine::new(&catalogue).list_objects(filter).len() == expected);
    }

    #[rstest]
    #[case("plot spectrum plot", &["plot", "spectrum"])]
    #[case("Plot -gate PLOT", &["plot"])]
    #[case("-gate", &[])]
    fn test_object_query_words(#[case] query: &str, #[case] expected: &[&str]) {
        check!(object_query_words(query) == expected);
    }

    #[rstest]
    fn test_repeated_word_scores_like_single(catalogue: SearchIndex) {
        let engine = SearchEngine::new(&catalogue);
        let once = engine.search("spectrum plot", 10);
        let twice = engine.search("plot spectrum plot", 10);
        let names: Vec<_> = twice.objects.iter().map(|o| o.fullname.as_str()).collect();
        check!(names == ["spectcl.Spectrum.plot"]);
        check!(twice.objects[0].score == once.objects[0].score);
    }

    #[test]
    fn test_hidden_objects_are_not_listed_or_found() {
        let index = parse_index(
            r#"{"docnames": ["a"], "filenames": ["a.rst"], "titles": ["A"], "terms": {},
            "objects": {"pkg": [[0, 0, -1, "", "secret"], [0, 0, 1, "", "shown"]]},
            "objtypes": {"0": "py:function"}, "objnames": {"0": ["py", "function", "Python function"]},
            "titleterms": {}, "envversion": {}}"#,
        )
        .unwrap();
        let engine = SearchEngine::new(&index);

        let listed: Vec<_> = engine
            .list_objects(ObjectFilter::default())
            .into_iter()
            .map(|o| o.fullname)
            .collect();
        check!(listed == ["pkg.shown"]);
        check!(engine.search("secret", 10).objects.is_empty());
        check!(engine.search("shown", 10).objects.len() == 1);
    }

    #[rstest]
    fn test_out_of_bounds_documents_are_skipped() {
        let index = parse_index(
            r#"{"docnames": ["a"], "filenames": ["a.rst"], "titles": ["A"],
            "terms": {"foo": [0, 3]}, "objects": {}, "objtypes": {}, "objnames": {},
            "titleterms": {}, "envversion": {}}"#,
        )
        .unwrap();
        let engine = SearchEngine::new(&index);
        check!(engine.lookup_term("foo") == ["a"]);
        check!(engine.search("foo", 10).documents.len() == 1);
    }
}
