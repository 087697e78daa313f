//! Full-text search handler over a loaded index.

use crate::search::{DocumentHit, ObjectHit, SearchResults, relative_relevance};
use crate::state::IndexState;
use rmcp::schemars;
use serde::Deserialize;
use std::{fmt::Write as _, sync::Arc};

/// Which part of the index a search covers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum SearchScope {
    /// Pages and API objects
    #[default]
    All,
    /// Pages only
    Documents,
    /// API objects only
    Objects,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SearchRequest {
    /// Search query. Words are matched by stem; prefix a word with `-` to exclude pages containing it
    pub query: String,
    /// Path to a searchindex.js file (default: the last loaded index)
    #[serde(default)]
    pub path: Option<String>,
    /// Maximum number of results per section (default: 10; 0 also means the default)
    #[serde(default)]
    pub limit: Option<usize>,
    /// Restrict results to documents or objects (default: all)
    #[serde(default)]
    pub scope: Option<SearchScope>,
}

/// Execute a search against the requested index.
pub async fn handle_search(state: &Arc<IndexState>, request: SearchRequest) -> Result<String, String> {
    let loaded = state.resolve(request.path.as_deref()).await?;
    let limit = effective_limit(request.limit, state.settings().default_limit);
    let engine = state.settings().engine(&loaded.index);

    let mut results = engine.search(&request.query, limit);
    match request.scope.unwrap_or_default() {
        SearchScope::All => {}
        SearchScope::Documents => results.objects.clear(),
        SearchScope::Objects => results.documents.clear(),
    }

    if results.is_empty() {
        return Ok(format_no_results(&request.query, &results));
    }

    Ok(format_search_results(&results, &request.query))
}

/// A zero limit would hide every hit, so it falls back to the default.
fn effective_limit(requested: Option<usize>, default: usize) -> usize {
    requested.filter(|&n| n > 0).unwrap_or(default)
}

fn format_no_results(query: &str, results: &SearchResults) -> String {
    let mut msg = format!("No results found for '{}'.\n\n", query);

    if !results.suggestions.is_empty() {
        msg.push_str("Did you mean:\n");
        for suggestion in &results.suggestions {
            let _ = writeln!(msg, "• `{}`", suggestion);
        }
        msg.push('\n');
    }

    msg.push_str("Search tips:\n");
    msg.push_str("• All words must appear on a page; try fewer words\n");
    msg.push_str("• Search uses stemming: 'plotting' matches 'plot'\n");
    msg.push_str("• Common words such as 'the' or 'with' are ignored\n");
    if query.split_whitespace().any(|w| w.starts_with('-')) {
        msg.push_str("• Words starting with '-' exclude pages; remove them to widen the search\n");
    }
    msg
}

/// Format search results into a readable string output.
fn format_search_results(results: &SearchResults, query: &str) -> String {
    let mut output = format!("Search results for '{}':\n", query);

    if !results.documents.is_empty() {
        output.push_str("\nPages:\n");
        format_documents(&mut output, &results.documents);
    }

    if !results.objects.is_empty() {
        output.push_str("\nObjects:\n");
        format_objects(&mut output, &results.objects);
    }

    output
}

fn format_documents(output: &mut String, hits: &[DocumentHit]) {
    let best = hits.first().map_or(1, |h| h.score);
    for (idx, hit) in hits.iter().enumerate() {
        let _ = writeln!(
            output,
            "{}. {} (`{}`) - relevance: {}%",
            idx + 1,
            hit.title,
            hit.docname,
            relative_relevance(hit.score, best)
        );
        let _ = writeln!(output, "   {}", hit.filename);
    }
}

fn format_objects(output: &mut String, hits: &[ObjectHit]) {
    let best = hits.first().map_or(1, |h| h.score);
    for (idx, hit) in hits.iter().enumerate() {
        let kind = hit.label.as_deref().unwrap_or(&hit.role);
        let _ = writeln!(
            output,
            "{}. `{}` ({}) - relevance: {}%",
            idx + 1,
            hit.fullname,
            kind,
            relative_relevance(hit.score, best)
        );
        if hit.anchor.is_empty() {
            let _ = writeln!(output, "   {} ({})", hit.title, hit.docname);
        } else {
            let _ = writeln!(output, "   {} ({}#{})", hit.title, hit.docname, hit.anchor);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;
    use rstest::rstest;

    fn hit(title: &str, docname: &str, score: i32) -> DocumentHit {
        DocumentHit {
            doc: 0,
            docname: docname.to_string(),
            filename: format!("{docname}.rst"),
            title: title.to_string(),
            score,
        }
    }

    #[test]
    fn test_relevance_is_relative_to_best() {
        let results = SearchResults {
            documents: vec![hit("Spectrum", "apidocs/spectrum", 20), hit("API", "apiref", 10)],
            ..SearchResults::default()
        };
        let text = format_search_results(&results, "spectrum");
        check!(text.contains("1. Spectrum (`apidocs/spectrum`) - relevance: 100%"));
        check!(text.contains("2. API (`apiref`) - relevance: 50%"));
        check!(!text.contains("Objects:"));
    }

    #[test]
    fn test_no_results_lists_suggestions() {
        let results = SearchResults {
            suggestions: vec!["spectrum".to_string()],
            ..SearchResults::default()
        };
        let text = format_no_results("spectrom", &results);
        check!(text.contains("Did you mean:"));
        check!(text.contains("`spectrum`"));
        check!(!text.contains("exclude pages"));
    }

    #[rstest]
    #[case(None, 10)]
    #[case(Some(0), 10)]
    #[case(Some(3), 3)]
    fn test_effective_limit(#[case] requested: Option<usize>, #[case] expected: usize) {
        check!(effective_limit(requested, 10) == expected);
    }

    #[test]
    fn test_scope_deserializes_lowercase() {
        let request: SearchRequest =
            serde_json::from_str(r#"{"query": "gate", "scope": "objects"}"#).unwrap();
        check!(request.scope == Some(SearchScope::Objects));
        check!(request.path.is_none());
    }
}
