//! Raw term lookup, without stemming or scoring.

use crate::state::IndexState;
use rmcp::schemars;
use serde::Deserialize;
use std::{fmt::Write as _, sync::Arc};

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct LookupTermRequest {
    /// Exact index term, already stemmed (e.g. `spectclgatecli`)
    pub term: String,
    /// Path to a searchindex.js file (default: the last loaded index)
    #[serde(default)]
    pub path: Option<String>,
}

pub async fn handle_lookup_term(
    state: &Arc<IndexState>,
    request: LookupTermRequest,
) -> Result<String, String> {
    let loaded = state.resolve(request.path.as_deref()).await?;
    let index = &loaded.index;
    let term = request.term.trim();

    let body = index.term_docs(term);
    let titles = index.title_docs(term);

    if body.is_empty() && titles.is_empty() {
        return Ok(format!("Term '{}' does not occur in the index.\n", term));
    }

    let mut output = format!("Documents for term '{}':\n", term);
    for (heading, docs) in [("Body", body), ("Title", titles)] {
        if docs.is_empty() {
            continue;
        }
        let _ = writeln!(output, "\n{}:", heading);
        for &doc in docs {
            match index.doc(doc) {
                Some(doc) => {
                    let _ = writeln!(output, "• `{}` {}", doc.docname, doc.title);
                }
                None => {
                    let _ = writeln!(output, "• [document {} out of range]", doc);
                }
            }
        }
    }
    Ok(output)
}
