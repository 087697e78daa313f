//! Loading an index and making it the session default.

use crate::index::validate;
use crate::state::IndexState;
use rmcp::schemars;
use serde::Deserialize;
use std::{fmt::Write as _, sync::Arc};

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct LoadIndexRequest {
    /// Path to a searchindex.js file (a leading `~` is expanded)
    pub path: String,
}

/// Loads and validates an index, then makes it the default for later calls.
///
/// An index that breaks its structural invariants is rejected and the
/// previous default is kept.
pub async fn handle_load_index(
    state: &Arc<IndexState>,
    request: LoadIndexRequest,
) -> Result<String, String> {
    let loaded = state.resolve(Some(&request.path)).await?;

    let report = validate(&loaded.index);
    if !report.is_valid() {
        return Err(format!(
            "Refusing to use {}: {}",
            loaded.path.display(),
            report
        ));
    }

    let previous = state.default_path().await;
    state.set_default_path(loaded.path.clone()).await;

    let stats = loaded.index.stats();
    let mut output = format!("Loaded {}\n\n", loaded.path.display());
    let _ = writeln!(output, "Documents: {}", stats.documents);
    let _ = writeln!(output, "Terms: {} ({} in titles)", stats.terms, stats.title_terms);
    let _ = writeln!(
        output,
        "Objects: {} in {} namespaces ({} types)",
        stats.objects, stats.namespaces, stats.object_types
    );
    let _ = writeln!(output, "Fingerprint: {}", loaded.fingerprint);

    if let Some(previous) = previous.filter(|p| *p != loaded.path) {
        let _ = writeln!(output, "\nReplaces previous default {}", previous.display());
    }

    Ok(output)
}
