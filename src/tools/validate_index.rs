//! Structural validation of an index.

use crate::index::validate;
use crate::state::IndexState;
use rmcp::schemars;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ValidateIndexRequest {
    /// Path to a searchindex.js file (default: the last loaded index)
    #[serde(default)]
    pub path: Option<String>,
}

/// Reports every invariant violation. A broken index is a successful call
/// with a non-empty report; only unreadable files are errors.
pub async fn handle_validate_index(
    state: &Arc<IndexState>,
    request: ValidateIndexRequest,
) -> Result<String, String> {
    let loaded = state.resolve(request.path.as_deref()).await?;
    let report = validate(&loaded.index);
    Ok(format!("{}: {}\n", loaded.path.display(), report))
}
