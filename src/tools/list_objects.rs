//! API catalogue listing.

use crate::search::ObjectFilter;
use crate::state::IndexState;
use rmcp::schemars;
use serde::Deserialize;
use std::{fmt::Write as _, sync::Arc};

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListObjectsRequest {
    /// Path to a searchindex.js file (default: the last loaded index)
    #[serde(default)]
    pub path: Option<String>,
    /// Only objects directly in this namespace (e.g. `spectcl.Spectrum`)
    #[serde(default)]
    pub namespace: Option<String>,
    /// Only objects of this role, e.g. `class`, `method` or `py:function`
    #[serde(default)]
    pub kind: Option<String>,
}

pub async fn handle_list_objects(
    state: &Arc<IndexState>,
    request: ListObjectsRequest,
) -> Result<String, String> {
    let loaded = state.resolve(request.path.as_deref()).await?;
    let engine = state.settings().engine(&loaded.index);

    let objects = engine.list_objects(ObjectFilter {
        namespace: request.namespace.as_deref(),
        kind: request.kind.as_deref(),
    });

    if objects.is_empty() {
        let mut msg = "No objects match".to_string();
        if let Some(namespace) = &request.namespace {
            let _ = write!(msg, " in namespace '{}'", namespace);
        }
        if let Some(kind) = &request.kind {
            let _ = write!(msg, " of kind '{}'", kind);
        }
        msg.push_str(".\n");

        let namespaces: Vec<_> = loaded.index.namespaces().collect();
        if !namespaces.is_empty() {
            let _ = writeln!(msg, "\nAvailable namespaces: {}", namespaces.join(", "));
        }
        return Ok(msg);
    }

    let mut output = format!("{} object(s):\n\n", objects.len());
    let mut current_namespace: Option<&str> = None;
    for object in &objects {
        if current_namespace != Some(object.namespace.as_str()) {
            if current_namespace.is_some() {
                output.push('\n');
            }
            let heading = if object.namespace.is_empty() {
                "(top level)"
            } else {
                object.namespace.as_str()
            };
            let _ = writeln!(output, "{}:", heading);
            current_namespace = Some(object.namespace.as_str());
        }
        let kind = object.label.as_deref().unwrap_or(&object.role);
        let _ = writeln!(output, "  • `{}` ({}) in {}", object.name, kind, object.docname);
    }
    Ok(output)
}
