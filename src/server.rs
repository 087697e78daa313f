//! MCP server exposing search index tools.

use crate::schema::inline_schema_for_type;
use crate::state::IndexState;
use crate::tools::list_objects::{ListObjectsRequest, handle_list_objects};
use crate::tools::load_index::{LoadIndexRequest, handle_load_index};
use crate::tools::lookup_term::{LookupTermRequest, handle_lookup_term};
use crate::tools::search::{SearchRequest, handle_search};
use crate::tools::validate_index::{ValidateIndexRequest, handle_validate_index};
use rmcp::{
    ServerHandler,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::*,
    tool, tool_handler, tool_router,
};
use std::sync::Arc;

/// MCP server for documentation search indexes
#[derive(Clone)]
pub struct IndexServer {
    /// Shared index state (cache, default index, settings)
    state: Arc<IndexState>,

    /// Tool router for handling MCP tool calls
    tool_router: ToolRouter<Self>,
}

impl std::fmt::Debug for IndexServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexServer")
            .field("state", &self.state)
            .finish()
    }
}

#[tool_router]
impl IndexServer {
    pub fn new(state: Arc<IndexState>) -> Self {
        Self {
            state,
            tool_router: Self::tool_router(),
        }
    }

    pub fn index_state(&self) -> &Arc<IndexState> {
        &self.state
    }

    #[tool(
        description = "Load a Sphinx searchindex.js file, check its structure and make it the default index for the other tools. Reports document, term and object counts.",
        input_schema = inline_schema_for_type::<LoadIndexRequest>()
    )]
    async fn load_index(
        &self,
        Parameters(request): Parameters<LoadIndexRequest>,
    ) -> std::result::Result<String, String> {
        handle_load_index(&self.state, request).await
    }

    #[tool(
        description = "Search the documentation. Query words are stemmed and all must occur on a page; '-word' excludes pages. Returns ranked pages and API objects (classes, methods, functions) with relevance percentages.",
        input_schema = inline_schema_for_type::<SearchRequest>()
    )]
    async fn search(
        &self,
        Parameters(request): Parameters<SearchRequest>,
    ) -> std::result::Result<String, String> {
        handle_search(&self.state, request).await
    }

    #[tool(
        description = "Look up one exact index term (already stemmed, lowercase) and list the pages whose body or title contains it. Unknown terms return an empty list.",
        input_schema = inline_schema_for_type::<LookupTermRequest>()
    )]
    async fn lookup_term(
        &self,
        Parameters(request): Parameters<LookupTermRequest>,
    ) -> std::result::Result<String, String> {
        handle_lookup_term(&self.state, request).await
    }

    #[tool(
        description = "List catalogued API objects grouped by namespace, optionally restricted to one namespace or one kind such as 'class' or 'method'.",
        input_schema = inline_schema_for_type::<ListObjectsRequest>()
    )]
    async fn list_objects(
        &self,
        Parameters(request): Parameters<ListObjectsRequest>,
    ) -> std::result::Result<String, String> {
        handle_list_objects(&self.state, request).await
    }

    #[tool(
        description = "Check an index for structural problems: misaligned document arrays, out-of-range document references and unknown object types.",
        input_schema = inline_schema_for_type::<ValidateIndexRequest>()
    )]
    async fn validate_index(
        &self,
        Parameters(request): Parameters<ValidateIndexRequest>,
    ) -> std::result::Result<String, String> {
        handle_validate_index(&self.state, request).await
    }
}

#[tool_handler]
impl ServerHandler for IndexServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo::new(ServerCapabilities::builder().enable_tools().build())
            .with_protocol_version(ProtocolVersion::V_2024_11_05)
            .with_server_info(Implementation::from_build_env())
            .with_instructions(
                "searchindex-mcp: search generated Sphinx documentation through its searchindex.js. \
                 Start with load_index (unless a default index is configured), then use search, \
                 lookup_term and list_objects. validate_index reports structural problems."
                    .to_string(),
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::SearchSettings;
    use assert2::{check, let_assert};

    #[test]
    fn test_info_advertises_tools() {
        let state = Arc::new(IndexState::new(2, None, SearchSettings::default()));
        let server = IndexServer::new(state.clone());
        check!(Arc::ptr_eq(server.index_state(), &state));

        let info = server.get_info();
        check!(info.capabilities.tools.is_some());
        let_assert!(Some(instructions) = info.instructions);
        check!(instructions.contains("load_index"));
    }
}
