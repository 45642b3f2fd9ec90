use std::time::Duration;

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{ServerCapabilities, ServerInfo};
use rmcp::{ServerHandler, tool, tool_handler, tool_router};
use tokio::sync::watch;

use super::params::{ListEntrypointsParams, NeighborhoodParams};
use crate::callgraph::{
    DEFAULT_NEIGHBORHOOD_DEPTH, QueryDeadline, ScopeFilter, list_entrypoints,
    show_call_graph_neighborhood,
};
use crate::error::{ErrorBody, QueryError};
use crate::output::EntrypointsResponse;
use crate::project::Snapshot;

/// Per-tool-call deadline. In-flight indexing is never cancelled; only the
/// query aborts.
const QUERY_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct AriadneServer {
    snapshots: watch::Receiver<Snapshot>,
    include_tests: bool,
    tool_router: ToolRouter<Self>,
}

impl AriadneServer {
    pub fn new(snapshots: watch::Receiver<Snapshot>, include_tests: bool) -> Self {
        Self {
            snapshots,
            include_tests,
            tool_router: Self::tool_router(),
        }
    }

    /// The snapshot current at call time — published atomically at batch
    /// boundaries, so a query never sees a half-applied batch.
    fn snapshot(&self) -> Snapshot {
        self.snapshots.borrow().clone()
    }
}

fn error_json(err: &QueryError) -> String {
    let body: ErrorBody = err.into();
    serde_json::to_string(&body).unwrap_or_else(|_| err.to_string())
}

// ---------------------------------------------------------------------------
// Tool implementations
// ---------------------------------------------------------------------------

#[tool_router]
impl AriadneServer {
    #[tool(
        description = "List top-level entry points: callable definitions no other definition in the queried scope calls. Returns file, name, range and a source excerpt for each."
    )]
    async fn list_entrypoints(
        &self,
        Parameters(p): Parameters<ListEntrypointsParams>,
    ) -> Result<String, String> {
        let snapshot = self.snapshot();
        let scope = ScopeFilter {
            files: p.files.unwrap_or_default(),
            folders: p.folders.unwrap_or_default(),
        };
        let include_tests = p.include_tests.unwrap_or(self.include_tests);

        let result = tokio::task::spawn_blocking(move || {
            let deadline = QueryDeadline::after(QUERY_TIMEOUT);
            list_entrypoints(&snapshot, &scope, include_tests, &deadline)
        })
        .await
        .map_err(|e| error_json(&QueryError::Internal(e.to_string())))?;

        match result {
            Ok(entrypoints) => serde_json::to_string_pretty(&EntrypointsResponse { entrypoints })
                .map_err(|e| error_json(&QueryError::Internal(e.to_string()))),
            Err(err) => Err(error_json(&err)),
        }
    }

    #[tool(
        description = "Show the call-graph neighborhood around a symbol: callers and callees up to a bounded depth in both directions, with source excerpts and call-site locations. symbol_ref is 'file:name' or a bare name."
    )]
    async fn show_call_graph_neighborhood(
        &self,
        Parameters(p): Parameters<NeighborhoodParams>,
    ) -> Result<String, String> {
        let snapshot = self.snapshot();
        let depth = p.depth.unwrap_or(DEFAULT_NEIGHBORHOOD_DEPTH);
        let symbol_ref = p.symbol_ref;

        let result = tokio::task::spawn_blocking(move || {
            let deadline = QueryDeadline::after(QUERY_TIMEOUT);
            show_call_graph_neighborhood(&snapshot, &symbol_ref, depth, &deadline)
        })
        .await
        .map_err(|e| error_json(&QueryError::Internal(e.to_string())))?;

        match result {
            Ok(neighborhood) => serde_json::to_string_pretty(&neighborhood)
                .map_err(|e| error_json(&QueryError::Internal(e.to_string()))),
            Err(err) => Err(error_json(&err)),
        }
    }
}

// ---------------------------------------------------------------------------
// ServerHandler
// ---------------------------------------------------------------------------

#[tool_handler]
impl ServerHandler for AriadneServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "ariadne: structural queries over an indexed codebase. Use list_entrypoints to find top-level callables and show_call_graph_neighborhood to walk callers/callees around a symbol.".into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}
