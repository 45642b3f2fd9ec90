mod params;
mod server;

use rmcp::transport::stdio;
use tokio::sync::watch;

use crate::project::Snapshot;

/// Serve the query surface over MCP stdio until the client disconnects.
///
/// The server reads whatever snapshot is current when a tool call arrives —
/// the watcher (when enabled) keeps publishing fresh ones underneath it.
pub async fn run(
    snapshots: watch::Receiver<Snapshot>,
    include_tests: bool,
) -> anyhow::Result<()> {
    let service = server::AriadneServer::new(snapshots, include_tests);
    let server = rmcp::serve_server(service, stdio()).await?;
    server.waiting().await?;
    Ok(())
}
