use std::sync::Arc;

use futures::future::BoxFuture;
use tracing::{debug, warn};

use gapscout_core::error::Result;
use gapscout_core::types::ChatMessage;
use gapscout_tools::ToolRegistry;

use crate::graph::node::Node;
use crate::state::{ResearchState, StatePatch};

/// Executes every tool invocation requested by the latest message.
///
/// Produces exactly one result record per request, in request order, tagged
/// with the originating request id. A single tool's failure (or an unknown
/// tool name) is rendered into the result string and never interrupts the
/// rest of the batch. Requests in a batch are independent, so they run
/// concurrently; `join_all` keeps the results in request order.
pub struct DispatchToolsNode {
    registry: Arc<ToolRegistry>,
}

impl DispatchToolsNode {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }
}

impl Node for DispatchToolsNode {
    fn name(&self) -> &str {
        "dispatch_tools"
    }

    fn internal(&self) -> bool {
        true
    }

    fn run<'a>(&'a self, state: &'a ResearchState) -> BoxFuture<'a, Result<StatePatch>> {
        Box::pin(async move {
            let requests = state
                .latest_message()
                .map(|m| m.tool_requests())
                .unwrap_or_default();

            debug!(count = requests.len(), "Dispatching tool requests");

            let futs = requests.into_iter().map(|req| {
                let registry = Arc::clone(&self.registry);
                async move {
                    let content = match registry.execute(&req.name, req.arguments).await {
                        Ok(content) => content,
                        Err(e) => {
                            warn!(tool = %req.name, error = %e, "Tool invocation failed");
                            format!("error running tool `{}`: {}", req.name, e)
                        }
                    };
                    ChatMessage::tool_result(req.id, content)
                }
            });

            let results = futures::future::join_all(futs).await;
            Ok(StatePatch::with_messages(results))
        })
    }
}
