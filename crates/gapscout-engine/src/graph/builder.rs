use std::collections::HashMap;
use std::sync::Arc;

use gapscout_core::error::{GapscoutError, Result};

use crate::graph::executor::WorkflowRun;
use crate::graph::node::Node;
use crate::state::ResearchState;

/// Sentinel target denoting successful termination of a run.
pub const END: &str = "__end__";

/// Pure decision function: given current state, returns a route label.
pub type RouterFn = fn(&ResearchState) -> &'static str;

pub(crate) struct ConditionalEdge {
    pub(crate) router: RouterFn,
    pub(crate) targets: HashMap<&'static str, String>,
}

/// Builder for a workflow graph: named nodes, unconditional edges, and
/// conditional edges (`source -> router -> {label: target}`).
pub struct GraphBuilder {
    nodes: HashMap<String, Arc<dyn Node>>,
    edges: HashMap<String, String>,
    conditional: HashMap<String, ConditionalEdge>,
    entry: Option<String>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            edges: HashMap::new(),
            conditional: HashMap::new(),
            entry: None,
        }
    }

    /// Register a node under its own name.
    pub fn add_node(&mut self, node: impl Node) -> &mut Self {
        let node: Arc<dyn Node> = Arc::new(node);
        self.nodes.insert(node.name().to_string(), node);
        self
    }

    /// Add an unconditional edge. A source has exactly one.
    pub fn add_edge(&mut self, from: impl Into<String>, to: impl Into<String>) -> &mut Self {
        self.edges.insert(from.into(), to.into());
        self
    }

    /// Add a conditional edge: after `from` runs, `router` is evaluated on
    /// the freshly merged state and its label is resolved through `targets`.
    pub fn add_conditional_edges<I, T>(
        &mut self,
        from: impl Into<String>,
        router: RouterFn,
        targets: I,
    ) -> &mut Self
    where
        I: IntoIterator<Item = (&'static str, T)>,
        T: Into<String>,
    {
        let targets = targets.into_iter().map(|(l, t)| (l, t.into())).collect();
        self.conditional
            .insert(from.into(), ConditionalEdge { router, targets });
        self
    }

    /// Set the entry node.
    pub fn set_entry(&mut self, entry: impl Into<String>) -> &mut Self {
        self.entry = Some(entry.into());
        self
    }

    /// Validate the wiring and freeze the graph.
    pub fn compile(self) -> Result<CompiledGraph> {
        let entry = self
            .entry
            .ok_or_else(|| GapscoutError::Graph("no entry node set".into()))?;
        if !self.nodes.contains_key(&entry) {
            return Err(GapscoutError::Graph(format!(
                "entry node '{}' not found in graph",
                entry
            )));
        }

        for (from, to) in &self.edges {
            if !self.nodes.contains_key(from) {
                return Err(GapscoutError::Graph(format!(
                    "edge source '{}' is not a node",
                    from
                )));
            }
            if to != END && !self.nodes.contains_key(to) {
                return Err(GapscoutError::Graph(format!(
                    "edge target '{}' is not a node",
                    to
                )));
            }
            if self.conditional.contains_key(from) {
                return Err(GapscoutError::Graph(format!(
                    "node '{}' has both an unconditional and a conditional edge",
                    from
                )));
            }
        }

        for (from, cond) in &self.conditional {
            if !self.nodes.contains_key(from) {
                return Err(GapscoutError::Graph(format!(
                    "conditional edge source '{}' is not a node",
                    from
                )));
            }
            for target in cond.targets.values() {
                if target != END && !self.nodes.contains_key(target) {
                    return Err(GapscoutError::Graph(format!(
                        "conditional target '{}' is not a node",
                        target
                    )));
                }
            }
        }

        // Every node must route somewhere; a dead end is a wiring bug, not
        // an implicit termination.
        for name in self.nodes.keys() {
            if !self.edges.contains_key(name) && !self.conditional.contains_key(name) {
                return Err(GapscoutError::Graph(format!(
                    "node '{}' has no outgoing edge",
                    name
                )));
            }
        }

        Ok(CompiledGraph {
            nodes: self.nodes,
            edges: self.edges,
            conditional: self.conditional,
            entry,
        })
    }
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// An immutable, validated workflow graph.
pub struct CompiledGraph {
    pub(crate) nodes: HashMap<String, Arc<dyn Node>>,
    pub(crate) edges: HashMap<String, String>,
    pub(crate) conditional: HashMap<String, ConditionalEdge>,
    pub(crate) entry: String,
}

impl CompiledGraph {
    pub fn entry(&self) -> &str {
        &self.entry
    }

    pub fn node_names(&self) -> Vec<&str> {
        self.nodes.keys().map(|s| s.as_str()).collect()
    }

    /// Start a run over this graph. The state is owned exclusively by the
    /// run until it finishes.
    pub fn run(&self, state: ResearchState, max_steps: usize) -> WorkflowRun<'_> {
        WorkflowRun::new(self, state, max_steps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::future::BoxFuture;

    use crate::state::StatePatch;

    struct NoopNode(&'static str);

    impl Node for NoopNode {
        fn name(&self) -> &str {
            self.0
        }
        fn run<'a>(&'a self, _state: &'a ResearchState) -> BoxFuture<'a, Result<StatePatch>> {
            Box::pin(async { Ok(StatePatch::default()) })
        }
    }

    fn route_to_end(_state: &ResearchState) -> &'static str {
        "finish"
    }

    #[test]
    fn test_compile_valid_graph() {
        let mut g = GraphBuilder::new();
        g.add_node(NoopNode("a"));
        g.add_node(NoopNode("b"));
        g.set_entry("a");
        g.add_edge("a", "b");
        g.add_edge("b", END);

        let graph = g.compile().unwrap();
        assert_eq!(graph.entry(), "a");
        assert_eq!(graph.node_names().len(), 2);
    }

    #[test]
    fn test_compile_requires_entry() {
        let mut g = GraphBuilder::new();
        g.add_node(NoopNode("a"));
        g.add_edge("a", END);
        assert!(matches!(g.compile(), Err(GapscoutError::Graph(_))));
    }

    #[test]
    fn test_compile_rejects_unknown_edge_target() {
        let mut g = GraphBuilder::new();
        g.add_node(NoopNode("a"));
        g.set_entry("a");
        g.add_edge("a", "ghost");
        assert!(matches!(g.compile(), Err(GapscoutError::Graph(_))));
    }

    #[test]
    fn test_compile_rejects_dead_end_node() {
        let mut g = GraphBuilder::new();
        g.add_node(NoopNode("a"));
        g.add_node(NoopNode("b"));
        g.set_entry("a");
        g.add_edge("a", "b");
        // "b" has no outgoing edge
        assert!(matches!(g.compile(), Err(GapscoutError::Graph(_))));
    }

    #[test]
    fn test_compile_rejects_conflicting_edges() {
        let mut g = GraphBuilder::new();
        g.add_node(NoopNode("a"));
        g.set_entry("a");
        g.add_edge("a", END);
        g.add_conditional_edges("a", route_to_end, [("finish", END)]);
        assert!(matches!(g.compile(), Err(GapscoutError::Graph(_))));
    }

    #[test]
    fn test_compile_validates_conditional_targets() {
        let mut g = GraphBuilder::new();
        g.add_node(NoopNode("a"));
        g.set_entry("a");
        g.add_conditional_edges("a", route_to_end, [("finish", "ghost")]);
        assert!(matches!(g.compile(), Err(GapscoutError::Graph(_))));
    }
}
