//! The concrete research pipeline: node implementations, prompt templates,
//! the router, and the canonical graph wiring.
//!
//! Topology (preparer-loop variant):
//!
//! ```text
//! decompose → prepare_task → research ─┬→ dispatch_tools → research
//!                                      ├→ save_validated → prepare_task
//!                                      ├→ save_evidence  → synthesize
//!                                      └→ synthesize
//! synthesize → END
//! ```

pub mod nodes;
pub mod parse;
pub mod prompts;

use std::sync::Arc;

use gapscout_core::error::Result;
use gapscout_core::traits::Reasoner;
use gapscout_tools::ToolRegistry;

use crate::dispatch::DispatchToolsNode;
use crate::graph::{CompiledGraph, GraphBuilder, END};
use crate::state::ResearchState;

use nodes::{DecomposeNode, PrepareTaskNode, ResearchNode, SaveAnswerNode, SavePhase, SynthesizeNode};

pub const CALL_TOOL: &str = "call_tool";
pub const SAVE_VALIDATED: &str = "save_validated";
pub const SAVE_EVIDENCE: &str = "save_evidence";
pub const SYNTHESIZE: &str = "synthesize";

/// Route the step after the researcher. First match wins; the order is
/// load-bearing: pending tool requests are drained before any final answer
/// is accepted, and the `validated_item` check lets one researcher node
/// serve both loop phases.
pub fn route_research(state: &ResearchState) -> &'static str {
    if state
        .latest_message()
        .is_some_and(|m| m.has_tool_requests())
    {
        return CALL_TOOL;
    }
    if state.validated_item.is_empty() {
        return SAVE_VALIDATED;
    }
    if state.evidence_summary.is_empty() {
        return SAVE_EVIDENCE;
    }
    SYNTHESIZE
}

/// Wire the canonical pipeline graph.
pub fn build_graph(
    reasoner: Arc<dyn Reasoner>,
    registry: Arc<ToolRegistry>,
    best_effort_parse: bool,
) -> Result<CompiledGraph> {
    let mut g = GraphBuilder::new();
    g.add_node(DecomposeNode::new(Arc::clone(&reasoner), best_effort_parse));
    g.add_node(PrepareTaskNode);
    g.add_node(ResearchNode::new(
        Arc::clone(&reasoner),
        Arc::clone(&registry),
    ));
    g.add_node(DispatchToolsNode::new(registry));
    g.add_node(SaveAnswerNode::new(SavePhase::Validation));
    g.add_node(SaveAnswerNode::new(SavePhase::Evidence));
    g.add_node(SynthesizeNode::new(reasoner));

    g.set_entry("decompose");
    g.add_edge("decompose", "prepare_task");
    g.add_edge("prepare_task", "research");
    g.add_conditional_edges(
        "research",
        route_research,
        [
            (CALL_TOOL, "dispatch_tools"),
            (SAVE_VALIDATED, "save_validated"),
            (SAVE_EVIDENCE, "save_evidence"),
            (SYNTHESIZE, "synthesize"),
        ],
    );
    g.add_edge("dispatch_tools", "research");
    g.add_edge("save_validated", "prepare_task");
    g.add_edge("save_evidence", "synthesize");
    g.add_edge("synthesize", END);

    g.compile()
}
