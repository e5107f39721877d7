//! Workflow execution engine for the Gapscout research pipeline.
//!
//! A workflow is a directed graph of [`Node`]s over a shared [`ResearchState`].
//! Each node returns a [`StatePatch`]; the executor applies it under the
//! per-field merge policy, asks the router (on conditional edges) for the
//! next node, and emits one [`WorkflowEvent`] per step until the `END`
//! sentinel is reached. The tool sub-loop (`research → dispatch_tools →
//! research`) drains pending tool requests before any final answer is
//! accepted.

pub mod dispatch;
pub mod events;
pub mod graph;
pub mod pipeline;
pub mod state;

pub use dispatch::DispatchToolsNode;
pub use events::WorkflowEvent;
pub use graph::{CompiledGraph, GraphBuilder, Node, WorkflowRun, END};
pub use pipeline::build_graph;
pub use state::{MergePolicy, ResearchState, StateField, StatePatch, SubTopic};
