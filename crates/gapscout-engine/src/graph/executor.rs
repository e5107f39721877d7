use futures::stream::{BoxStream, StreamExt};
use tracing::{debug, error, info};

use gapscout_core::error::GapscoutError;

use crate::events::WorkflowEvent;
use crate::graph::builder::{CompiledGraph, END};
use crate::state::ResearchState;

/// One in-flight execution of a [`CompiledGraph`].
///
/// The run is a lazy, pull-driven step iterator: each [`next_event`] call
/// executes at most one node, merges its patch before any routing decision
/// is made, and emits one event. A consumer that stops pulling halts further
/// execution; no separate cancellation signal exists.
///
/// [`next_event`]: WorkflowRun::next_event
pub struct WorkflowRun<'g> {
    graph: &'g CompiledGraph,
    state: ResearchState,
    current: String,
    steps: usize,
    max_steps: usize,
    finished: bool,
}

impl<'g> WorkflowRun<'g> {
    pub(crate) fn new(graph: &'g CompiledGraph, state: ResearchState, max_steps: usize) -> Self {
        Self {
            current: graph.entry.clone(),
            graph,
            state,
            steps: 0,
            max_steps,
            finished: false,
        }
    }

    /// Current state. Useful between pulls; the run owns it until completion.
    pub fn state(&self) -> &ResearchState {
        &self.state
    }

    /// Advance by one step. Returns `None` once a terminal event has been
    /// emitted.
    pub async fn next_event(&mut self) -> Option<WorkflowEvent> {
        if self.finished {
            return None;
        }

        if self.current == END {
            self.finished = true;
            info!(steps = self.steps, "Workflow complete");
            return Some(WorkflowEvent::Done {
                final_report: self.state.final_report.clone(),
            });
        }

        if self.steps >= self.max_steps {
            return Some(self.abort(GapscoutError::MaxStepsExceeded(self.max_steps).to_string()));
        }
        self.steps += 1;

        let Some(node) = self.graph.nodes.get(&self.current) else {
            // Unreachable on a compiled graph; surfaced rather than panicking.
            return Some(self.abort(format!("node '{}' not found in graph", self.current)));
        };

        info!(step = self.steps, node = %node.name(), "Executing workflow step");

        let patch = match node.run(&self.state).await {
            Ok(patch) => patch,
            Err(e) => {
                error!(node = %node.name(), error = %e, "Workflow step failed");
                return Some(self.abort(e.to_string()));
            }
        };

        let delta = if node.internal() {
            crate::state::StatePatch::default()
        } else {
            patch.clone()
        };

        // Merge before routing: the next decision must never see stale state.
        self.state.apply(patch);

        let next = if let Some(cond) = self.graph.conditional.get(&self.current) {
            let label = (cond.router)(&self.state);
            match cond.targets.get(label) {
                Some(target) => target.clone(),
                None => {
                    return Some(self.abort(format!(
                        "router at '{}' returned unmapped label '{}'",
                        self.current, label
                    )));
                }
            }
        } else if let Some(target) = self.graph.edges.get(&self.current) {
            target.clone()
        } else {
            return Some(self.abort(format!("node '{}' has no outgoing edge", self.current)));
        };

        debug!(from = %self.current, to = %next, "Routed");
        let name = node.name().to_string();
        self.current = next;

        Some(WorkflowEvent::Step { step: name, delta })
    }

    fn abort(&mut self, message: String) -> WorkflowEvent {
        self.finished = true;
        WorkflowEvent::Error { message }
    }

    /// Adapt the run into a stream of events for the delivery layer.
    pub fn into_stream(self) -> BoxStream<'g, WorkflowEvent> {
        futures::stream::unfold(self, |mut run| async move {
            run.next_event().await.map(|ev| (ev, run))
        })
        .boxed()
    }

    /// Pull the run to completion, collecting every event.
    pub async fn drain(mut self) -> (Vec<WorkflowEvent>, ResearchState) {
        let mut events = Vec::new();
        while let Some(ev) = self.next_event().await {
            events.push(ev);
        }
        (events, self.state)
    }
}
