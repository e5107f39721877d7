use futures::future::BoxFuture;

use gapscout_core::error::Result;

use crate::state::{ResearchState, StatePatch};

/// A named unit of work in the workflow graph.
///
/// A node reads from the shared state and returns only the fields it intends
/// to change; it never mutates state directly. Side effects (Reasoner or
/// tool invocations) are permitted inside `run`.
pub trait Node: Send + Sync + 'static {
    /// Unique node name, used for wiring and step events.
    fn name(&self) -> &str;

    /// Produce this step's partial state update.
    fn run<'a>(&'a self, state: &'a ResearchState) -> BoxFuture<'a, Result<StatePatch>>;

    /// Internal bookkeeping steps are emitted with an empty delta in the
    /// event stream, keeping intermediate message content out of the
    /// delivery layer.
    fn internal(&self) -> bool {
        false
    }
}
