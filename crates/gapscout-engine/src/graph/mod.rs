pub mod builder;
pub mod executor;
pub mod node;

pub use builder::{CompiledGraph, GraphBuilder, END};
pub use executor::WorkflowRun;
pub use node::Node;
