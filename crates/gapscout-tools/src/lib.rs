pub mod builtin;
pub mod registry;

pub use builtin::web_search::WebSearchTool;
pub use registry::ToolRegistry;
