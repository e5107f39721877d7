use futures::future::BoxFuture;

use crate::error::Result;
use crate::types::{ChatMessage, ToolDefinition};

/// The external capability that produces responses, possibly requesting
/// tool invocations. Implemented by `gapscout-llm` in production and by
/// scripted doubles in tests.
pub trait Reasoner: Send + Sync + 'static {
    /// Respond to a message sequence, with the given tools declared.
    fn respond(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
    ) -> BoxFuture<'_, Result<ChatMessage>>;

    /// Respond with a body guaranteed to parse as JSON matching `schema_hint`.
    ///
    /// Implementations return `GapscoutError::StructuredOutput` when the
    /// model does not honor the requested shape.
    fn respond_structured(
        &self,
        messages: &[ChatMessage],
        schema_hint: &str,
    ) -> BoxFuture<'_, Result<ChatMessage>>;
}

/// An extensible side-effecting capability (e.g. a web query).
pub trait Tool: Send + Sync + 'static {
    /// Tool name (used in Reasoner tool requests).
    fn name(&self) -> &str;

    /// Human-readable description.
    fn description(&self) -> &str;

    /// JSON Schema for tool input.
    fn input_schema(&self) -> serde_json::Value;

    /// Invoke the tool with the given arguments, returning its textual output.
    fn invoke(&self, arguments: serde_json::Value) -> BoxFuture<'_, Result<String>>;

    /// Timeout in seconds for this tool.
    fn timeout_secs(&self) -> u64 {
        30
    }
}
