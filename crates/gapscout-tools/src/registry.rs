use std::collections::HashMap;
use std::sync::Arc;

use gapscout_core::error::{GapscoutError, Result};
use gapscout_core::traits::Tool;
use gapscout_core::types::ToolDefinition;

/// Registry of available tools, keyed by tool name.
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool.
    pub fn register(&mut self, tool: impl Tool) {
        let name = tool.name().to_string();
        self.tools.insert(name, Arc::new(tool));
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// List all registered tool names.
    pub fn list(&self) -> Vec<&str> {
        self.tools.keys().map(|s| s.as_str()).collect()
    }

    /// Get tool definitions for declaring to the Reasoner.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .values()
            .map(|t| ToolDefinition {
                name: t.name().to_string(),
                description: t.description().to_string(),
                input_schema: t.input_schema(),
            })
            .collect()
    }

    /// Invoke a tool by name with a per-tool timeout.
    pub async fn execute(&self, name: &str, arguments: serde_json::Value) -> Result<String> {
        let tool = self
            .get(name)
            .ok_or_else(|| GapscoutError::ToolNotFound(name.to_string()))?;

        let timeout = std::time::Duration::from_secs(tool.timeout_secs());

        match tokio::time::timeout(timeout, tool.invoke(arguments)).await {
            Ok(result) => result,
            Err(_) => Err(GapscoutError::ToolTimeout {
                tool: name.to_string(),
                timeout_secs: tool.timeout_secs(),
            }),
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::future::BoxFuture;

    struct EchoTool;

    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }
        fn description(&self) -> &str {
            "Echo the input back."
        }
        fn input_schema(&self) -> serde_json::Value {
            serde_json::json!({"type": "object"})
        }
        fn invoke(&self, arguments: serde_json::Value) -> BoxFuture<'_, Result<String>> {
            Box::pin(async move { Ok(arguments.to_string()) })
        }
    }

    #[tokio::test]
    async fn test_register_and_execute() {
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool);

        assert_eq!(registry.list(), vec!["echo"]);
        assert_eq!(registry.definitions().len(), 1);

        let out = registry
            .execute("echo", serde_json::json!({"a": 1}))
            .await
            .unwrap();
        assert!(out.contains("\"a\":1"));
    }

    #[tokio::test]
    async fn test_unknown_tool_is_typed_error() {
        let registry = ToolRegistry::new();
        let err = registry
            .execute("missing", serde_json::Value::Null)
            .await
            .unwrap_err();
        assert!(matches!(err, GapscoutError::ToolNotFound(_)));
    }
}
