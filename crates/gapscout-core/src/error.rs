use thiserror::Error;

#[derive(Debug, Error)]
pub enum GapscoutError {
    // Reasoner errors
    #[error("Reasoner request failed: {0}")]
    Reasoner(String),

    #[error("Structured output did not match the requested shape: {0}")]
    StructuredOutput(String),

    // Pipeline errors
    #[error("Precondition failed: {0}")]
    Precondition(String),

    // Tool errors
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Tool execution failed: {tool}: {message}")]
    ToolExecution { tool: String, message: String },

    #[error("Tool timeout after {timeout_secs}s: {tool}")]
    ToolTimeout { tool: String, timeout_secs: u64 },

    #[error("Tool input validation failed: {0}")]
    ToolValidation(String),

    // Graph errors
    #[error("Graph error: {0}")]
    Graph(String),

    #[error("Workflow exceeded max steps ({0})")]
    MaxStepsExceeded(usize),

    // Config errors
    #[error("Config error: {0}")]
    Config(String),

    #[error("Config file not found: {0}")]
    ConfigNotFound(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // JSON errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GapscoutError {
    /// Whether this error aborts a whole workflow run.
    ///
    /// Tool-level failures are recovered locally by the dispatcher (rendered
    /// into result strings); everything else escalates.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Self::ToolNotFound(_)
                | Self::ToolExecution { .. }
                | Self::ToolTimeout { .. }
                | Self::ToolValidation(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, GapscoutError>;
