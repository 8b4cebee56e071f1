use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScholarError {
    #[error("LLM provider failed: {0}")]
    LlmProvider(String),
    #[error("LLM provider returned HTTP {status}: {message}")]
    HttpStatus { status: u16, message: String },
    #[error("Tool call failed for '{tool_name}': {reason}")]
    ToolCallFailed { tool_name: String, reason: String },
    #[error("Parsing failed on output '{output}': {reason}")]
    ParseFailed { output: String, reason: String },
    #[error("Max retries ({max}) exceeded: {reason}")]
    MaxRetriesExceeded { max: usize, reason: String },
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Session not found: {0}")]
    SessionNotFound(String),
    #[error("Session already exists: {0}")]
    SessionExists(String),
    #[error("Serialization/deserialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("{0}")]
    Custom(String),
}

impl ScholarError {
    /// Errors that came from the network or the remote service rather than
    /// from local misuse.
    pub fn is_service_failure(&self) -> bool {
        matches!(
            self,
            ScholarError::LlmProvider(_)
                | ScholarError::HttpStatus { .. }
                | ScholarError::MaxRetriesExceeded { .. }
        )
    }
}
