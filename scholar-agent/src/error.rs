use scholar_core::ToolError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ToolDispatchError {
    #[error("unknown tool '{name}' (call {call_id})")]
    UnknownTool { name: String, call_id: String },
    #[error("invalid arguments for tool '{name}' (call {call_id}): {source}")]
    InvalidArgs {
        name: String,
        call_id: String,
        source: serde_json::Error,
    },
    #[error("tool '{name}' failed (call {call_id}): {source}")]
    Execution {
        name: String,
        call_id: String,
        source: ToolError,
    },
    #[error("could not serialize output of tool '{name}' (call {call_id}): {source}")]
    Serialization {
        name: String,
        call_id: String,
        source: serde_json::Error,
    },
}

impl ToolDispatchError {
    pub fn call_id(&self) -> &str {
        match self {
            Self::UnknownTool { call_id, .. }
            | Self::InvalidArgs { call_id, .. }
            | Self::Execution { call_id, .. }
            | Self::Serialization { call_id, .. } => call_id,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ToolSetBuildError {
    #[error("tool name must not be empty or whitespace: {name:?}")]
    InvalidName { name: String },
    #[error("duplicate tool name: {name}")]
    DuplicateName { name: String },
}
