// Provider-specific clients (feature-gated)
pub mod providers;

pub use scholar_core::{
    LlmRequest, LlmResponse, Message, RetryPolicy, Retrying, Role, ToolCall, ToolCallingLlm,
    ToolSpec,
};

#[cfg(feature = "google")]
pub use providers::google::GoogleClient;
