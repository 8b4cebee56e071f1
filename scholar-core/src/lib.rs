mod error;
mod event;
mod llm;
mod paper;
mod retry;
mod session;
mod state;
mod tool;

pub use error::ScholarError;
pub use event::TurnEvent;
pub use llm::{LlmRequest, LlmResponse, Message, Role, ToolCall, ToolCallingLlm, ToolSpec};
pub use paper::Paper;
pub use retry::{RetryPolicy, Retrying};
pub use session::{Session, SessionKey, SessionStore};
pub use state::{SessionState, StateUpdate};
pub use tool::ToolError;

pub type Value = serde_json::Value;
