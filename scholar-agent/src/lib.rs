//! Agents that talk to a tool-calling model and act on session state
//! through typed tools.

mod agent;
mod error;
mod runner;
mod tooling;

pub use agent::LlmAgent;
pub use error::{ToolDispatchError, ToolSetBuildError};
pub use runner::Runner;
pub use tooling::{
    NoArgs, ToolCallEnvelope, ToolContext, ToolError, ToolSet, ToolSetBuilder, TypedTool,
};
