use serde::{Deserialize, Serialize};

use crate::Value;

/// One discrete item produced while an agent handles a single user turn.
///
/// A turn is an ordered sequence of these events; consumers render them in
/// the order they arrive.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum TurnEvent {
    Text {
        agent: String,
        text: String,
        step: usize,
    },
    ToolInvocation {
        id: String,
        tool_name: String,
        args: Value,
        step: usize,
    },
    ToolResult {
        id: String,
        tool_name: String,
        output: Value,
        step: usize,
    },
    Error {
        message: String,
        step: usize,
        recoverable: bool,
    },
}

impl TurnEvent {
    pub fn step(&self) -> usize {
        match self {
            Self::Text { step, .. }
            | Self::ToolInvocation { step, .. }
            | Self::ToolResult { step, .. }
            | Self::Error { step, .. } => *step,
        }
    }

    pub fn tool_name(&self) -> Option<&str> {
        match self {
            Self::ToolInvocation { tool_name, .. } | Self::ToolResult { tool_name, .. } => {
                Some(tool_name.as_str())
            }
            _ => None,
        }
    }
}
