use crate::ToolSet;

/// An LLM-backed conversational agent: a name, standing instructions, and
/// the tools it may call.
#[derive(Clone, Debug)]
pub struct LlmAgent {
    name: String,
    description: String,
    instruction: String,
    tools: ToolSet,
}

impl LlmAgent {
    pub fn new(name: impl Into<String>, instruction: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            instruction: instruction.into(),
            tools: ToolSet::empty(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_tools(mut self, tools: ToolSet) -> Self {
        self.tools = tools;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn instruction(&self) -> &str {
        &self.instruction
    }

    pub fn tools(&self) -> &ToolSet {
        &self.tools
    }
}
