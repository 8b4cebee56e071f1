use std::collections::HashMap;
use std::sync::Arc;

use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use scholar_core::{SessionKey, SessionState, SessionStore, StateUpdate, ToolSpec};

use crate::error::{ToolDispatchError, ToolSetBuildError};

pub type ToolError = scholar_core::ToolError;

/// What a tool sees of the turn that invoked it.
#[derive(Clone, Debug)]
pub struct ToolContext {
    pub store: SessionStore,
    pub session: SessionKey,
    pub agent: String,
    /// Turn number of `agent` in this session, starting at 1.
    pub turn: u32,
    /// The user utterance that opened the turn.
    pub user_input: String,
    pub call_id: String,
}

impl ToolContext {
    pub async fn state(&self) -> Result<SessionState, ToolError> {
        Ok(self.store.state(&self.session).await?)
    }

    pub async fn apply(&self, update: StateUpdate) -> Result<(), ToolError> {
        Ok(self.store.apply(&self.session, update).await?)
    }
}

/// A tool with typed arguments. The argument schema is derived with
/// `schemars` and handed to the model as the function declaration.
#[async_trait::async_trait]
pub trait TypedTool: Send + Sync + 'static {
    type Args: DeserializeOwned + JsonSchema + Send;
    type Output: Serialize + Send;

    const NAME: &'static str;
    const DESCRIPTION: &'static str;

    async fn run(&self, args: Self::Args, ctx: &ToolContext) -> Result<Self::Output, ToolError>;
}

/// Arguments of a tool that takes none.
#[derive(Clone, Debug, Default, Deserialize, JsonSchema)]
pub struct NoArgs {}

#[derive(Clone, Debug, Deserialize)]
pub struct ToolCallEnvelope {
    pub name: String,
    pub args: Value,
    pub call_id: String,
}

/// A validated set of tools, offered to the model in registration order.
#[derive(Clone, Default)]
pub struct ToolSet {
    tools: Vec<Registered>,
    by_name: HashMap<String, usize>,
}

#[derive(Clone)]
struct Registered {
    spec: ToolSpec,
    runner: Arc<dyn ErasedToolRunner>,
}

impl std::fmt::Debug for ToolSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

impl ToolSet {
    #[allow(clippy::new_ret_no_self)]
    pub fn new() -> ToolSetBuilder {
        ToolSetBuilder::default()
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|tool| tool.spec.name.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Function declarations in registration order.
    pub fn specs(&self) -> Vec<ToolSpec> {
        self.tools.iter().map(|tool| tool.spec.clone()).collect()
    }

    /// Runs the tool named in `envelope` and returns its serialized output.
    pub async fn dispatch(
        &self,
        envelope: ToolCallEnvelope,
        ctx: &ToolContext,
    ) -> Result<Value, ToolDispatchError> {
        let ToolCallEnvelope {
            name,
            args,
            call_id,
        } = envelope;
        match self.by_name.get(&name).map(|&index| &self.tools[index]) {
            Some(tool) => tool.runner.run_erased(&name, args, call_id, ctx).await,
            None => Err(ToolDispatchError::UnknownTool { name, call_id }),
        }
    }
}

#[derive(Clone, Default)]
pub struct ToolSetBuilder {
    pending: Vec<Registered>,
}

impl ToolSetBuilder {
    pub fn register_with<T>(mut self, tool: T) -> Self
    where
        T: TypedTool,
    {
        self.pending.push(Registered {
            spec: ToolSpec {
                name: T::NAME.to_string(),
                description: T::DESCRIPTION.to_string(),
                parameters: args_schema::<T::Args>(),
            },
            runner: Arc::new(TypedToolRunner { tool }),
        });
        self
    }

    /// Checks names and freezes the set. Names must be non-blank and unique.
    pub fn build(self) -> Result<ToolSet, ToolSetBuildError> {
        let mut by_name = HashMap::with_capacity(self.pending.len());
        for (index, tool) in self.pending.iter().enumerate() {
            let name = &tool.spec.name;
            if name.trim().is_empty() {
                return Err(ToolSetBuildError::InvalidName { name: name.clone() });
            }
            if by_name.insert(name.clone(), index).is_some() {
                return Err(ToolSetBuildError::DuplicateName { name: name.clone() });
            }
        }

        Ok(ToolSet {
            tools: self.pending,
            by_name,
        })
    }
}

// Gemini rejects the draft marker and wants the bare object schema.
fn args_schema<A: JsonSchema>() -> Value {
    let mut schema =
        serde_json::to_value(schemars::schema_for!(A)).unwrap_or_else(|_| json!({"type": "object"}));
    if let Some(object) = schema.as_object_mut() {
        object.remove("$schema");
        object.remove("title");
    }
    schema
}

#[async_trait::async_trait]
trait ErasedToolRunner: Send + Sync {
    async fn run_erased(
        &self,
        name: &str,
        args: Value,
        call_id: String,
        ctx: &ToolContext,
    ) -> Result<Value, ToolDispatchError>;
}

struct TypedToolRunner<T> {
    tool: T,
}

#[async_trait::async_trait]
impl<T> ErasedToolRunner for TypedToolRunner<T>
where
    T: TypedTool,
{
    async fn run_erased(
        &self,
        name: &str,
        args: Value,
        call_id: String,
        ctx: &ToolContext,
    ) -> Result<Value, ToolDispatchError> {
        let args: T::Args =
            serde_json::from_value(args).map_err(|source| ToolDispatchError::InvalidArgs {
                name: name.to_string(),
                call_id: call_id.clone(),
                source,
            })?;

        let output =
            self.tool
                .run(args, ctx)
                .await
                .map_err(|source| ToolDispatchError::Execution {
                    name: name.to_string(),
                    call_id: call_id.clone(),
                    source,
                })?;

        serde_json::to_value(output).map_err(|source| ToolDispatchError::Serialization {
            name: name.to_string(),
            call_id,
            source,
        })
    }
}
