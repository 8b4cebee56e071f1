use futures::stream::BoxStream;
use serde_json::json;
use scholar_core::{
    LlmRequest, LlmResponse, Message, SessionKey, SessionStore, ToolCallingLlm, TurnEvent,
};
use tracing::{debug, warn};

use crate::{LlmAgent, ToolCallEnvelope, ToolContext};

const DEFAULT_MAX_STEPS: usize = 10;

/// Drives agent turns against one model and one session store.
///
/// A turn sends the agent instruction, the agent's earlier exchanges in the
/// session and the new user message to the model, executes any tool calls
/// it asks for, feeds the results back, and repeats until the model answers
/// without calling tools. Every step is surfaced as a [`TurnEvent`].
pub struct Runner<L> {
    llm: L,
    store: SessionStore,
    model: String,
    max_steps: usize,
}

impl<L> Runner<L>
where
    L: ToolCallingLlm,
{
    pub fn new(llm: L, store: SessionStore) -> Self {
        Self {
            llm,
            store,
            model: String::new(),
            max_steps: DEFAULT_MAX_STEPS,
        }
    }

    /// Model name put on each request. Empty leaves the choice to the client.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Runs one turn of `agent`. Events arrive in the order they happen; the
    /// stream ends when the turn is over.
    pub fn run_turn<'a>(
        &'a self,
        agent: &'a LlmAgent,
        session: &'a SessionKey,
        input: impl Into<String>,
    ) -> BoxStream<'a, TurnEvent> {
        let input = input.into();
        Box::pin(async_stream::stream! {
            let turn = match self.store.begin_turn(session, agent.name()).await {
                Ok(turn) => turn,
                Err(err) => {
                    yield TurnEvent::Error { message: err.to_string(), step: 0, recoverable: false };
                    return;
                }
            };
            let history = match self.store.transcript(session, agent.name()).await {
                Ok(history) => history,
                Err(err) => {
                    yield TurnEvent::Error { message: err.to_string(), step: 0, recoverable: false };
                    return;
                }
            };
            debug!(agent = agent.name(), turn, history = history.len(), "starting turn");

            let specs = agent.tools().specs();
            let mut pending = vec![Message::user(input.clone())];
            let mut step = 0;

            loop {
                step += 1;
                if step > self.max_steps {
                    warn!(agent = agent.name(), max_steps = self.max_steps, "turn exceeded step limit");
                    yield TurnEvent::Error {
                        message: format!("agent '{}' stopped after {} steps", agent.name(), self.max_steps),
                        step,
                        recoverable: true,
                    };
                    break;
                }

                let mut messages = Vec::with_capacity(history.len() + pending.len() + 1);
                messages.push(Message::system(agent.instruction()));
                messages.extend(history.iter().cloned());
                messages.extend(pending.iter().cloned());
                let request = LlmRequest {
                    model: self.model.clone(),
                    messages,
                    tools: specs.clone(),
                };

                let LlmResponse { content, tool_calls } = match self.llm.invoke(request).await {
                    Ok(response) => response,
                    Err(err) => {
                        warn!(agent = agent.name(), error = %err, "model call failed");
                        yield TurnEvent::Error {
                            message: err.to_string(),
                            step,
                            recoverable: err.is_service_failure(),
                        };
                        break;
                    }
                };

                if !content.trim().is_empty() {
                    yield TurnEvent::Text { agent: agent.name().to_string(), text: content.clone(), step };
                }
                pending.push(Message::assistant(content, tool_calls.clone()));
                if tool_calls.is_empty() {
                    break;
                }

                for call in tool_calls {
                    yield TurnEvent::ToolInvocation {
                        id: call.id.clone(),
                        tool_name: call.name.clone(),
                        args: call.args.clone(),
                        step,
                    };

                    let ctx = ToolContext {
                        store: self.store.clone(),
                        session: session.clone(),
                        agent: agent.name().to_string(),
                        turn,
                        user_input: input.clone(),
                        call_id: call.id.clone(),
                    };
                    let envelope = ToolCallEnvelope {
                        name: call.name.clone(),
                        args: call.args,
                        call_id: call.id.clone(),
                    };
                    let output = match agent.tools().dispatch(envelope, &ctx).await {
                        Ok(output) => output,
                        Err(err) => {
                            warn!(agent = agent.name(), tool = %call.name, error = %err, "tool call failed");
                            json!({ "error": err.to_string() })
                        }
                    };
                    debug!(agent = agent.name(), tool = %call.name, output = %output, "tool returned");

                    pending.push(Message::tool(call.id.clone(), output.to_string()));
                    yield TurnEvent::ToolResult { id: call.id, tool_name: call.name, output, step };
                }
            }

            // A turn that never reached the model leaves no trace in history.
            if pending.len() > 1 {
                if let Err(err) = self.store.append_transcript(session, agent.name(), pending).await {
                    warn!(agent = agent.name(), error = %err, "could not record turn history");
                }
            }
        })
    }
}
