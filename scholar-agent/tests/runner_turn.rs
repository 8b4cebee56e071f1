use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use futures::StreamExt;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{json, Value};
use scholar_agent::{LlmAgent, NoArgs, Runner, ToolContext, ToolError, ToolSet, TypedTool};
use scholar_core::{
    LlmRequest, LlmResponse, Role, ScholarError, SessionKey, SessionStore, ToolCall,
    ToolCallingLlm, TurnEvent,
};

#[derive(Clone, Default)]
struct ScriptedLlm {
    responses: Arc<Mutex<VecDeque<Result<LlmResponse, ScholarError>>>>,
    requests: Arc<Mutex<Vec<LlmRequest>>>,
}

impl ScriptedLlm {
    fn push(&self, response: Result<LlmResponse, ScholarError>) {
        self.responses.lock().unwrap().push_back(response);
    }

    fn requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ToolCallingLlm for ScriptedLlm {
    async fn invoke(&self, request: LlmRequest) -> Result<LlmResponse, ScholarError> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ScholarError::Custom("script exhausted".to_string())))
    }
}

fn text(content: &str) -> Result<LlmResponse, ScholarError> {
    Ok(LlmResponse {
        content: content.to_string(),
        tool_calls: vec![],
    })
}

fn call(id: &str, name: &str, args: Value) -> Result<LlmResponse, ScholarError> {
    Ok(LlmResponse {
        content: String::new(),
        tool_calls: vec![ToolCall {
            id: id.to_string(),
            name: name.to_string(),
            args,
        }],
    })
}

struct TurnProbe;

#[async_trait::async_trait]
impl TypedTool for TurnProbe {
    type Args = NoArgs;
    type Output = Value;

    const NAME: &'static str = "turn_probe";
    const DESCRIPTION: &'static str = "Report the turn and the user input.";

    async fn run(&self, _args: Self::Args, ctx: &ToolContext) -> Result<Self::Output, ToolError> {
        Ok(json!({"turn": ctx.turn, "input": ctx.user_input, "agent": ctx.agent}))
    }
}

#[derive(Deserialize, JsonSchema)]
struct FailArgs {}

struct AlwaysFails;

#[async_trait::async_trait]
impl TypedTool for AlwaysFails {
    type Args = FailArgs;
    type Output = Value;

    const NAME: &'static str = "always_fails";
    const DESCRIPTION: &'static str = "Fail.";

    async fn run(&self, _args: Self::Args, _ctx: &ToolContext) -> Result<Self::Output, ToolError> {
        Err(ToolError::ExecutionFailed("boom".to_string()))
    }
}

fn agent() -> LlmAgent {
    let tools = ToolSet::new()
        .register_with(TurnProbe)
        .register_with(AlwaysFails)
        .build()
        .unwrap();
    LlmAgent::new("probe_agent", "You probe things.").with_tools(tools)
}

async fn session(store: &SessionStore) -> SessionKey {
    let key = SessionKey::new("agents", "demo_user", "demo_session_test");
    store.create_session(key.clone()).await.unwrap();
    key
}

#[tokio::test]
async fn plain_answer_yields_single_text_event() {
    let llm = ScriptedLlm::default();
    llm.push(text("hello there"));
    let store = SessionStore::new();
    let key = session(&store).await;
    let runner = Runner::new(llm.clone(), store);
    let agent = agent();

    let events: Vec<TurnEvent> = runner.run_turn(&agent, &key, "hi").collect().await;

    assert_eq!(
        events,
        vec![TurnEvent::Text {
            agent: "probe_agent".to_string(),
            text: "hello there".to_string(),
            step: 1,
        }]
    );

    let requests = llm.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].messages[0].role, Role::System);
    assert_eq!(requests[0].messages[0].content, "You probe things.");
    assert_eq!(requests[0].messages[1].content, "hi");
    assert_eq!(requests[0].tools.len(), 2);
}

#[tokio::test]
async fn tool_calls_are_executed_and_fed_back() {
    let llm = ScriptedLlm::default();
    llm.push(call("c1", "turn_probe", json!({})));
    llm.push(text("done"));
    let store = SessionStore::new();
    let key = session(&store).await;
    let runner = Runner::new(llm.clone(), store);
    let agent = agent();

    let events: Vec<TurnEvent> = runner.run_turn(&agent, &key, "probe").collect().await;

    assert_eq!(events.len(), 3);
    assert!(matches!(&events[0], TurnEvent::ToolInvocation { id, tool_name, step: 1, .. }
        if id == "c1" && tool_name == "turn_probe"));
    assert!(matches!(&events[1], TurnEvent::ToolResult { output, step: 1, .. }
        if *output == json!({"turn": 1, "input": "probe", "agent": "probe_agent"})));
    assert!(matches!(&events[2], TurnEvent::Text { text, step: 2, .. } if text == "done"));

    let second = &llm.requests()[1];
    let last = second.messages.last().unwrap();
    assert_eq!(last.role, Role::Tool);
    assert_eq!(last.tool_call_id.as_deref(), Some("c1"));
}

#[tokio::test]
async fn tool_errors_are_reported_back_to_the_model() {
    let llm = ScriptedLlm::default();
    llm.push(call("c1", "always_fails", json!({})));
    llm.push(text("sorry"));
    let store = SessionStore::new();
    let key = session(&store).await;
    let runner = Runner::new(llm.clone(), store);
    let agent = agent();

    let events: Vec<TurnEvent> = runner.run_turn(&agent, &key, "go").collect().await;

    let TurnEvent::ToolResult { output, .. } = &events[1] else {
        panic!("expected tool result, got {:?}", events[1]);
    };
    assert!(output["error"].as_str().unwrap().contains("boom"));
    assert!(matches!(&events[2], TurnEvent::Text { text, .. } if text == "sorry"));
}

#[tokio::test]
async fn model_failure_ends_turn_with_recoverable_error() {
    let llm = ScriptedLlm::default();
    llm.push(Err(ScholarError::HttpStatus {
        status: 503,
        message: "overloaded".to_string(),
    }));
    let store = SessionStore::new();
    let key = session(&store).await;
    let runner = Runner::new(llm, store.clone());
    let agent = agent();

    let events: Vec<TurnEvent> = runner.run_turn(&agent, &key, "hi").collect().await;

    assert_eq!(events.len(), 1);
    assert!(matches!(&events[0], TurnEvent::Error { recoverable: true, message, .. }
        if message.contains("503")));
    assert!(store.transcript(&key, "probe_agent").await.unwrap().is_empty());
}

#[tokio::test]
async fn history_carries_over_between_turns() {
    let llm = ScriptedLlm::default();
    llm.push(text("first answer"));
    llm.push(call("c1", "turn_probe", json!({})));
    llm.push(text("second answer"));
    let store = SessionStore::new();
    let key = session(&store).await;
    let runner = Runner::new(llm.clone(), store.clone());
    let agent = agent();

    let _: Vec<TurnEvent> = runner.run_turn(&agent, &key, "one").collect().await;
    let events: Vec<TurnEvent> = runner.run_turn(&agent, &key, "two").collect().await;

    assert!(matches!(&events[1], TurnEvent::ToolResult { output, .. } if output["turn"] == 2));

    let requests = llm.requests();
    let contents: Vec<&str> = requests[1]
        .messages
        .iter()
        .map(|message| message.content.as_str())
        .collect();
    assert_eq!(contents, ["You probe things.", "one", "first answer", "two"]);
    assert_eq!(store.get_session(&key).await.unwrap().turns("probe_agent"), 2);
}

#[tokio::test]
async fn step_limit_stops_a_looping_model() {
    let llm = ScriptedLlm::default();
    for n in 0..3 {
        llm.push(call(&format!("c{n}"), "turn_probe", json!({})));
    }
    let store = SessionStore::new();
    let key = session(&store).await;
    let runner = Runner::new(llm.clone(), store).with_max_steps(2);
    let agent = agent();

    let events: Vec<TurnEvent> = runner.run_turn(&agent, &key, "loop").collect().await;

    assert_eq!(llm.requests().len(), 2);
    assert!(matches!(events.last(), Some(TurnEvent::Error { step: 3, .. })));
}

#[tokio::test]
async fn missing_session_yields_unrecoverable_error() {
    let llm = ScriptedLlm::default();
    let runner = Runner::new(llm.clone(), SessionStore::new());
    let agent = agent();
    let key = SessionKey::new("agents", "demo_user", "nope");

    let events: Vec<TurnEvent> = runner.run_turn(&agent, &key, "hi").collect().await;

    assert!(matches!(&events[..], [TurnEvent::Error { recoverable: false, .. }]));
    assert!(llm.requests().is_empty());
}
