use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::json;
use scholar_agent::{
    ToolCallEnvelope, ToolContext, ToolDispatchError, ToolError, ToolSet, TypedTool,
};
use scholar_core::{SessionKey, SessionStore, StateUpdate};

#[derive(Debug, Deserialize, JsonSchema)]
struct ProposeArgs {
    keywords: Vec<String>,
}

#[derive(Debug, Serialize)]
struct ProposeOutput {
    status: &'static str,
    keywords: Vec<String>,
}

struct ProposeTool;

#[async_trait::async_trait]
impl TypedTool for ProposeTool {
    type Args = ProposeArgs;
    type Output = ProposeOutput;

    const NAME: &'static str = "propose";
    const DESCRIPTION: &'static str = "Record a keyword proposal.";

    async fn run(&self, args: Self::Args, ctx: &ToolContext) -> Result<Self::Output, ToolError> {
        if args.keywords.is_empty() {
            return Err(ToolError::InvalidInput("no keywords".to_string()));
        }
        ctx.apply(StateUpdate::ProposeKeywords {
            keywords: args.keywords.clone(),
            turn: ctx.turn,
        })
        .await?;
        Ok(ProposeOutput {
            status: "suggested",
            keywords: args.keywords,
        })
    }
}

async fn ctx() -> ToolContext {
    let store = SessionStore::new();
    let session = SessionKey::new("agents", "demo_user", "s1");
    store.create_session(session.clone()).await.unwrap();
    ToolContext {
        store,
        session,
        agent: "keywords_agent".to_string(),
        turn: 1,
        user_input: "graph neural networks".to_string(),
        call_id: "call-1".to_string(),
    }
}

fn toolset() -> ToolSet {
    ToolSet::new().register_with(ProposeTool).build().unwrap()
}

#[tokio::test]
async fn dispatch_runs_tool_and_writes_state() {
    let ctx = ctx().await;
    let envelope = ToolCallEnvelope {
        name: "propose".to_string(),
        args: json!({"keywords": ["graph neural networks", "GNN"]}),
        call_id: "call-1".to_string(),
    };

    let output = toolset().dispatch(envelope, &ctx).await.unwrap();
    assert_eq!(
        output,
        json!({"status": "suggested", "keywords": ["graph neural networks", "GNN"]})
    );

    let state = ctx.state().await.unwrap();
    assert_eq!(
        state.keywords,
        Some(vec!["graph neural networks".to_string(), "GNN".to_string()])
    );
    assert_eq!(state.first_proposal_turn, Some(1));
    assert!(!state.confirmed);
}

#[tokio::test]
async fn unknown_tool_maps_to_unknown_tool_error() {
    let ctx = ctx().await;
    let envelope = ToolCallEnvelope {
        name: "missing".to_string(),
        args: json!({}),
        call_id: "call-9".to_string(),
    };

    let err = toolset().dispatch(envelope, &ctx).await.unwrap_err();
    assert!(matches!(err, ToolDispatchError::UnknownTool { ref name, .. } if name == "missing"));
    assert_eq!(err.call_id(), "call-9");
}

#[tokio::test]
async fn malformed_args_map_to_invalid_args() {
    let ctx = ctx().await;
    let envelope = ToolCallEnvelope {
        name: "propose".to_string(),
        args: json!({"keywords": "not a list"}),
        call_id: "call-2".to_string(),
    };

    let err = toolset().dispatch(envelope, &ctx).await.unwrap_err();
    assert!(matches!(err, ToolDispatchError::InvalidArgs { .. }));
}

#[tokio::test]
async fn tool_failure_maps_to_execution_error() {
    let ctx = ctx().await;
    let envelope = ToolCallEnvelope {
        name: "propose".to_string(),
        args: json!({"keywords": []}),
        call_id: "call-3".to_string(),
    };

    let err = toolset().dispatch(envelope, &ctx).await.unwrap_err();
    assert!(matches!(
        err,
        ToolDispatchError::Execution {
            source: ToolError::InvalidInput(_),
            ..
        }
    ));
    assert!(ctx.state().await.unwrap().keywords.is_none());
}
