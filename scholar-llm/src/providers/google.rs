//! Google Gemini API LLM client

use std::collections::HashMap;
use std::time::Duration;

use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use scholar_core::{
    LlmRequest, LlmResponse, Message, Role, ScholarError, ToolCall, ToolCallingLlm, ToolSpec,
};
use tracing::debug;

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

#[derive(Clone)]
pub struct GoogleClient {
    base_url: String,
    api_key: SecretString,
    model: String,
    http: Client,
}

impl std::fmt::Debug for GoogleClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl GoogleClient {
    pub fn new(api_key: SecretString, model: impl Into<String>) -> Result<Self, ScholarError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|err| ScholarError::InvalidConfig(err.to_string()))?;
        Ok(Self {
            base_url: GEMINI_BASE_URL.to_string(),
            api_key,
            model: model.into(),
            http,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// `generateContent` endpoint for the request model, or the client
    /// default when the request leaves it empty.
    fn generate_url(&self, request_model: &str) -> String {
        let requested = request_model.trim();
        let model = if requested.is_empty() {
            self.model.trim()
        } else {
            requested
        };
        let model = model.strip_prefix("models/").unwrap_or(model);
        let base = self.base_url.trim_end_matches('/');
        format!("{base}/v1beta/models/{model}:generateContent")
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<GeminiTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_config: Option<ToolConfig>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    function_call: Option<FunctionCall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    function_response: Option<FunctionResponse>,
}

impl Part {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }
}

impl Content {
    fn with_role(role: &str, parts: Vec<Part>) -> Self {
        Self {
            role: Some(role.to_string()),
            parts,
        }
    }

    /// A user turn that carries nothing but function responses.
    fn holds_only_responses(&self) -> bool {
        self.role.as_deref() == Some("user")
            && self.parts.iter().all(|part| part.function_response.is_some())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
struct FunctionCall {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    name: String,
    #[serde(default)]
    args: Value,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
struct FunctionResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    name: String,
    response: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiTool {
    function_declarations: Vec<FunctionDeclaration>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FunctionDeclaration {
    name: String,
    description: String,
    parameters_json_schema: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ToolConfig {
    function_calling_config: FunctionCallingConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FunctionCallingConfig {
    mode: String,
    allowed_function_names: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorResponse {
    error: GoogleErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorDetail {
    message: String,
}

const BLOCKED_FINISH_REASONS: &[&str] = &["SAFETY", "RECITATION", "BLOCKLIST"];

impl From<&ToolSpec> for FunctionDeclaration {
    fn from(spec: &ToolSpec) -> Self {
        Self {
            name: spec.name.clone(),
            description: spec.description.clone(),
            parameters_json_schema: spec.parameters.clone(),
        }
    }
}

impl GenerateContentRequest {
    fn from_request(request: &LlmRequest) -> Self {
        let instruction: Vec<Part> = request
            .messages
            .iter()
            .filter(|message| message.role == Role::System)
            .map(|message| Part::text(message.content.as_str()))
            .collect();

        let mut transcript = Transcript::default();
        for message in &request.messages {
            transcript.push(message);
        }

        let (tools, tool_config) = if request.tools.is_empty() {
            (None, None)
        } else {
            let declarations = request.tools.iter().map(FunctionDeclaration::from).collect();
            let config = ToolConfig {
                function_calling_config: FunctionCallingConfig {
                    mode: "AUTO".to_string(),
                    allowed_function_names: request
                        .tools
                        .iter()
                        .map(|spec| spec.name.clone())
                        .collect(),
                },
            };
            (
                Some(vec![GeminiTool {
                    function_declarations: declarations,
                }]),
                Some(config),
            )
        };

        Self {
            contents: transcript.contents,
            system_instruction: (!instruction.is_empty()).then(|| Content {
                role: None,
                parts: instruction,
            }),
            tools,
            tool_config,
        }
    }
}

/// Gemini `contents` built up message by message. Function responses carry
/// the name of the call they answer, so call ids are remembered on the way.
#[derive(Default)]
struct Transcript {
    contents: Vec<Content>,
    call_names: HashMap<String, String>,
}

impl Transcript {
    fn push(&mut self, message: &Message) {
        match message.role {
            Role::System => {}
            Role::User => self.contents.push(Content::with_role(
                "user",
                vec![Part::text(message.content.as_str())],
            )),
            Role::Assistant => self.push_model(message),
            Role::Tool => self.push_tool_result(message),
        }
    }

    fn push_model(&mut self, message: &Message) {
        let text = (!message.content.is_empty()).then(|| Part::text(message.content.as_str()));
        let calls = message.tool_calls.iter().map(|call| {
            self.call_names.insert(call.id.clone(), call.name.clone());
            Part {
                function_call: Some(FunctionCall {
                    id: None,
                    name: call.name.clone(),
                    args: call.args.clone(),
                }),
                ..Part::default()
            }
        });
        let parts: Vec<Part> = text.into_iter().chain(calls).collect();
        if !parts.is_empty() {
            self.contents.push(Content::with_role("model", parts));
        }
    }

    fn push_tool_result(&mut self, message: &Message) {
        let name = message
            .tool_call_id
            .as_ref()
            .and_then(|id| self.call_names.get(id))
            .map_or("tool", String::as_str)
            .to_string();
        let part = Part {
            function_response: Some(FunctionResponse {
                id: None,
                name,
                response: response_object(&message.content),
            }),
            ..Part::default()
        };

        // Responses to calls from the same model turn travel together.
        match self.contents.last_mut() {
            Some(last) if last.holds_only_responses() => last.parts.push(part),
            _ => self.contents.push(Content::with_role("user", vec![part])),
        }
    }
}

/// `functionResponse.response` has to be a JSON object.
fn response_object(output: &str) -> Value {
    match serde_json::from_str::<Value>(output) {
        Ok(value @ Value::Object(_)) => value,
        Ok(other) => json!({ "content": other }),
        Err(_) => json!({ "content": output }),
    }
}

fn call_args(args: Value) -> Value {
    match args {
        Value::Object(_) => args,
        Value::Null => json!({}),
        other => json!({ "value": other }),
    }
}

impl Candidate {
    fn into_response(self) -> Result<LlmResponse, ScholarError> {
        let mut content = String::new();
        let mut tool_calls: Vec<ToolCall> = Vec::new();

        for part in self.content.map(|content| content.parts).unwrap_or_default() {
            if let Some(text) = part.text {
                content.push_str(&text);
            }
            if let Some(call) = part.function_call {
                let id = call
                    .id
                    .unwrap_or_else(|| format!("google_call_{}", tool_calls.len() + 1));
                tool_calls.push(ToolCall {
                    id,
                    name: call.name,
                    args: call_args(call.args),
                });
            }
        }

        if content.is_empty() && tool_calls.is_empty() {
            if let Some(reason) = self
                .finish_reason
                .filter(|reason| BLOCKED_FINISH_REASONS.contains(&reason.as_str()))
            {
                return Err(ScholarError::LlmProvider(format!(
                    "Generation blocked: {reason}"
                )));
            }
        }

        Ok(LlmResponse {
            content,
            tool_calls,
        })
    }
}

/// The `error.message` of a Gemini error body, or the raw body.
fn error_message(body: String) -> String {
    serde_json::from_str::<GoogleErrorResponse>(&body)
        .map(|parsed| parsed.error.message)
        .unwrap_or(body)
}

#[async_trait::async_trait]
impl ToolCallingLlm for GoogleClient {
    async fn invoke(&self, input: LlmRequest) -> Result<LlmResponse, ScholarError> {
        let body = GenerateContentRequest::from_request(&input);
        let url = self.generate_url(&input.model);
        debug!(
            %url,
            contents = body.contents.len(),
            tools = input.tools.len(),
            "sending generateContent request"
        );

        let response = self
            .http
            .post(url)
            .query(&[("key", self.api_key.expose_secret().as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|err| ScholarError::LlmProvider(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ScholarError::HttpStatus {
                status: status.as_u16(),
                message: error_message(text),
            });
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|err| ScholarError::LlmProvider(err.to_string()))?;

        parsed
            .candidates
            .unwrap_or_default()
            .into_iter()
            .next()
            .ok_or_else(|| ScholarError::LlmProvider("No candidates in response".to_string()))?
            .into_response()
    }
}
