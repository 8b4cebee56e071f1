#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use serde_json::Value;
use scholar::{Console, ConsoleError, Input};
use scholar_core::{LlmRequest, LlmResponse, Paper, ScholarError, ToolCall, ToolCallingLlm};
use scholar_retrieval::{PaperSource, RetrievalError};

/// Replays canned model responses in order and records every request.
#[derive(Clone, Default)]
pub struct ScriptedLlm {
    responses: Arc<Mutex<VecDeque<Result<LlmResponse, ScholarError>>>>,
    requests: Arc<Mutex<Vec<LlmRequest>>>,
}

impl ScriptedLlm {
    pub fn text(self, content: &str) -> Self {
        self.push(Ok(LlmResponse {
            content: content.to_string(),
            tool_calls: vec![],
        }))
    }

    pub fn call(self, name: &str, args: Value) -> Self {
        let id = format!("call_{}", self.responses.lock().unwrap().len() + 1);
        self.push(Ok(LlmResponse {
            content: String::new(),
            tool_calls: vec![ToolCall {
                id,
                name: name.to_string(),
                args,
            }],
        }))
    }

    pub fn fail(self, error: ScholarError) -> Self {
        self.push(Err(error))
    }

    fn push(self, response: Result<LlmResponse, ScholarError>) -> Self {
        self.responses.lock().unwrap().push_back(response);
        self
    }

    pub fn requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of requests made on behalf of the agent owning `tool`.
    pub fn requests_offering(&self, tool: &str) -> usize {
        self.requests()
            .iter()
            .filter(|request| request.tools.iter().any(|spec| spec.name == tool))
            .count()
    }

    pub fn remaining(&self) -> usize {
        self.responses.lock().unwrap().len()
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
            .unwrap_or_else(|| Err(ScholarError::Custom("model script exhausted".to_string())))
    }
}

/// Feeds canned lines to the orchestrator and captures what it prints.
/// Running out of lines behaves like end of input.
#[derive(Clone, Default)]
pub struct ScriptedConsole {
    inputs: Arc<Mutex<VecDeque<Input>>>,
    prompts: Arc<Mutex<Vec<String>>>,
    output: Arc<Mutex<Vec<String>>>,
}

impl ScriptedConsole {
    pub fn with_lines(lines: &[&str]) -> Self {
        let console = Self::default();
        console
            .inputs
            .lock()
            .unwrap()
            .extend(lines.iter().map(|line| Input::Line(line.to_string())));
        console
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn output(&self) -> String {
        self.output.lock().unwrap().join("\n")
    }
}

#[async_trait::async_trait]
impl Console for ScriptedConsole {
    async fn read_line(&self, prompt: &str) -> Result<Input, ConsoleError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(self
            .inputs
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Input::Interrupted))
    }

    fn print(&self, text: &str) {
        self.output.lock().unwrap().push(text.to_string());
    }
}

/// Paper source returning a fixed result set and recording queries.
#[derive(Default)]
pub struct StubSource {
    pub papers: Vec<Paper>,
    pub fail_with: Option<u16>,
    pub queries: Mutex<Vec<String>>,
}

impl StubSource {
    pub fn with_papers(papers: Vec<Paper>) -> Self {
        Self {
            papers,
            ..Self::default()
        }
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl PaperSource for StubSource {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<Paper>, RetrievalError> {
        self.queries.lock().unwrap().push(query.to_string());
        if let Some(status) = self.fail_with {
            return Err(RetrievalError::Status {
                status,
                body: "unavailable".to_string(),
            });
        }
        Ok(self.papers.iter().take(max_results).cloned().collect())
    }
}

pub fn paper(title: &str, year: &str) -> Paper {
    Paper {
        entry_id: format!("http://arxiv.org/abs/{year}.00001v1"),
        title: title.to_string(),
        authors: vec!["Ada Lovelace".to_string(), "Alan Turing".to_string()],
        published: Some(format!("{year}-01-15T00:00:00+00:00")),
        abstract_text: format!("We study {title}."),
        pdf_url: Some(format!("http://arxiv.org/pdf/{year}.00001v1")),
    }
}

pub fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}
