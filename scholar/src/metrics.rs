//! Per-session usage counters, appended to a JSONL file on request.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use scholar_core::TurnEvent;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsCollector {
    keywords_turns: u32,
    retrieved_papers: u64,
    foresee_used: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetricsRecord {
    pub session_id: String,
    pub timestamp: DateTime<Utc>,
    pub keywords_turns: u32,
    pub retrieved_papers: u64,
    pub foresee_used: bool,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_keywords_turn(&mut self) {
        self.keywords_turns += 1;
    }

    /// Picks the paper count out of a `retrieve_papers` result.
    pub fn observe(&mut self, event: &TurnEvent) {
        if let TurnEvent::ToolResult {
            tool_name, output, ..
        } = event
        {
            if tool_name == "retrieve_papers" {
                if let Some(total) = output.get("total").and_then(|total| total.as_u64()) {
                    self.retrieved_papers = total;
                }
            }
        }
    }

    pub fn mark_foresee_used(&mut self) {
        self.foresee_used = true;
    }

    pub fn keywords_turns(&self) -> u32 {
        self.keywords_turns
    }

    pub fn retrieved_papers(&self) -> u64 {
        self.retrieved_papers
    }

    pub fn foresee_used(&self) -> bool {
        self.foresee_used
    }

    pub fn summary(&self) -> String {
        format!(
            "Metric Summary:\n- Keyword refinement turns: {}\n- Retrieved papers: {}\n- Foresee agent used: {}",
            self.keywords_turns,
            self.retrieved_papers,
            if self.foresee_used { "yes" } else { "no" }
        )
    }

    pub fn record(&self, session_id: &str) -> MetricsRecord {
        MetricsRecord {
            session_id: session_id.to_string(),
            timestamp: Utc::now(),
            keywords_turns: self.keywords_turns,
            retrieved_papers: self.retrieved_papers,
            foresee_used: self.foresee_used,
        }
    }

    /// Appends one JSON line for `session_id` to `path`.
    pub fn persist(&self, session_id: &str, path: &Path) -> io::Result<()> {
        let line = serde_json::to_string(&self.record(session_id))?;
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{line}")
    }
}
