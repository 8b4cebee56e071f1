//! Sequencing of a research session: keyword negotiation, retrieval, then
//! optional foresight.

use futures::StreamExt;
use scholar_agent::{LlmAgent, Runner};
use scholar_core::{ScholarError, SessionKey, SessionState, ToolCallingLlm, TurnEvent};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::agents::Agents;
use crate::console::{Console, ConsoleError, Input};
use crate::metrics::MetricsCollector;
use crate::render::render_event;

pub const APP_NAME: &str = "agents";
pub const USER_ID: &str = "demo_user";

const KEYWORDS_LABEL: &str = "Keywords Agent";
const RETRIEVAL_LABEL: &str = "Retrieval Agent";
const FORESEE_LABEL: &str = "Foresee Agent";

const EXIT_WORDS: &[&str] = &["exit", "quit"];
const SKIP_WORDS: &[&str] = &["skip", "no", "n"];

pub const INTERRUPTED_MESSAGE: &str = "\n👋 Interrupted by user. Exiting...";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Phase {
    Negotiating,
    Retrieving { keywords: Vec<String> },
    Foreseeing { keywords: Vec<String> },
    Finished(Outcome),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The user typed an exit word.
    Exited,
    /// Ctrl-C or end of input at a prompt.
    Interrupted,
    /// The user declined the foresight step.
    Skipped,
    Completed,
}

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error(transparent)]
    Session(#[from] ScholarError),
    #[error(transparent)]
    Console(#[from] ConsoleError),
    #[error("{agent} failed: {message}")]
    Turn { agent: String, message: String },
}

/// What is left of a session once it ends.
#[derive(Clone, Debug)]
pub struct SessionReport {
    pub session_id: String,
    pub outcome: Outcome,
    /// Session state as the last phase left it.
    pub state: SessionState,
    pub metrics: MetricsCollector,
}

enum Reply {
    Text(String),
    End(Outcome),
}

pub fn new_session_id() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("demo_session_{}", &hex[..8])
}

pub fn is_exit(input: &str) -> bool {
    EXIT_WORDS.contains(&input.trim().to_lowercase().as_str())
}

pub fn is_skip(input: &str) -> bool {
    SKIP_WORDS.contains(&input.trim().to_lowercase().as_str())
}

pub fn retrieval_prompt(keywords: &[String]) -> String {
    format!(
        "Please retrieve papers from arXiv using these keywords: {}. Use the `retrieve_papers` \
         tool and then summarize the results in a numbered list with title, authors, year, and \
         abstract.",
        keywords.join(", ")
    )
}

pub fn foresee_prompt(keywords: &[String]) -> String {
    format!(
        "Please analyze the retrieved papers using your tool `get_retrieved_papers`. The \
         confirmed search keywords were: {}. First summarize the current research themes and \
         hotspots, then propose 3–5 concrete future research directions.",
        keywords.join(", ")
    )
}

pub struct Orchestrator<L, C> {
    runner: Runner<L>,
    agents: Agents,
    console: C,
}

impl<L, C> Orchestrator<L, C>
where
    L: ToolCallingLlm,
    C: Console,
{
    pub fn new(runner: Runner<L>, agents: Agents, console: C) -> Self {
        Self {
            runner,
            agents,
            console,
        }
    }

    /// Runs one session from the banner to its end. The session is removed
    /// from the store before returning.
    pub async fn run(&self) -> Result<SessionReport, OrchestratorError> {
        let session = SessionKey::new(APP_NAME, USER_ID, new_session_id());
        self.runner.store().create_session(session.clone()).await?;
        info!(session = %session, "session started");

        let result = self.drive_phases(&session).await;
        let state = self.runner.store().delete_session(&session).await;
        let (outcome, metrics) = result?;
        info!(session = %session, ?outcome, "session finished");

        Ok(SessionReport {
            session_id: session.session_id,
            outcome,
            state: state.map(|session| session.state).unwrap_or_default(),
            metrics,
        })
    }

    async fn drive_phases(
        &self,
        session: &SessionKey,
    ) -> Result<(Outcome, MetricsCollector), OrchestratorError> {
        let mut metrics = MetricsCollector::new();

        self.console.print(
            "\n🦉 I am your private research assistant. We will first agree on search keywords, \
             then retrieve papers from arXiv.",
        );
        self.console.print("Type 'exit' to end the conversation.\n");

        let mut phase = Phase::Negotiating;
        loop {
            info!(?phase, "entering phase");
            phase = match phase {
                Phase::Negotiating => self.negotiate(session, &mut metrics).await?,
                Phase::Retrieving { keywords } => {
                    self.retrieve(session, keywords, &mut metrics).await?
                }
                Phase::Foreseeing { keywords } => {
                    self.foresee(session, keywords, &mut metrics).await?
                }
                Phase::Finished(outcome) => return Ok((outcome, metrics)),
            };
        }
    }

    async fn negotiate(
        &self,
        session: &SessionKey,
        metrics: &mut MetricsCollector,
    ) -> Result<Phase, OrchestratorError> {
        self.console
            .print("Step 1: Please briefly describe your research topic.");
        let mut utterance = match self.prompt_nonempty("You > ").await? {
            Reply::Text(text) => text,
            Reply::End(outcome) => return Ok(Phase::Finished(outcome)),
        };

        loop {
            self.console
                .print("\n🔎 Keywords Agent is analyzing your query...\n");
            metrics.record_keywords_turn();
            self.run_turn(&self.agents.keywords, KEYWORDS_LABEL, session, utterance, metrics)
                .await?;

            let state = self.runner.store().state(session).await?;
            if let Some(keywords) = state.accepted_keywords() {
                info!(?keywords, "keywords confirmed");
                return Ok(Phase::Retrieving { keywords });
            }

            self.console.print(
                "\nThe keywords are not confirmed yet. You can refine your request or say which \
                 keywords you prefer.",
            );
            utterance = match self.prompt_nonempty("You (keyword refinement) > ").await? {
                Reply::Text(text) => text,
                Reply::End(outcome) => return Ok(Phase::Finished(outcome)),
            };
        }
    }

    async fn retrieve(
        &self,
        session: &SessionKey,
        keywords: Vec<String>,
        metrics: &mut MetricsCollector,
    ) -> Result<Phase, OrchestratorError> {
        self.console
            .print(&format!("\n✅ Confirmed keywords: {}", keywords.join(", ")));
        self.console
            .print("Step 2: I will now retrieve papers from arXiv using these keywords.");

        self.run_turn(
            &self.agents.retrieval,
            RETRIEVAL_LABEL,
            session,
            retrieval_prompt(&keywords),
            metrics,
        )
        .await?;

        Ok(Phase::Foreseeing { keywords })
    }

    async fn foresee(
        &self,
        session: &SessionKey,
        keywords: Vec<String>,
        metrics: &mut MetricsCollector,
    ) -> Result<Phase, OrchestratorError> {
        self.console.print(
            "Step 3: I can give you a summary of this research and show you potential future \
             directions, press 'Enter' to start.",
        );
        match self
            .prompt("Press Enter to continue, or type 'skip' to skip this step > ")
            .await?
        {
            Reply::End(Outcome::Exited) => return Ok(Phase::Finished(Outcome::Skipped)),
            Reply::End(outcome) => return Ok(Phase::Finished(outcome)),
            Reply::Text(answer) if is_skip(&answer) => {
                return Ok(Phase::Finished(Outcome::Skipped))
            }
            Reply::Text(_) => {}
        }

        metrics.mark_foresee_used();
        self.run_turn(
            &self.agents.foresee,
            FORESEE_LABEL,
            session,
            foresee_prompt(&keywords),
            metrics,
        )
        .await?;

        Ok(Phase::Finished(Outcome::Completed))
    }

    /// Drains one agent turn, rendering events as they arrive.
    async fn run_turn(
        &self,
        agent: &LlmAgent,
        label: &str,
        session: &SessionKey,
        message: String,
        metrics: &mut MetricsCollector,
    ) -> Result<(), OrchestratorError> {
        let mut events = self.runner.run_turn(agent, session, message);
        while let Some(event) = events.next().await {
            metrics.observe(&event);
            if let TurnEvent::Error {
                message,
                recoverable: false,
                ..
            } = &event
            {
                return Err(OrchestratorError::Turn {
                    agent: agent.name().to_string(),
                    message: message.clone(),
                });
            }
            if let TurnEvent::Error { message, .. } = &event {
                warn!(agent = agent.name(), %message, "turn ended with an error");
            }
            if let Some(text) = render_event(label, &event) {
                self.console.print(&text);
            }
        }
        Ok(())
    }

    async fn prompt(&self, prompt: &str) -> Result<Reply, OrchestratorError> {
        match self.console.read_line(prompt).await? {
            Input::Interrupted => {
                self.console.print(INTERRUPTED_MESSAGE);
                Ok(Reply::End(Outcome::Interrupted))
            }
            Input::Line(line) if is_exit(&line) => Ok(Reply::End(Outcome::Exited)),
            Input::Line(line) => Ok(Reply::Text(line.trim().to_string())),
        }
    }

    async fn prompt_nonempty(&self, prompt: &str) -> Result<Reply, OrchestratorError> {
        loop {
            match self.prompt(prompt).await? {
                Reply::Text(text) if text.is_empty() => continue,
                reply => return Ok(reply),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_ids_have_eight_hex_chars() {
        let id = new_session_id();
        let suffix = id.strip_prefix("demo_session_").unwrap();
        assert_eq!(suffix.len(), 8);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn exit_and_skip_words_ignore_case_and_whitespace() {
        assert!(is_exit(" EXIT "));
        assert!(is_exit("Quit"));
        assert!(!is_exit("exit now"));
        assert!(is_skip("N"));
        assert!(is_skip("skip"));
        assert!(!is_skip(""));
    }

    #[test]
    fn phase_prompts_list_keywords() {
        let keywords = vec!["quantum computing".to_string(), "qubits".to_string()];
        assert!(retrieval_prompt(&keywords).contains("these keywords: quantum computing, qubits."));
        assert!(foresee_prompt(&keywords).contains("were: quantum computing, qubits."));
    }
}
