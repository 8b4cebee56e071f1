use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use scholar::logging::{self, LogSink};
use scholar::orchestrator::INTERRUPTED_MESSAGE;
use scholar::{Agents, Cli, Orchestrator, TerminalConsole};
use scholar_agent::Runner;
use scholar_core::{RetryPolicy, Retrying, SessionStore};
use scholar_llm::GoogleClient;
use scholar_retrieval::ArxivClient;
use tracing::{error, info, warn};

async fn run(cli: Cli) -> Result<()> {
    let config = cli.into_config()?;
    info!(model = %config.model, "Starting Research Assistant application");

    let mut client = GoogleClient::new(config.api_key.clone(), config.model.clone())?;
    if let Some(url) = &config.gemini_url {
        client = client.with_base_url(url.clone());
    }
    let llm = Retrying::new(client, RetryPolicy::default());

    let source = ArxivClient::new()?.with_base_url(config.arxiv_url.clone());
    let agents = Agents::build(Arc::new(source))?;
    let runner = Runner::new(llm, SessionStore::new()).with_model(config.model.clone());
    let console = TerminalConsole::new()?;
    let orchestrator = Orchestrator::new(runner, agents, console);

    let report = tokio::select! {
        report = orchestrator.run() => report?,
        _ = tokio::signal::ctrl_c() => {
            println!("{INTERRUPTED_MESSAGE}");
            info!("interrupted during an agent turn");
            return Ok(());
        }
    };

    if let Some(path) = &config.metrics_file {
        println!("\n{}", report.metrics.summary());
        report
            .metrics
            .persist(&report.session_id, path)
            .with_context(|| format!("Failed to write metrics to {}", path.display()))?;
    }

    info!(outcome = ?report.outcome, "Research Assistant session finished.");
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    if let LogSink::Stderr { reason } = logging::init(&cli.log_file) {
        warn!(%reason, "log file unavailable, logging to stderr");
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = ?err, "Fatal error while running Research Assistant");
            println!("\n⚠️ The Research Assistant encountered an unexpected error.");
            println!("It might be due to network issues or the LLM service being overloaded.");
            println!("Details: {err:#}");
            ExitCode::FAILURE
        }
    }
}
