use std::path::PathBuf;

use clap::Parser;
use secrecy::SecretString;
use scholar_retrieval::ARXIV_API_URL;
use thiserror::Error;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-lite";
pub const DEFAULT_LOG_FILE: &str = "research_assistant.log";
pub const DEFAULT_METRICS_FILE: &str = "metrics.jsonl";
pub const DEFAULT_LOG_FILTER: &str = "info,reqwest=warn,hyper=warn";

/// Conversational research assistant: agree on keywords, retrieve papers
/// from arXiv, and sketch where the field is heading.
#[derive(Debug, Parser)]
#[command(name = "scholar", version, about)]
pub struct Cli {
    /// Gemini API key. Falls back to GOOGLE_API_KEY.
    #[arg(long, env = "API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Gemini model used by all three agents.
    #[arg(long, env = "SCHOLAR_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Append-only log file.
    #[arg(long, env = "SCHOLAR_LOG_FILE", default_value = DEFAULT_LOG_FILE)]
    pub log_file: PathBuf,

    /// Print a usage summary at the end and append it to the metrics file.
    #[arg(long)]
    pub metrics: bool,

    #[arg(long, default_value = DEFAULT_METRICS_FILE)]
    pub metrics_file: PathBuf,

    /// arXiv export API query endpoint.
    #[arg(long, env = "SCHOLAR_ARXIV_URL", default_value = ARXIV_API_URL)]
    pub arxiv_url: String,

    /// Override for the Gemini API base URL.
    #[arg(long, env = "SCHOLAR_GEMINI_URL")]
    pub gemini_url: Option<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("API_KEY not found in environment. Please set it in a .env file.")]
    MissingApiKey,
}

#[derive(Debug)]
pub struct Config {
    pub api_key: SecretString,
    pub model: String,
    pub log_file: PathBuf,
    /// Where to append metrics, when enabled.
    pub metrics_file: Option<PathBuf>,
    pub arxiv_url: String,
    pub gemini_url: Option<String>,
}

impl Cli {
    pub fn into_config(self) -> Result<Config, ConfigError> {
        let fallback = std::env::var("GOOGLE_API_KEY").ok();
        self.resolve(fallback)
    }

    fn resolve(self, fallback_key: Option<String>) -> Result<Config, ConfigError> {
        let api_key = self
            .api_key
            .or(fallback_key)
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .ok_or(ConfigError::MissingApiKey)?;

        Ok(Config {
            api_key: SecretString::new(api_key),
            model: self.model,
            log_file: self.log_file,
            metrics_file: self.metrics.then_some(self.metrics_file),
            arxiv_url: self.arxiv_url,
            gemini_url: self.gemini_url,
        })
    }
}
