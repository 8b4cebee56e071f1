//! A three-stage research assistant: agree on search keywords with the
//! user, retrieve matching papers from arXiv, then summarize the field and
//! propose future directions.

pub mod agents;
pub mod config;
pub mod confirmation;
pub mod console;
pub mod logging;
pub mod metrics;
pub mod orchestrator;
pub mod render;

pub use agents::Agents;
pub use config::{Cli, Config, ConfigError};
pub use console::{Console, ConsoleError, Input, TerminalConsole};
pub use metrics::{MetricsCollector, MetricsRecord};
pub use orchestrator::{Orchestrator, OrchestratorError, Outcome, Phase, SessionReport};
