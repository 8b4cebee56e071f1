//! Process-wide `tracing` subscriber writing plain lines to the log file.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::config::DEFAULT_LOG_FILTER;

/// Where log lines end up.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LogSink {
    File(PathBuf),
    /// The log file could not be opened.
    Stderr { reason: String },
}

fn filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

fn open_log_file(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

/// Installs the global subscriber. Runs before anything else can fail, so
/// configuration errors are logged too. Falls back to stderr when `path`
/// cannot be opened for appending.
pub fn init(path: &Path) -> LogSink {
    match open_log_file(path) {
        Ok(file) => {
            // An already installed subscriber stays in place.
            let _ = tracing_subscriber::fmt()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_env_filter(filter())
                .try_init();
            LogSink::File(path.to_path_buf())
        }
        Err(err) => {
            let _ = tracing_subscriber::fmt()
                .with_writer(io::stderr)
                .with_ansi(false)
                .with_env_filter(filter())
                .try_init();
            LogSink::Stderr {
                reason: format!("{}: {err}", path.display()),
            }
        }
    }
}
