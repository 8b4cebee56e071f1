//! Line-oriented interaction with the person at the terminal.

use std::sync::mpsc;
use std::thread;

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use thiserror::Error;
use tokio::sync::oneshot;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Input {
    Line(String),
    /// Ctrl-C or end of input.
    Interrupted,
}

#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error("terminal error: {0}")]
    Readline(String),
    #[error("console is closed")]
    Closed,
}

impl From<ReadlineError> for ConsoleError {
    fn from(err: ReadlineError) -> Self {
        ConsoleError::Readline(err.to_string())
    }
}

#[async_trait::async_trait]
pub trait Console: Send + Sync {
    async fn read_line(&self, prompt: &str) -> Result<Input, ConsoleError>;

    fn print(&self, text: &str);
}

type LineRequest = (String, oneshot::Sender<Result<Input, ConsoleError>>);

/// A rustyline-backed console. The editor lives on its own thread so a
/// pending prompt never blocks the runtime.
pub struct TerminalConsole {
    requests: mpsc::Sender<LineRequest>,
}

impl TerminalConsole {
    pub fn new() -> Result<Self, ConsoleError> {
        let (requests, inbox) = mpsc::channel::<LineRequest>();
        let (ready_tx, ready_rx) = mpsc::channel();

        thread::Builder::new()
            .name("scholar-console".to_string())
            .spawn(move || {
                let mut editor = match DefaultEditor::new() {
                    Ok(editor) => {
                        let _ = ready_tx.send(Ok(()));
                        editor
                    }
                    Err(err) => {
                        let _ = ready_tx.send(Err(ConsoleError::from(err)));
                        return;
                    }
                };

                while let Ok((prompt, reply)) = inbox.recv() {
                    let result = match editor.readline(&prompt) {
                        Ok(line) => {
                            if !line.trim().is_empty() {
                                let _ = editor.add_history_entry(line.as_str());
                            }
                            Ok(Input::Line(line))
                        }
                        Err(ReadlineError::Interrupted | ReadlineError::Eof) => {
                            Ok(Input::Interrupted)
                        }
                        Err(err) => Err(ConsoleError::from(err)),
                    };
                    let _ = reply.send(result);
                }
            })
            .map_err(|err| ConsoleError::Readline(err.to_string()))?;

        ready_rx.recv().map_err(|_| ConsoleError::Closed)??;
        Ok(Self { requests })
    }
}

#[async_trait::async_trait]
impl Console for TerminalConsole {
    async fn read_line(&self, prompt: &str) -> Result<Input, ConsoleError> {
        let (reply, answer) = oneshot::channel();
        self.requests
            .send((prompt.to_string(), reply))
            .map_err(|_| ConsoleError::Closed)?;
        answer.await.map_err(|_| ConsoleError::Closed)?
    }

    fn print(&self, text: &str) {
        println!("{text}");
    }
}
