use thiserror::Error;

#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("{0}")]
    Transport(#[from] reqwest::Error),
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed Atom feed: {0}")]
    Feed(#[from] quick_xml::DeError),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type RetrievalResult<T> = Result<T, RetrievalError>;
