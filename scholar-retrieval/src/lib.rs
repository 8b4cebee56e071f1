//! Paper retrieval: the [`PaperSource`] seam, the arXiv client behind it,
//! and keyword search reports.

mod arxiv;
mod atom;
mod error;
mod query;
mod report;
mod source;

pub use arxiv::{ArxivClient, ARXIV_API_URL};
pub use atom::parse_feed;
pub use error::{RetrievalError, RetrievalResult};
pub use query::build_query;
pub use report::{search_keywords, SearchReport, MAX_RESULTS, NO_KEYWORDS_ERROR};
pub use source::PaperSource;
