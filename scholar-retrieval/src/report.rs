use serde::{Deserialize, Serialize};
use scholar_core::Paper;
use tracing::{info, warn};

use crate::{build_query, PaperSource};

/// Upper bound on papers fetched per search.
pub const MAX_RESULTS: usize = 10;

pub const NO_KEYWORDS_ERROR: &str = "No keywords provided or found in session state.";

/// Outcome of one keyword search, shaped for the model and the console.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct SearchReport {
    pub query: String,
    pub total: usize,
    pub papers: Vec<Paper>,
    pub summaries: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SearchReport {
    pub fn failed(query: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            error: Some(error.into()),
            ..Self::default()
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Searches `source` for papers matching any of `keywords`.
///
/// Never fails: an empty keyword list or a backend failure come back as a
/// zero-result report carrying an `error`.
pub async fn search_keywords<S>(source: &S, keywords: &[String], max_results: usize) -> SearchReport
where
    S: PaperSource + ?Sized,
{
    let query = build_query(keywords);
    if query.is_empty() {
        return SearchReport::failed("", NO_KEYWORDS_ERROR);
    }

    match source.search(&query, max_results).await {
        Ok(papers) => {
            info!(query = %query, total = papers.len(), "papers retrieved");
            SearchReport {
                summaries: papers.iter().map(Paper::summary_line).collect(),
                total: papers.len(),
                papers,
                query,
                error: None,
            }
        }
        Err(err) => {
            warn!(query = %query, error = %err, "paper search failed");
            SearchReport::failed(query, format!("arXiv request failed: {err}"))
        }
    }
}
