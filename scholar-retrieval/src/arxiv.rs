use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use scholar_core::Paper;
use tracing::debug;

use crate::{atom, PaperSource, RetrievalError};

pub const ARXIV_API_URL: &str = "http://export.arxiv.org/api/query";

/// Client for the arXiv export API.
#[derive(Clone, Debug)]
pub struct ArxivClient {
    base_url: String,
    http: Client,
}

impl ArxivClient {
    pub fn new() -> Result<Self, RetrievalError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("scholar/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| RetrievalError::InvalidConfig(err.to_string()))?;
        Ok(Self {
            base_url: ARXIV_API_URL.to_string(),
            http,
        })
    }

    /// Full URL of the query endpoint, e.g. `http://export.arxiv.org/api/query`.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl PaperSource for ArxivClient {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<Paper>, RetrievalError> {
        debug!(query, max_results, "querying arXiv");
        let limit = max_results.to_string();
        let response = self
            .http
            .get(&self.base_url)
            .query(&[
                ("search_query", query),
                ("start", "0"),
                ("max_results", limit.as_str()),
                ("sortBy", "relevance"),
                ("sortOrder", "descending"),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(RetrievalError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let mut papers = atom::parse_feed(&body)?;
        papers.truncate(max_results);
        debug!(count = papers.len(), "arXiv returned papers");
        Ok(papers)
    }
}
