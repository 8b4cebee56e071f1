use std::sync::Arc;

use async_trait::async_trait;
use scholar_core::Paper;

use crate::RetrievalError;

/// A searchable index of papers.
///
/// Implementations return at most `max_results` papers, ordered by
/// relevance (most relevant first).
#[async_trait]
pub trait PaperSource: Send + Sync {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<Paper>, RetrievalError>;
}

#[async_trait]
impl<T> PaperSource for Arc<T>
where
    T: PaperSource + ?Sized,
{
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<Paper>, RetrievalError> {
        (**self).search(query, max_results).await
    }
}
