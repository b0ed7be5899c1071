use crate::types::Result;
use async_trait::async_trait;

/// External knowledge lookups used by the research agent.
///
/// `search` returning an empty list is a valid answer. `fetch_summary` fails
/// with [`AppError::NotFound`](crate::types::AppError::NotFound) when the title
/// does not exist and with a capability error when the provider is unreachable.
#[async_trait]
pub trait KnowledgeProvider: Send + Sync {
    /// Provider name, recorded in the source trace
    fn name(&self) -> &str;

    /// Ordered candidate titles, most relevant first
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<String>>;

    /// Plain-text summary of the article with this exact title
    async fn fetch_summary(&self, title: &str) -> Result<String>;

    /// Canonical URL for a title, when the provider has one
    fn article_url(&self, _title: &str) -> Option<String> {
        None
    }
}
