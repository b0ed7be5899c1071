//! Wikipedia knowledge provider
//!
//! Talks to the public MediaWiki action API. No API key is needed, but
//! Wikimedia asks clients to send a descriptive `User-Agent`.

use std::time::Duration;

use crate::tools::knowledge::KnowledgeProvider;
use crate::types::{AppError, Result};
use crate::utils::toml_config::KnowledgeConfig;
use async_trait::async_trait;
use serde_json::Value;

pub struct WikipediaClient {
    http: reqwest::Client,
    api_url: String,
    summary_sentences: u32,
}

impl WikipediaClient {
    pub fn new(api_url: impl Into<String>, user_agent: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            api_url: api_url.into(),
            summary_sentences: 5,
        })
    }

    pub fn from_config(config: &KnowledgeConfig) -> Result<Self> {
        Ok(Self::new(
            config.api_url.clone(),
            &config.user_agent,
            Duration::from_secs(config.timeout_secs),
        )?
        .with_summary_sentences(config.summary_sentences))
    }

    pub fn with_summary_sentences(mut self, sentences: u32) -> Self {
        self.summary_sentences = sentences;
        self
    }

    async fn get_json(&self, params: &[(&str, String)]) -> Result<Value> {
        let response = self
            .http
            .get(&self.api_url)
            .query(params)
            .send()
            .await
            .map_err(|e| AppError::capability("knowledge", format!("Wikipedia request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::capability(
                "knowledge",
                format!("Wikipedia request failed ({}): {}", status, text),
            ));
        }

        response.json().await.map_err(|e| {
            AppError::capability("knowledge", format!("Failed to parse Wikipedia response: {}", e))
        })
    }
}

#[async_trait]
impl KnowledgeProvider for WikipediaClient {
    fn name(&self) -> &str {
        "wikipedia"
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<String>> {
        let params = [
            ("action", "opensearch".to_string()),
            ("search", query.to_string()),
            ("limit", limit.to_string()),
            ("namespace", "0".to_string()),
            ("format", "json".to_string()),
        ];
        let data = self.get_json(&params).await?;

        // OpenSearch answers [query, [titles], [descriptions], [urls]]
        let titles = match data.get(1) {
            Some(Value::Array(titles)) => titles
                .iter()
                .filter_map(|t| t.as_str().map(str::to_string))
                .collect(),
            Some(_) => {
                return Err(AppError::capability(
                    "knowledge",
                    "Unexpected opensearch response shape",
                ))
            }
            None => Vec::new(),
        };

        Ok(titles)
    }

    async fn fetch_summary(&self, title: &str) -> Result<String> {
        let params = [
            ("action", "query".to_string()),
            ("titles", title.to_string()),
            ("prop", "extracts".to_string()),
            ("exintro", "1".to_string()),
            ("explaintext", "1".to_string()),
            ("exsentences", self.summary_sentences.to_string()),
            ("redirects", "1".to_string()),
            ("format", "json".to_string()),
        ];
        let data = self.get_json(&params).await?;

        let pages = data["query"]["pages"]
            .as_object()
            .ok_or_else(|| AppError::NotFound(format!("Wikipedia article '{}'", title)))?;

        // Page id "-1" marks a missing article
        pages
            .iter()
            .find(|(page_id, _)| page_id.as_str() != "-1")
            .map(|(_, page)| page["extract"].as_str().unwrap_or_default().trim().to_string())
            .ok_or_else(|| AppError::NotFound(format!("Wikipedia article '{}'", title)))
    }

    fn article_url(&self, title: &str) -> Option<String> {
        let base = self.api_url.strip_suffix("/w/api.php")?;
        Some(format!("{}/wiki/{}", base, title.replace(' ', "_")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(api_url: &str) -> WikipediaClient {
        WikipediaClient::new(api_url, "lore-test/0.1", Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_article_url() {
        let wiki = client("https://en.wikipedia.org/w/api.php");
        assert_eq!(
            wiki.article_url("Light-dependent reactions").as_deref(),
            Some("https://en.wikipedia.org/wiki/Light-dependent_reactions")
        );
    }

    #[test]
    fn test_article_url_unknown_layout() {
        let wiki = client("http://127.0.0.1:9999/api");
        assert!(wiki.article_url("Photosynthesis").is_none());
    }

    #[test]
    fn test_summary_sentences_override() {
        let wiki = client("https://en.wikipedia.org/w/api.php").with_summary_sentences(3);
        assert_eq!(wiki.summary_sentences, 3);
    }
}
