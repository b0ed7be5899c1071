//! Mock capabilities for integration tests.
//!
//! Hand-written stand-ins for the LLM transport, the reasoning capability and
//! the knowledge provider, shared by every test binary.

use async_trait::async_trait;
use lore::llm::{LLMClient, LlmRequest};
use lore::research::{Reasoning, SynthesisRequest};
use lore::tools::KnowledgeProvider;
use lore::types::{AppError, ReportDraft, Result, Section};
use lore::llm::ImageInput;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;

// ============= LLM transport =============

/// What a [`MockLLMClient`] was asked.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub system: Option<String>,
    pub prompt: String,
    pub has_image: bool,
    pub max_tokens: Option<u32>,
}

/// Mock LLM client answering by the kind of prompt it receives.
///
/// Synthesis prompts start with `## Research Request`, summary prompts with
/// `Please summarize`; anything else is treated as topic extraction.
pub struct MockLLMClient {
    topic: String,
    summary: String,
    synthesis: String,
    should_fail: bool,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockLLMClient {
    pub fn new(topic: &str, synthesis: &str) -> Self {
        Self {
            topic: topic.to_string(),
            summary: "A short summary.".to_string(),
            synthesis: synthesis.to_string(),
            should_fail: false,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Create a mock client that always returns an error.
    pub fn failing() -> Self {
        Self {
            should_fail: true,
            ..Self::new("", "")
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl LLMClient for MockLLMClient {
    async fn complete(&self, request: &LlmRequest<'_>) -> Result<String> {
        self.requests.lock().push(RecordedRequest {
            system: request.system.map(str::to_string),
            prompt: request.prompt.to_string(),
            has_image: request.image.is_some(),
            max_tokens: request.max_tokens,
        });

        if self.should_fail {
            return Err(AppError::capability("llm", "Mock LLM failure"));
        }

        let answer = if request.prompt.starts_with("## Research Request") {
            &self.synthesis
        } else if request.prompt.starts_with("Please summarize") {
            &self.summary
        } else {
            &self.topic
        };
        Ok(answer.clone())
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }
}

// ============= Reasoning =============

/// Reasoning stub that cites every source it is given.
pub struct StubReasoner {
    topic: String,
    fail_summaries: bool,
    fail_synthesis: bool,
    seen_context: Mutex<Option<String>>,
}

impl StubReasoner {
    pub fn new(topic: &str) -> Self {
        Self {
            topic: topic.to_string(),
            fail_summaries: false,
            fail_synthesis: false,
            seen_context: Mutex::new(None),
        }
    }

    pub fn with_failing_summaries(mut self) -> Self {
        self.fail_summaries = true;
        self
    }

    pub fn with_failing_synthesis(mut self) -> Self {
        self.fail_synthesis = true;
        self
    }

    /// The context text synthesis last received.
    pub fn seen_context(&self) -> Option<String> {
        self.seen_context.lock().clone()
    }
}

#[async_trait]
impl Reasoning for StubReasoner {
    async fn extract_topic(&self, _prompt: &str, _image: Option<&ImageInput>) -> Result<String> {
        Ok(self.topic.clone())
    }

    async fn summarize(&self, text: &str) -> Result<String> {
        if self.fail_summaries {
            return Err(AppError::capability("summarization", "model overloaded"));
        }
        Ok(format!("summary of {} chars", text.chars().count()))
    }

    async fn synthesize(&self, request: SynthesisRequest<'_>) -> Result<ReportDraft> {
        *self.seen_context.lock() = request.context.map(str::to_string);
        if self.fail_synthesis {
            return Err(AppError::capability("synthesis", "model unavailable"));
        }

        let body = if request.sources.is_empty() {
            format!("Nothing was found about {}.", request.prompt)
        } else {
            request
                .sources
                .iter()
                .enumerate()
                .map(|(i, s)| format!("{} matters [{}].", s.title, i + 1))
                .collect::<Vec<_>>()
                .join(" ")
        };

        Ok(ReportDraft {
            title: format!("Report on {}", self.topic),
            sections: vec![Section {
                heading: "Findings".to_string(),
                body,
            }],
            citations: vec![],
        })
    }
}

// ============= Knowledge =============

/// In-memory encyclopedia.
#[derive(Default)]
pub struct StubKnowledge {
    titles: Vec<String>,
    articles: HashMap<String, String>,
    search_error: Option<String>,
    delay: Option<Duration>,
    searches: Mutex<Vec<String>>,
}

impl StubKnowledge {
    pub fn new() -> Self {
        Self::default()
    }

    /// A search result with an article behind it.
    pub fn with_article(mut self, title: &str, summary: &str) -> Self {
        self.titles.push(title.to_string());
        self.articles.insert(title.to_string(), summary.to_string());
        self
    }

    /// A search result whose article cannot be fetched.
    pub fn with_missing_article(mut self, title: &str) -> Self {
        self.titles.push(title.to_string());
        self
    }

    pub fn with_search_error(mut self, message: &str) -> Self {
        self.search_error = Some(message.to_string());
        self
    }

    /// Delay every search, for timeout tests.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn searches(&self) -> Vec<String> {
        self.searches.lock().clone()
    }
}

#[async_trait]
impl KnowledgeProvider for StubKnowledge {
    fn name(&self) -> &str {
        "stub"
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<String>> {
        self.searches.lock().push(query.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(message) = &self.search_error {
            return Err(AppError::capability("search", message.clone()));
        }
        Ok(self.titles.iter().take(limit).cloned().collect())
    }

    async fn fetch_summary(&self, title: &str) -> Result<String> {
        self.articles
            .get(title)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("article '{}'", title)))
    }

    fn article_url(&self, title: &str) -> Option<String> {
        Some(format!("https://kb.test/wiki/{}", title.replace(' ', "_")))
    }
}
