use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Audit record of every knowledge-provider call made for one job.
///
/// Serialized as the `sources.json` artifact.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceTrace {
    pub query: String,
    pub limit: usize,
    pub titles_returned: Vec<String>,
    pub titles_fetched: Vec<String>,
    pub failures: Vec<RetrievalFailure>,
    pub calls: Vec<ToolCallRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalFailure {
    pub title: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRecord {
    pub tool: String,
    pub input: Value,
    pub output: Value,
}

impl SourceTrace {
    pub fn new(query: impl Into<String>, limit: usize) -> Self {
        Self {
            query: query.into(),
            limit,
            ..Default::default()
        }
    }

    pub fn record_search(&mut self, provider: &str, titles: &[String]) {
        self.titles_returned = titles.to_vec();
        self.calls.push(ToolCallRecord {
            tool: format!("{}_search", provider),
            input: json!({ "query": self.query, "limit": self.limit }),
            output: json!(titles),
        });
    }

    pub fn record_summary(&mut self, provider: &str, title: &str, summary: &str, max_chars: usize) {
        self.titles_fetched.push(title.to_string());
        self.calls.push(ToolCallRecord {
            tool: format!("{}_summary", provider),
            input: json!({ "title": title }),
            output: json!(truncate_chars(summary, max_chars)),
        });
    }

    pub fn record_failure(&mut self, title: &str, reason: impl Into<String>) {
        self.failures.push(RetrievalFailure {
            title: title.to_string(),
            reason: reason.into(),
        });
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
