//! Reasoning capability
//!
//! [`Reasoning`] is the narrow surface the pipeline needs from a language
//! model. [`LlmReasoner`] implements it on top of any [`LLMClient`].

use crate::llm::{ImageInput, LLMClient, LlmRequest};
use crate::types::{AppError, ReportDraft, Result, Section, Source};
use crate::utils::toml_config::LlmConfig;
use async_trait::async_trait;
use serde::Deserialize;

/// Everything synthesis sees. Sources are numbered from 1 in slice order.
#[derive(Debug, Clone, Copy)]
pub struct SynthesisRequest<'a> {
    pub prompt: &'a str,
    pub image: Option<&'a ImageInput>,
    pub context: Option<&'a str>,
    pub sources: &'a [Source],
}

#[async_trait]
pub trait Reasoning: Send + Sync {
    /// Short search query for the prompt; may be empty
    async fn extract_topic(&self, prompt: &str, image: Option<&ImageInput>) -> Result<String>;

    /// Condensed version of `text`
    async fn summarize(&self, text: &str) -> Result<String>;

    /// Structured report. `citations` may be left empty; the agent derives it.
    async fn synthesize(&self, request: SynthesisRequest<'_>) -> Result<ReportDraft>;
}

/// Per-call output token budgets.
#[derive(Debug, Clone, Copy)]
pub struct TokenBudgets {
    pub topic: u32,
    pub summary: u32,
    pub synthesis: u32,
}

impl Default for TokenBudgets {
    fn default() -> Self {
        Self {
            topic: 50,
            summary: 1000,
            synthesis: 4000,
        }
    }
}

const TOPIC_SYSTEM: &str = "Extract the main topic or subject for an encyclopedia search from the \
user's question. If an image is attached, use it to identify the subject. Respond with just the \
search query, nothing else.";

const SUMMARY_SYSTEM: &str = "You are a helpful assistant that creates concise summaries. Extract \
the key points and main ideas from the provided text.";

const SYNTHESIS_SYSTEM: &str = r#"You are a research assistant that writes comprehensive, well-structured reports.

Answer with a single JSON object and nothing else:
{"title": "<report title>", "sections": [{"heading": "<heading>", "body": "<markdown body>"}]}

Rules:
- Start with an introduction section and end with a conclusion section.
- Section bodies may use markdown paragraphs, bullet lists starting with - and sub-headings starting with ###.
- Cite sources inline with their number in square brackets, e.g. [1].
- Only cite the numbered sources you were given. If no sources are listed, do not cite anything.
- Do not add a references section; it is generated separately."#;

/// [`Reasoning`] backed by a language model.
pub struct LlmReasoner {
    llm: Box<dyn LLMClient>,
    budgets: TokenBudgets,
}

impl LlmReasoner {
    pub fn new(llm: Box<dyn LLMClient>, budgets: TokenBudgets) -> Self {
        Self { llm, budgets }
    }

    pub fn from_config(llm: Box<dyn LLMClient>, config: &LlmConfig) -> Self {
        Self::new(
            llm,
            TokenBudgets {
                topic: config.topic_max_tokens,
                summary: config.summary_max_tokens,
                synthesis: config.synthesis_max_tokens,
            },
        )
    }
}

#[async_trait]
impl Reasoning for LlmReasoner {
    async fn extract_topic(&self, prompt: &str, image: Option<&ImageInput>) -> Result<String> {
        let request = LlmRequest::new(prompt)
            .system(TOPIC_SYSTEM)
            .image(image)
            .max_tokens(self.budgets.topic);
        let answer = self.llm.complete(&request).await.map_err(|e| retag(e, "topic extraction"))?;
        Ok(clean_topic(&answer))
    }

    async fn summarize(&self, text: &str) -> Result<String> {
        let prompt = format!(
            "Please summarize the following text, preserving the most important information:\n\n{}",
            text
        );
        let request = LlmRequest::new(&prompt)
            .system(SUMMARY_SYSTEM)
            .max_tokens(self.budgets.summary);
        self.llm.complete(&request).await.map_err(|e| retag(e, "summarization"))
    }

    async fn synthesize(&self, request: SynthesisRequest<'_>) -> Result<ReportDraft> {
        let prompt = synthesis_prompt(&request);
        let llm_request = LlmRequest::new(&prompt)
            .system(SYNTHESIS_SYSTEM)
            .image(request.image)
            .max_tokens(self.budgets.synthesis);
        let answer = self
            .llm
            .complete(&llm_request)
            .await
            .map_err(|e| retag(e, "synthesis"))?;

        parse_draft(&answer).ok_or_else(|| {
            AppError::capability("synthesis", "model answer contained no title or sections")
        })
    }
}

/// Name the reasoning step in transport errors.
fn retag(err: AppError, step: &str) -> AppError {
    match err {
        AppError::Capability { message, .. } => AppError::capability(step, message),
        other => other,
    }
}

fn clean_topic(answer: &str) -> String {
    answer
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or_default()
        .trim_matches(|c: char| c == '"' || c == '\'' || c == '`')
        .trim()
        .to_string()
}

fn synthesis_prompt(request: &SynthesisRequest<'_>) -> String {
    let mut parts = vec![format!("## Research Request\n{}", request.prompt)];

    if let Some(context) = request.context.filter(|c| !c.trim().is_empty()) {
        parts.push(format!("## Provided Context\n{}", context));
    }

    if request.sources.is_empty() {
        parts.push("## Sources\nNo external sources were found.".to_string());
    } else {
        let listed: Vec<String> = request
            .sources
            .iter()
            .enumerate()
            .map(|(i, s)| format!("[{}] {}\n{}", i + 1, s.title, s.summary))
            .collect();
        parts.push(format!("## Sources\n{}", listed.join("\n\n")));
    }

    parts.push(
        "## Instructions\nWrite a comprehensive research report answering the request, \
         using the context and sources above."
            .to_string(),
    );
    parts.join("\n\n")
}

#[derive(Debug, Deserialize)]
struct RawDraft {
    #[serde(default)]
    title: String,
    #[serde(default)]
    sections: Vec<Section>,
}

/// Parse a model answer as JSON, falling back to markdown headings.
pub(crate) fn parse_draft(answer: &str) -> Option<ReportDraft> {
    let body = strip_code_fence(answer.trim());

    let (title, sections) = match parse_json(body) {
        Some(raw) => (raw.title, raw.sections),
        None => parse_markdown(body),
    };

    let title = title.trim().to_string();
    let sections: Vec<Section> = sections
        .into_iter()
        .map(|s| Section {
            heading: s.heading.trim().to_string(),
            body: s.body.trim().to_string(),
        })
        .filter(|s| !(s.heading.is_empty() && s.body.is_empty()))
        .filter(|s| !is_reference_heading(&s.heading))
        .collect();

    if title.is_empty() && sections.is_empty() {
        return None;
    }

    Some(ReportDraft {
        title: if title.is_empty() {
            "Research Report".to_string()
        } else {
            title
        },
        sections,
        citations: Vec::new(),
    })
}

fn strip_code_fence(text: &str) -> &str {
    let Some(inner) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the info string ("json", "markdown", ...) on the opening line
    let inner = inner.split_once('\n').map(|(_, rest)| rest).unwrap_or("");
    inner.trim_end().strip_suffix("```").unwrap_or(inner).trim()
}

fn parse_json(text: &str) -> Option<RawDraft> {
    let raw = match serde_json::from_str::<RawDraft>(text) {
        Ok(raw) => raw,
        Err(_) => {
            let start = text.find('{')?;
            let end = text.rfind('}')?;
            if end <= start {
                return None;
            }
            serde_json::from_str(&text[start..=end]).ok()?
        }
    };
    // Any other JSON object is not a draft
    (!raw.title.trim().is_empty() || !raw.sections.is_empty()).then_some(raw)
}

fn parse_markdown(text: &str) -> (String, Vec<Section>) {
    let mut title = String::new();
    let mut sections: Vec<Section> = Vec::new();
    let mut preamble = String::new();

    for line in text.lines() {
        if let Some(heading) = line.strip_prefix("# ") {
            if title.is_empty() {
                title = heading.trim().to_string();
                continue;
            }
        }
        if let Some(heading) = line.strip_prefix("## ") {
            sections.push(Section {
                heading: heading.trim().to_string(),
                body: String::new(),
            });
            continue;
        }
        let target = match sections.last_mut() {
            Some(section) => &mut section.body,
            None => &mut preamble,
        };
        target.push_str(line);
        target.push('\n');
    }

    if !preamble.trim().is_empty() {
        sections.insert(
            0,
            Section {
                heading: "Introduction".to_string(),
                body: preamble,
            },
        );
    }

    (title, sections)
}

fn is_reference_heading(heading: &str) -> bool {
    matches!(
        heading.to_ascii_lowercase().as_str(),
        "references" | "sources" | "bibliography"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_topic() {
        assert_eq!(clean_topic("  \"Photosynthesis\"\n"), "Photosynthesis");
        assert_eq!(clean_topic("\n\nQuantum computing\nextra"), "Quantum computing");
        assert_eq!(clean_topic("   "), "");
    }

    #[test]
    fn test_parse_json_draft() {
        let answer = r#"{"title": "Photosynthesis", "sections": [{"heading": "Overview", "body": "Plants make sugar [1]."}]}"#;
        let draft = parse_draft(answer).unwrap();
        assert_eq!(draft.title, "Photosynthesis");
        assert_eq!(draft.sections.len(), 1);
        assert_eq!(draft.sections[0].body, "Plants make sugar [1].");
        assert!(draft.citations.is_empty());
    }

    #[test]
    fn test_parse_fenced_json() {
        let answer = "```json\n{\"title\": \"T\", \"sections\": []}\n```";
        assert_eq!(parse_draft(answer).unwrap().title, "T");
    }

    #[test]
    fn test_parse_json_with_chatter() {
        let answer = "Here is your report:\n{\"title\": \"T\", \"sections\": [{\"heading\": \"A\", \"body\": \"b\"}]}\nEnjoy!";
        let draft = parse_draft(answer).unwrap();
        assert_eq!(draft.sections[0].heading, "A");
    }

    #[test]
    fn test_markdown_fallback_drops_references() {
        let answer = "# Light\nIntro text.\n## How it works\nPhotons [1].\n## References\n[1] Light";
        let draft = parse_draft(answer).unwrap();
        assert_eq!(draft.title, "Light");
        let headings: Vec<_> = draft.sections.iter().map(|s| s.heading.as_str()).collect();
        assert_eq!(headings, vec!["Introduction", "How it works"]);
        assert_eq!(draft.sections[1].body, "Photons [1].");
    }

    #[test]
    fn test_empty_answer_is_rejected() {
        assert!(parse_draft("").is_none());
        assert!(parse_draft("```\n```").is_none());
    }

    #[test]
    fn test_synthesis_prompt_numbers_sources() {
        let sources = vec![
            Source {
                title: "Photosynthesis".into(),
                url: None,
                summary: "Plants convert light.".into(),
                query: "photosynthesis".into(),
            },
            Source {
                title: "Chlorophyll".into(),
                url: None,
                summary: "A green pigment.".into(),
                query: "photosynthesis".into(),
            },
        ];
        let prompt = synthesis_prompt(&SynthesisRequest {
            prompt: "Explain photosynthesis",
            image: None,
            context: Some("   "),
            sources: &sources,
        });
        assert!(prompt.contains("[1] Photosynthesis\nPlants convert light."));
        assert!(prompt.contains("[2] Chlorophyll"));
        assert!(!prompt.contains("Provided Context"));
    }

    #[test]
    fn test_synthesis_system_prompt_rules() {
        assert!(SYNTHESIS_SYSTEM.starts_with("You are a research assistant"));
        assert!(SYNTHESIS_SYSTEM.contains(r#"{"title": "<report title>", "sections""#));
        assert!(SYNTHESIS_SYSTEM.contains("sub-headings starting with ###."));
        assert!(SYNTHESIS_SYSTEM.ends_with("it is generated separately."));
    }
}
