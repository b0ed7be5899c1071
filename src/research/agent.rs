use std::sync::Arc;

use crate::llm::ImageInput;
use crate::research::citations::normalize_citations;
use crate::research::reasoning::{Reasoning, SynthesisRequest};
use crate::research::trace::SourceTrace;
use crate::tools::KnowledgeProvider;
use crate::types::{Failure, Note, NoteKind, Outcome, ReportDraft, Result, Source};
use crate::utils::toml_config::ResearchConfig;

const STAGE: &str = "research";

/// What the agent hands to the artifact builder.
#[derive(Debug, Clone)]
pub struct ResearchOutput {
    pub draft: ReportDraft,
    /// Every source retrieved, in retrieval order; `[n]` markers index this list
    pub sources: Vec<Source>,
    pub trace: SourceTrace,
}

/// Runs the fixed research sequence: topic, search, summaries, synthesis.
///
/// Hard errors from topic extraction, search or synthesis are returned as a
/// [`Failure`] that still carries the notes gathered so far. A failed summary
/// fetch only skips that title and adds a note.
pub struct ResearchAgent {
    reasoner: Arc<dyn Reasoning>,
    knowledge: Arc<dyn KnowledgeProvider>,
    search_limit: usize,
    top_k: usize,
    trace_summary_chars: usize,
}

impl ResearchAgent {
    pub fn new(
        reasoner: Arc<dyn Reasoning>,
        knowledge: Arc<dyn KnowledgeProvider>,
        config: &ResearchConfig,
    ) -> Self {
        Self {
            reasoner,
            knowledge,
            search_limit: config.search_limit,
            top_k: config.top_k,
            trace_summary_chars: config.trace_summary_chars,
        }
    }

    pub async fn run(
        &self,
        prompt: &str,
        image: Option<&ImageInput>,
        context: Option<&str>,
    ) -> std::result::Result<Outcome<ResearchOutput>, Failure> {
        let query = self.extract_query(prompt, image).await?;

        let mut trace = SourceTrace::new(query.clone(), self.search_limit);
        let titles = self.knowledge.search(&query, self.search_limit).await?;
        trace.record_search(self.knowledge.name(), &titles);
        tracing::info!(query = %query, results = titles.len(), "Knowledge search complete");

        let (sources, notes) = self.fetch_sources(&query, &titles, &mut trace).await;

        tracing::info!(sources = sources.len(), "Synthesizing report");
        let synthesized = self
            .reasoner
            .synthesize(SynthesisRequest {
                prompt,
                image,
                context,
                sources: &sources,
            })
            .await;
        let draft = match synthesized {
            Ok(draft) => draft,
            Err(e) => return Err(Failure::new(e, notes)),
        };
        let draft = normalize_citations(draft, &sources);
        tracing::info!(
            sections = draft.sections.len(),
            cited = draft.citations.len(),
            "Report synthesized"
        );

        Ok(Outcome::with_notes(
            ResearchOutput {
                draft,
                sources,
                trace,
            },
            notes,
        ))
    }

    async fn extract_query(&self, prompt: &str, image: Option<&ImageInput>) -> Result<String> {
        let topic = self.reasoner.extract_topic(prompt, image).await?;
        let topic = topic.trim();
        if topic.is_empty() {
            tracing::info!("Topic extraction returned nothing, searching with the prompt");
            return Ok(prompt.trim().to_string());
        }
        tracing::info!(query = %topic, "Extracted search query");
        Ok(topic.to_string())
    }

    /// Summaries for the first `top_k` distinct titles, in provider order.
    async fn fetch_sources(
        &self,
        query: &str,
        titles: &[String],
        trace: &mut SourceTrace,
    ) -> (Vec<Source>, Vec<Note>) {
        let mut seen: Vec<&str> = Vec::new();
        for title in titles.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
            if seen.len() == self.top_k {
                break;
            }
            if !seen.contains(&title) {
                seen.push(title);
            }
        }

        let mut sources = Vec::with_capacity(seen.len());
        let mut notes = Vec::new();

        for title in seen {
            let failure = match self.knowledge.fetch_summary(title).await {
                Ok(summary) if !summary.trim().is_empty() => {
                    trace.record_summary(
                        self.knowledge.name(),
                        title,
                        &summary,
                        self.trace_summary_chars,
                    );
                    sources.push(Source {
                        title: title.to_string(),
                        url: self.knowledge.article_url(title),
                        summary,
                        query: query.to_string(),
                    });
                    continue;
                }
                Ok(_) => "empty summary".to_string(),
                Err(e) => e.to_string(),
            };

            tracing::warn!(title = %title, reason = %failure, "Skipping source");
            notes.push(Note::new(
                NoteKind::PartialRetrieval,
                STAGE,
                format!("summary for '{}' unavailable: {}", title, failure),
            ));
            trace.record_failure(title, failure);
        }

        (sources, notes)
    }
}
