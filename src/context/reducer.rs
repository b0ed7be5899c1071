use crate::context::chunker::TextChunker;
use crate::research::reasoning::Reasoning;
use crate::types::{Note, NoteKind, Outcome};
use crate::utils::toml_config::ContextConfig;

const STAGE: &str = "context";

/// Collapses oversized context text into a bounded summary.
///
/// Text at or under the threshold is returned unchanged. Longer text is split
/// by [`TextChunker`], each chunk is summarized in order, and the summaries are
/// merged. Reduction is single pass: a merged result that is still over the
/// threshold is passed on as is, with a note.
pub struct ContextReducer {
    threshold: usize,
    chunker: TextChunker,
}

impl ContextReducer {
    pub fn new(threshold: usize, chunk_size: usize, lookback: usize) -> Self {
        Self {
            threshold,
            chunker: TextChunker::new(chunk_size, lookback),
        }
    }

    pub fn from_config(config: &ContextConfig) -> Self {
        Self::new(config.threshold, config.chunk_size, config.lookback)
    }

    pub fn needs_reduction(&self, text: &str) -> bool {
        text.chars().count() > self.threshold
    }

    pub async fn reduce(&self, text: &str, reasoner: &dyn Reasoning) -> Outcome<String> {
        let length = text.chars().count();
        if !self.needs_reduction(text) {
            tracing::debug!(chars = length, "Context within threshold, using directly");
            return Outcome::clean(text.to_string());
        }

        let chunks = self.chunker.chunk(text);
        tracing::info!(
            chars = length,
            chunks = chunks.len(),
            "Context exceeds threshold, summarizing chunks"
        );

        let total = chunks.len();
        let mut notes = Vec::new();
        let mut sections = Vec::with_capacity(total);

        for chunk in &chunks {
            let position = chunk.index + 1;
            tracing::debug!(chunk = position, total, "Summarizing chunk");

            let summary = match reasoner.summarize(&chunk.text).await {
                Ok(summary) if !summary.trim().is_empty() => summary.trim().to_string(),
                Ok(_) => {
                    tracing::warn!(chunk = position, "Empty chunk summary, keeping original text");
                    notes.push(Note::new(
                        NoteKind::ContextFallback,
                        STAGE,
                        format!("chunk {}/{} summary was empty; original text kept", position, total),
                    ));
                    chunk.text.clone()
                }
                Err(e) => {
                    tracing::warn!(chunk = position, error = %e, "Chunk summary failed, keeping original text");
                    notes.push(Note::new(
                        NoteKind::ContextFallback,
                        STAGE,
                        format!("chunk {}/{} could not be summarized ({}); original text kept", position, total, e),
                    ));
                    chunk.text.clone()
                }
            };

            sections.push(format!("**Section {} Summary:**\n{}", position, summary));
        }

        let merged = sections.join("\n\n---\n\n");
        let merged_len = merged.chars().count();
        tracing::info!(chars = merged_len, "Merged chunk summaries");

        if merged_len > self.threshold {
            tracing::warn!(
                chars = merged_len,
                threshold = self.threshold,
                "Merged summary still above threshold, passing through"
            );
            notes.push(Note::new(
                NoteKind::ContextFallback,
                STAGE,
                format!(
                    "merged summary is {} chars, above the {} char threshold; passed through unreduced",
                    merged_len, self.threshold
                ),
            ));
        }

        Outcome::with_notes(merged, notes)
    }
}
