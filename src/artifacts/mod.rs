//! Artifact Rendering
//!
//! A finished job delivers three files built from one research snapshot:
//!
//! | Name | Media type | Content |
//! |------|------------|---------|
//! | `report.md` | `text/markdown` | Title, sections, references |
//! | `report.pdf` | `application/pdf` | Same content, paginated |
//! | `sources.json` | `application/json` | Trace of every knowledge-provider call |
//!
//! A file that fails to render is left out and reported as a
//! [`NoteKind::Render`] note; the others are still delivered.

/// Layout-neutral block model shared by renderers.
pub mod document;
/// Markdown report rendering.
pub mod markdown;
/// Paginated PDF rendering.
pub mod pdf;

use std::sync::Arc;

use crate::research::{ResearchOutput, SourceTrace};
use crate::types::{AppError, ArtifactDescriptor, Note, NoteKind, Outcome, Result};

pub use document::{Block, Document};
pub use markdown::render_markdown;
pub use pdf::PdfRenderer;

pub const REPORT_MARKDOWN: &str = "report.md";
pub const SOURCES_JSON: &str = "sources.json";

const STAGE: &str = "artifacts";

/// Turns a [`Document`] into a paginated file format.
pub trait DocumentRenderer: Send + Sync {
    fn file_name(&self) -> &str;
    fn media_type(&self) -> &str;
    fn render(&self, document: &Document) -> Result<Vec<u8>>;
}

pub struct ArtifactBuilder {
    renderer: Arc<dyn DocumentRenderer>,
}

impl Default for ArtifactBuilder {
    fn default() -> Self {
        Self::new(Arc::new(PdfRenderer::new()))
    }
}

impl ArtifactBuilder {
    pub fn new(renderer: Arc<dyn DocumentRenderer>) -> Self {
        Self { renderer }
    }

    /// Build every artifact from the same output snapshot.
    pub fn build(&self, output: &ResearchOutput) -> Outcome<Vec<ArtifactDescriptor>> {
        let mut artifacts = Vec::with_capacity(3);
        let mut notes = Vec::new();

        let markdown = render_markdown(&output.draft, &output.sources);
        artifacts.push(ArtifactDescriptor::new(
            REPORT_MARKDOWN,
            "text/markdown",
            markdown.into_bytes(),
        ));

        let document = Document::from_report(&output.draft, &output.sources);
        match self.renderer.render(&document) {
            Ok(bytes) => artifacts.push(ArtifactDescriptor::new(
                self.renderer.file_name(),
                self.renderer.media_type(),
                bytes,
            )),
            Err(e) => {
                tracing::warn!(artifact = self.renderer.file_name(), error = %e, "Artifact render failed");
                notes.push(Note::new(
                    NoteKind::Render,
                    STAGE,
                    format!("{} was not produced: {}", self.renderer.file_name(), e),
                ));
            }
        }

        match trace_json(&output.trace) {
            Ok(bytes) => artifacts.push(ArtifactDescriptor::new(
                SOURCES_JSON,
                "application/json",
                bytes,
            )),
            Err(e) => {
                tracing::warn!(artifact = SOURCES_JSON, error = %e, "Artifact render failed");
                notes.push(Note::new(
                    NoteKind::Render,
                    STAGE,
                    format!("{} was not produced: {}", SOURCES_JSON, e),
                ));
            }
        }

        tracing::info!(
            artifacts = artifacts.len(),
            failed = notes.len(),
            "Artifacts built"
        );
        Outcome::with_notes(artifacts, notes)
    }
}

fn trace_json(trace: &SourceTrace) -> Result<Vec<u8>> {
    serde_json::to_vec_pretty(trace)
        .map_err(|e| AppError::Render(format!("failed to serialize source trace: {}", e)))
}
