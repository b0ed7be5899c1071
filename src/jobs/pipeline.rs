use std::sync::Arc;

use async_trait::async_trait;

use crate::artifacts::ArtifactBuilder;
use crate::context::ContextReducer;
use crate::jobs::state::JobInput;
use crate::research::{Reasoning, ResearchAgent};
use crate::tools::KnowledgeProvider;
use crate::types::{ArtifactDescriptor, Failure, Outcome};
use crate::utils::toml_config::ConfigManager;

/// The work a dispatched job performs.
///
/// A failed run still returns every note recorded before the hard error so
/// the job can keep them alongside its error message.
#[async_trait]
pub trait JobRunner: Send + Sync {
    async fn run(&self, input: &JobInput) -> RunResult;
}

pub type RunResult = std::result::Result<Outcome<Vec<ArtifactDescriptor>>, Failure>;

/// Context reduction, research, then artifact rendering, strictly in sequence.
pub struct ResearchPipeline {
    reasoner: Arc<dyn Reasoning>,
    knowledge: Arc<dyn KnowledgeProvider>,
    builder: ArtifactBuilder,
    config: Arc<ConfigManager>,
}

impl ResearchPipeline {
    pub fn new(
        reasoner: Arc<dyn Reasoning>,
        knowledge: Arc<dyn KnowledgeProvider>,
        builder: ArtifactBuilder,
        config: Arc<ConfigManager>,
    ) -> Self {
        Self {
            reasoner,
            knowledge,
            builder,
            config,
        }
    }
}

#[async_trait]
impl JobRunner for ResearchPipeline {
    async fn run(&self, input: &JobInput) -> RunResult {
        // One snapshot per job, even if the file is reloaded mid-run
        let config = self.config.config();
        let mut notes = Vec::new();

        let context = match input.context_text.as_deref() {
            Some(text) if !text.trim().is_empty() => {
                tracing::info!(stage = "context", "Reducing context");
                let reducer = ContextReducer::from_config(&config.context);
                let reduced = reducer.reduce(text, self.reasoner.as_ref()).await;
                notes.extend(reduced.notes);
                Some(reduced.value)
            }
            _ => None,
        };

        tracing::info!(stage = "research", "Running research agent");
        let agent = ResearchAgent::new(
            self.reasoner.clone(),
            self.knowledge.clone(),
            &config.research,
        );
        let research = agent
            .run(&input.prompt, input.image.as_ref(), context.as_deref())
            .await
            .map_err(|failure| failure.after(std::mem::take(&mut notes)))?;
        notes.extend(research.notes);

        tracing::info!(stage = "artifacts", "Building artifacts");
        let built = self.builder.build(&research.value);
        notes.extend(built.notes);

        Ok(Outcome::with_notes(built.value, notes))
    }
}
