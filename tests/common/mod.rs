#![allow(dead_code)]

pub mod mocks;

use lore::artifacts::ArtifactBuilder;
use lore::jobs::{Job, JobCoordinator, JobRunner, ResearchPipeline};
use lore::research::Reasoning;
use lore::tools::KnowledgeProvider;
use lore::{ConfigManager, LoreConfig};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

pub fn pipeline_with_config(
    reasoner: Arc<dyn Reasoning>,
    knowledge: Arc<dyn KnowledgeProvider>,
    config: LoreConfig,
) -> Arc<dyn JobRunner> {
    Arc::new(ResearchPipeline::new(
        reasoner,
        knowledge,
        ArtifactBuilder::default(),
        Arc::new(ConfigManager::from_config(config)),
    ))
}

pub fn pipeline(
    reasoner: Arc<dyn Reasoning>,
    knowledge: Arc<dyn KnowledgeProvider>,
) -> Arc<dyn JobRunner> {
    pipeline_with_config(reasoner, knowledge, LoreConfig::default())
}

/// Poll until the job reaches a terminal state.
pub async fn wait_for_terminal(coordinator: &JobCoordinator, id: Uuid) -> Job {
    for _ in 0..500 {
        let job = coordinator.status(id).unwrap();
        if job.state.is_terminal() {
            return job;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job {} never reached a terminal state", id);
}
