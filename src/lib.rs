//! # Lore - research job server
//!
//! Lore turns a research prompt (optionally with an image and a block of
//! context text) into a cited report. Each request becomes a background job
//! that moves through `queued -> started -> {finished | failed}`; a finished
//! job exposes a markdown report, a PDF and a JSON source trace.
//!
//! ## Overview
//!
//! Lore can be used in two ways:
//!
//! 1. **As a standalone server** - Run the `lore-server` binary
//! 2. **As a library** - Wire the pipeline into your own Rust project
//!
//! ### Library Example
//!
//! ```rust,ignore
//! use lore::{ConfigManager, JobCoordinator, LlmReasoner, Provider, ResearchPipeline};
//! use lore::artifacts::ArtifactBuilder;
//! use lore::tools::WikipediaClient;
//! use std::sync::Arc;
//!
//! let manager = Arc::new(ConfigManager::new("lore.toml")?);
//! let config = manager.config();
//!
//! let llm = Provider::from_config(&config.llm)?.create_client(config.llm.request_timeout())?;
//! let pipeline = ResearchPipeline::new(
//!     Arc::new(LlmReasoner::from_config(llm, &config.llm)),
//!     Arc::new(WikipediaClient::from_config(&config.knowledge)?),
//!     ArtifactBuilder::default(),
//!     manager.clone(),
//! );
//!
//! let coordinator = JobCoordinator::start(Arc::new(pipeline), &config.jobs);
//! let job_id = coordinator.submit(lore::jobs::JobInput::new("Explain photosynthesis"))?;
//! ```
//!
//! ## Modules
//!
//! - [`api`] - REST API handlers and routes
//! - [`artifacts`] - Markdown, PDF and source-trace rendering
//! - [`context`] - Chunking and reduction of long context text
//! - [`jobs`] - Job state machine, dispatch queue and coordinator
//! - [`llm`] - LLM client implementations
//! - [`research`] - Topic extraction, retrieval and report synthesis
//! - [`tools`] - Knowledge providers (Wikipedia)
//! - [`types`] - Common types and error handling

#![warn(rustdoc::missing_crate_level_docs)]

/// HTTP API handlers and routes.
pub mod api;
/// Report artifacts (markdown, PDF, source trace).
pub mod artifacts;
/// Command-line interface.
pub mod cli;
/// Context reduction for oversized input text.
pub mod context;
/// Job lifecycle, dispatch and coordination.
pub mod jobs;
/// LLM provider clients and abstractions.
pub mod llm;
/// Research agent and reasoning capability.
pub mod research;
/// Knowledge providers.
pub mod tools;
/// Core types (responses, notes, errors).
pub mod types;
/// Configuration utilities (TOML).
pub mod utils;

// Re-export commonly used types
pub use artifacts::ArtifactBuilder;
pub use jobs::{JobCoordinator, JobRunner, ResearchPipeline};
pub use llm::{LLMClient, Provider};
pub use research::{LlmReasoner, Reasoning, ResearchAgent};
pub use tools::{KnowledgeProvider, WikipediaClient};
pub use types::{AppError, Result};
pub use utils::toml_config::{ConfigManager, LoreConfig};

use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// TOML configuration with hot-reload support
    pub config: Arc<ConfigManager>,
    /// Owner of every job record
    pub coordinator: Arc<JobCoordinator>,
}
