//! Research Pipeline
//!
//! Turns a prompt into a sourced report through a fixed sequence of steps.
//! The order never changes and no step is chosen by the model.
//!
//! # Architecture
//!
//! - [`reasoning::Reasoning`] - Topic extraction, summarization and synthesis
//! - [`agent::ResearchAgent`] - Runs the sequence against a knowledge provider
//! - [`trace::SourceTrace`] - Audit log of every provider call
//! - [`citations`] - Keeps `[n]` markers consistent with the retrieved sources
//!
//! # Usage
//!
//! ```ignore
//! use lore::research::{ResearchAgent, LlmReasoner};
//!
//! let agent = ResearchAgent::new(reasoner, knowledge, &config.research);
//! let outcome = agent.run("Explain photosynthesis", None, None).await?;
//!
//! println!("{}", outcome.value.draft.title);
//! for note in outcome.notes {
//!     println!("warning: {}", note);
//! }
//! ```
//!
//! # Research Workflow
//!
//! 1. **Topic extraction** - Reduce the prompt (and image) to a search query
//! 2. **Search** - Ranked candidate titles from the knowledge provider
//! 3. **Summary retrieval** - Summaries for the top distinct titles, in rank order
//! 4. **Synthesis** - Title and sections citing the retrieved sources

/// Research sequence orchestration.
pub mod agent;
/// Citation marker normalization.
pub mod citations;
/// Reasoning capability trait and its LLM implementation.
pub mod reasoning;
/// Source-call audit trace.
pub mod trace;

pub use agent::{ResearchAgent, ResearchOutput};
pub use reasoning::{LlmReasoner, Reasoning, SynthesisRequest, TokenBudgets};
pub use trace::SourceTrace;
