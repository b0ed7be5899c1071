//! Knowledge Tools
//!
//! The research agent looks things up through the [`KnowledgeProvider`] trait,
//! which exposes exactly two operations: a ranked title search and a summary
//! fetch by exact title.
//!
//! # Module Structure
//!
//! - [`knowledge`](crate::tools::knowledge) - The provider trait
//! - [`wikipedia`](crate::tools::wikipedia) - MediaWiki API implementation
//!
//! ```ignore
//! let wiki = WikipediaClient::from_config(&config.knowledge)?;
//! let titles = wiki.search("photosynthesis", 5).await?;
//! let summary = wiki.fetch_summary(&titles[0]).await?;
//! ```

/// Knowledge provider trait.
pub mod knowledge;
/// Wikipedia search and summary client.
pub mod wikipedia;

pub use knowledge::KnowledgeProvider;
pub use wikipedia::WikipediaClient;
