//! Context Reduction
//!
//! Users may attach a context document far larger than a model prompt can
//! hold. This module bounds it before it reaches synthesis.
//!
//! - [`TextChunker`] splits text at natural boundaries without losing a byte
//! - [`ContextReducer`] summarizes each chunk once and merges the results
//!
//! Failures while summarizing never abort a job; they surface as
//! [`Note`](crate::types::Note)s on the returned [`Outcome`](crate::types::Outcome).

/// Boundary-aware text chunking.
pub mod chunker;
/// Single-pass chunk summarization.
pub mod reducer;

pub use chunker::TextChunker;
pub use reducer::ContextReducer;
