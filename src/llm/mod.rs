//! LLM Provider Clients and Abstractions
//!
//! This module provides a unified interface for the language models that back
//! the reasoning capability. Everything above this module talks to an
//! [`LLMClient`] trait object and never to a concrete provider.
//!
//! # Supported Providers
//!
//! - OpenAI and any OpenAI-compatible endpoint (`/chat/completions`)
//! - A local Ollama server (`/api/chat`)
//!
//! Both accept an optional image alongside the prompt, so the same pipeline
//! serves text-only and text+image submissions.
//!
//! # Example
//!
//! ```ignore
//! use lore::llm::{LlmRequest, Provider};
//! use std::time::Duration;
//!
//! let provider = Provider::Ollama {
//!     base_url: "http://localhost:11434".to_string(),
//!     model: "llava".to_string(),
//! };
//! let client = provider.create_client(Duration::from_secs(120))?;
//! let request = LlmRequest::new("What is 2+2?").system("Be brief.").max_tokens(16);
//! let answer = client.complete(&request).await?;
//! ```

/// Core LLM client trait, request type and provider selection.
pub mod client;
/// Ollama `/api/chat` client.
pub mod ollama;
/// OpenAI-compatible `/chat/completions` client.
pub mod openai;

pub use client::{ImageInput, LLMClient, LlmRequest, Provider};
