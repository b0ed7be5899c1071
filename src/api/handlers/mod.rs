//! API request handlers.

/// Liveness handler.
pub mod health;
/// Job submission, status and artifact download handlers.
pub mod jobs;
