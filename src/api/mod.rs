//! HTTP API Handlers and Routes
//!
//! The REST surface for Lore, built on the Axum web framework. It is a thin
//! adapter over [`JobCoordinator`](crate::jobs::JobCoordinator): handlers
//! parse requests, call the coordinator and map `AppError` to status codes.
//!
//! # API Endpoints
//!
//! - `POST /jobs` - Submit a job (multipart: `prompt`, optional `image`, optional `context_text`)
//! - `GET /jobs/{id}` - Job status, notes and, once finished, artifact names
//! - `GET /jobs/{id}/files` - Artifact names and download URLs
//! - `GET /jobs/{id}/download/{filename}` - Artifact bytes
//! - `GET /health` - Health check endpoint
//! - `GET /api-docs/openapi.json` - OpenAPI document

/// Request and response handlers for all API endpoints.
pub mod handlers;
/// Router configuration and route definitions.
pub mod routes;
