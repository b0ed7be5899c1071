use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

// ============= API Request/Response Types =============

/// Multipart fields accepted by `POST /jobs`.
#[derive(Debug, ToSchema)]
pub struct SubmitForm {
    pub prompt: String,
    /// Optional image file; its part content type must be `image/*`
    #[schema(value_type = Option<String>, format = Binary)]
    pub image: Option<Vec<u8>>,
    pub context_text: Option<String>,
}

/// Returned by `POST /jobs` once the job record exists.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SubmitResponse {
    pub job_id: Uuid,
    pub status_url: String,
    pub result_url: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct JobStatusResponse {
    pub job_id: Uuid,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub notes: Vec<Note>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_urls: Option<Vec<String>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct JobFilesResponse {
    pub job_id: Uuid,
    pub files: Vec<String>,
    pub download_urls: Vec<String>,
}

// ============= Research Types =============

/// A knowledge-provider result attached to a job.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq)]
pub struct Source {
    pub title: String,
    pub url: Option<String>,
    /// Summary text as returned by the provider
    pub summary: String,
    /// The search query that surfaced this source
    pub query: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq)]
pub struct Section {
    pub heading: String,
    pub body: String,
}

/// Synthesized report prior to rendering.
///
/// Body text cites sources with `[n]` markers, where `n` is the 1-based index
/// into the source list handed to synthesis. `citations` holds the sources
/// that are actually referenced, in numbering order.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq)]
pub struct ReportDraft {
    pub title: String,
    pub sections: Vec<Section>,
    pub citations: Vec<Source>,
}

/// A bounded slice of oversized input text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextChunk {
    pub index: usize,
    pub text: String,
}

/// A named, immutable output of a finished job.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ArtifactDescriptor {
    pub name: String,
    pub media_type: String,
    #[serde(skip)]
    pub content: Arc<[u8]>,
}

impl ArtifactDescriptor {
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            content: Arc::from(content),
        }
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

// ============= Soft Failures =============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum NoteKind {
    /// A source summary could not be fetched; the pipeline continued without it
    PartialRetrieval,
    /// Context reduction kept original text or passed an oversized summary through
    ContextFallback,
    /// One artifact failed to render; the others were delivered
    Render,
}

/// A recoverable problem recorded on the job instead of failing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Note {
    pub kind: NoteKind,
    pub stage: String,
    pub message: String,
}

impl Note {
    pub fn new(kind: NoteKind, stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            stage: stage.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.stage, self.message)
    }
}

/// Success value plus the soft failures collected while producing it.
#[derive(Debug, Clone)]
pub struct Outcome<T> {
    pub value: T,
    pub notes: Vec<Note>,
}

impl<T> Outcome<T> {
    pub fn clean(value: T) -> Self {
        Self {
            value,
            notes: Vec::new(),
        }
    }

    pub fn with_notes(value: T, notes: Vec<Note>) -> Self {
        Self { value, notes }
    }
}

/// A hard failure plus the soft failures recorded before it.
#[derive(Debug)]
pub struct Failure {
    pub error: AppError,
    pub notes: Vec<Note>,
}

impl Failure {
    pub fn new(error: AppError, notes: Vec<Note>) -> Self {
        Self { error, notes }
    }

    /// Put notes from earlier stages ahead of the ones already carried.
    pub fn after(mut self, mut earlier: Vec<Note>) -> Self {
        earlier.append(&mut self.notes);
        self.notes = earlier;
        self
    }
}

impl From<AppError> for Failure {
    fn from(error: AppError) -> Self {
        Self::new(error, Vec::new())
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.error.fmt(f)
    }
}

// ============= Error Types =============

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{capability} failed: {message}")]
    Capability { capability: String, message: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn capability(capability: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Capability {
            capability: capability.into(),
            message: message.into(),
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::InvalidInput(_) => axum::http::StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => axum::http::StatusCode::NOT_FOUND,
            AppError::Capability { .. } => axum::http::StatusCode::BAD_GATEWAY,
            AppError::Render(_) | AppError::Configuration(_) | AppError::Internal(_) => {
                axum::http::StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let message = match self {
            AppError::InvalidInput(msg)
            | AppError::NotFound(msg)
            | AppError::Render(msg)
            | AppError::Configuration(msg)
            | AppError::Internal(msg) => msg,
            other @ AppError::Capability { .. } => other.to_string(),
        };

        let body = serde_json::json!({
            "error": message
        });

        (status, axum::Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
