//! Job state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::llm::ImageInput;
use crate::types::{AppError, ArtifactDescriptor, Note, Result};

/// Lifecycle state of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// Submitted, waiting for a worker.
    Queued,
    /// A worker is running the pipeline.
    Started,
    /// Artifacts are available.
    Finished,
    /// The pipeline could not produce a report.
    Failed,
}

impl JobState {
    /// Transitions only move forward: queued, started, then one terminal state.
    pub fn can_transition_to(&self, target: JobState) -> bool {
        use JobState::*;

        matches!(
            (self, target),
            (Queued, Started) | (Started, Finished) | (Started, Failed)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished | Self::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Started => "started",
            Self::Finished => "finished",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A state transition event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateTransition {
    pub from: JobState,
    pub to: JobState,
    pub timestamp: DateTime<Utc>,
    pub reason: Option<String>,
}

/// What the user submitted.
#[derive(Debug, Clone)]
pub struct JobInput {
    pub prompt: String,
    pub image: Option<ImageInput>,
    pub context_text: Option<String>,
}

impl JobInput {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            image: None,
            context_text: None,
        }
    }

    pub fn with_image(mut self, image: ImageInput) -> Self {
        self.image = Some(image);
        self
    }

    pub fn with_context(mut self, context_text: impl Into<String>) -> Self {
        self.context_text = Some(context_text.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.prompt.trim().is_empty() {
            return Err(AppError::InvalidInput("prompt must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Terminal result of a job.
#[derive(Debug, Clone)]
pub enum JobResult {
    Finished { artifacts: Vec<ArtifactDescriptor> },
    Failed { error: String },
}

/// One submitted research request and its lifecycle record.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: Uuid,
    pub state: JobState,
    pub input: JobInput,
    pub result: Option<JobResult>,
    pub notes: Vec<Note>,
    pub transitions: Vec<StateTransition>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl Job {
    pub fn new(input: JobInput) -> Self {
        Self {
            id: Uuid::new_v4(),
            state: JobState::Queued,
            input,
            result: None,
            notes: Vec::new(),
            transitions: Vec::new(),
            created_at: Utc::now(),
            started_at: None,
            ended_at: None,
        }
    }

    /// Transition to a new state.
    pub fn transition_to(&mut self, new_state: JobState, reason: Option<String>) -> Result<()> {
        if !self.state.can_transition_to(new_state) {
            return Err(AppError::Internal(format!(
                "job {} cannot transition from {} to {}",
                self.id, self.state, new_state
            )));
        }

        let now = Utc::now();
        self.transitions.push(StateTransition {
            from: self.state,
            to: new_state,
            timestamp: now,
            reason,
        });
        self.state = new_state;

        match new_state {
            JobState::Started => self.started_at = Some(now),
            JobState::Finished | JobState::Failed => self.ended_at = Some(now),
            JobState::Queued => {}
        }

        Ok(())
    }

    pub fn finish(&mut self, artifacts: Vec<ArtifactDescriptor>, notes: Vec<Note>) -> Result<()> {
        self.transition_to(JobState::Finished, None)?;
        self.notes.extend(notes);
        self.result = Some(JobResult::Finished { artifacts });
        Ok(())
    }

    /// Record a hard failure; `notes` are the soft failures seen before it.
    pub fn fail(&mut self, error: impl Into<String>, notes: Vec<Note>) -> Result<()> {
        let mut error = error.into();
        if error.trim().is_empty() {
            error = "job failed without an error message".to_string();
        }
        self.transition_to(JobState::Failed, Some(error.clone()))?;
        self.notes.extend(notes);
        self.result = Some(JobResult::Failed { error });
        Ok(())
    }

    /// Artifacts of a finished job; empty otherwise.
    pub fn artifacts(&self) -> &[ArtifactDescriptor] {
        match &self.result {
            Some(JobResult::Finished { artifacts }) => artifacts,
            _ => &[],
        }
    }

    pub fn artifact_names(&self) -> Vec<String> {
        self.artifacts().iter().map(|a| a.name.clone()).collect()
    }

    pub fn error(&self) -> Option<&str> {
        match &self.result {
            Some(JobResult::Failed { error }) => Some(error),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NoteKind;
    use rstest::rstest;

    #[rstest]
    #[case(JobState::Queued, JobState::Started, true)]
    #[case(JobState::Started, JobState::Finished, true)]
    #[case(JobState::Started, JobState::Failed, true)]
    #[case(JobState::Queued, JobState::Finished, false)]
    #[case(JobState::Queued, JobState::Failed, false)]
    #[case(JobState::Started, JobState::Queued, false)]
    #[case(JobState::Started, JobState::Started, false)]
    #[case(JobState::Finished, JobState::Failed, false)]
    #[case(JobState::Finished, JobState::Started, false)]
    #[case(JobState::Failed, JobState::Queued, false)]
    fn test_transitions(#[case] from: JobState, #[case] to: JobState, #[case] allowed: bool) {
        assert_eq!(from.can_transition_to(to), allowed);
    }

    #[test]
    fn test_terminal_states() {
        assert!(!JobState::Queued.is_terminal());
        assert!(!JobState::Started.is_terminal());
        assert!(JobState::Finished.is_terminal());
        assert!(JobState::Failed.is_terminal());
    }

    #[test]
    fn test_lifecycle_timestamps() {
        let mut job = Job::new(JobInput::new("Explain tides"));
        assert_eq!(job.state, JobState::Queued);
        assert!(job.started_at.is_none());

        job.transition_to(JobState::Started, None).unwrap();
        assert!(job.started_at.is_some());

        job.finish(
            vec![ArtifactDescriptor::new("report.md", "text/markdown", b"#".to_vec())],
            vec![],
        )
        .unwrap();
        assert!(job.ended_at.is_some());
        assert_eq!(job.artifact_names(), vec!["report.md"]);
        assert_eq!(job.transitions.len(), 2);
    }

    #[test]
    fn test_terminal_job_rejects_transitions() {
        let mut job = Job::new(JobInput::new("x"));
        job.transition_to(JobState::Started, None).unwrap();
        job.fail(
            "search failed: timeout",
            vec![Note::new(NoteKind::ContextFallback, "context", "chunk 2 kept verbatim")],
        )
        .unwrap();

        assert_eq!(job.error(), Some("search failed: timeout"));
        assert_eq!(job.notes.len(), 1);
        assert!(job.transition_to(JobState::Started, None).is_err());
        assert!(job.finish(vec![], vec![]).is_err());
        assert_eq!(job.state, JobState::Failed);
        assert!(job.artifacts().is_empty());
    }

    #[test]
    fn test_fail_requires_message() {
        let mut job = Job::new(JobInput::new("x"));
        job.transition_to(JobState::Started, None).unwrap();
        job.fail("  ", Vec::new()).unwrap();
        assert!(!job.error().unwrap().trim().is_empty());
    }

    #[test]
    fn test_empty_prompt_rejected() {
        assert!(JobInput::new("   ").validate().is_err());
        assert!(JobInput::new("Explain photosynthesis").validate().is_ok());
    }

    #[test]
    fn test_state_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&JobState::Finished).unwrap(), "\"finished\"");
        assert_eq!(JobState::Started.to_string(), "started");
    }
}
