use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use uuid::Uuid;

use crate::jobs::pipeline::JobRunner;
use crate::jobs::queue::{DispatchQueue, DispatchReceiver, WorkerPool};
use crate::jobs::state::{Job, JobInput, JobState};
use crate::jobs::store::JobStore;
use crate::types::{AppError, ArtifactDescriptor, Result};
use crate::utils::toml_config::JobsConfig;

/// Owns every job record and drives each one to a terminal state.
///
/// The coordinator is the only writer of job state. Submission stores a
/// `queued` job and enqueues its id; a worker later calls [`dispatch`], which
/// runs the pipeline and records `finished` or `failed`. Readers get
/// snapshots and never observe in-progress stage results.
///
/// [`dispatch`]: JobCoordinator::dispatch
pub struct JobCoordinator {
    store: JobStore,
    queue: DispatchQueue,
    runner: Arc<dyn JobRunner>,
    job_timeout: Duration,
    workers: Mutex<Option<WorkerPool>>,
}

impl JobCoordinator {
    /// Create a coordinator without workers. Dispatch is driven by the caller
    /// through the returned receiver or by [`JobCoordinator::start_workers`].
    pub fn new(
        runner: Arc<dyn JobRunner>,
        job_timeout: Duration,
    ) -> (Arc<Self>, DispatchReceiver) {
        let (queue, receiver) = DispatchQueue::channel();
        let coordinator = Arc::new(Self {
            store: JobStore::new(),
            queue,
            runner,
            job_timeout,
            workers: Mutex::new(None),
        });
        (coordinator, receiver)
    }

    /// Create a coordinator and spawn its worker pool. Needs a tokio runtime.
    pub fn start(runner: Arc<dyn JobRunner>, config: &JobsConfig) -> Arc<Self> {
        let (coordinator, receiver) =
            Self::new(runner, Duration::from_secs(config.job_timeout_secs));
        coordinator.start_workers(receiver, config.workers);
        coordinator
    }

    pub fn start_workers(self: &Arc<Self>, receiver: DispatchReceiver, workers: usize) {
        let pool = WorkerPool::spawn(workers, receiver, Arc::downgrade(self));
        tracing::info!(workers = pool.size(), "Job workers started");
        *self.workers.lock() = Some(pool);
    }

    /// Store a new `queued` job and hand its id to the dispatch queue.
    pub fn submit(&self, input: JobInput) -> Result<Uuid> {
        input.validate()?;

        let job = Job::new(input);
        let id = job.id;
        self.store.insert(job);

        if let Err(e) = self.queue.enqueue(id) {
            self.store.remove(id);
            tracing::error!(job_id = %id, error = %e, "Could not enqueue job");
            return Err(e);
        }

        tracing::info!(job_id = %id, "Job queued");
        Ok(id)
    }

    /// Run a queued job to completion and return its terminal state.
    ///
    /// Dispatching a job that already left `queued` does nothing and returns
    /// its current state, so redelivered messages are harmless.
    pub async fn dispatch(&self, job_id: Uuid) -> Result<JobState> {
        let claimed = self.store.update(job_id, |job| {
            if job.state != JobState::Queued {
                return Ok(Err(job.state));
            }
            job.transition_to(JobState::Started, None)?;
            Ok(Ok(job.input.clone()))
        })?;

        let input = match claimed {
            Ok(input) => input,
            Err(state) => {
                tracing::debug!(job_id = %job_id, state = %state, "Job already dispatched");
                return Ok(state);
            }
        };
        tracing::info!(job_id = %job_id, "Job started");

        let runner = self.runner.clone();
        let mut task = tokio::spawn(async move { runner.run(&input).await });

        let finished = match tokio::time::timeout(self.job_timeout, &mut task).await {
            Ok(Ok(Ok(outcome))) => Ok(outcome),
            Ok(Ok(Err(failure))) => Err((failure.error.to_string(), failure.notes)),
            Ok(Err(join_error)) if join_error.is_panic() => Err((
                "internal error: research pipeline panicked".to_string(),
                Vec::new(),
            )),
            Ok(Err(join_error)) => Err((format!("internal error: {}", join_error), Vec::new())),
            Err(_) => {
                task.abort();
                Err((
                    format!("timed out after {} s", self.job_timeout.as_secs()),
                    Vec::new(),
                ))
            }
        };

        let state = match finished {
            Ok(outcome) => {
                let artifacts = outcome.value.len();
                let notes = outcome.notes.len();
                self.store
                    .update(job_id, |job| job.finish(outcome.value, outcome.notes))?;
                tracing::info!(job_id = %job_id, artifacts, notes, "Job finished");
                JobState::Finished
            }
            Err((error, notes)) => {
                tracing::warn!(
                    job_id = %job_id,
                    error = %error,
                    notes = notes.len(),
                    "Job failed"
                );
                self.store.update(job_id, |job| job.fail(error, notes))?;
                JobState::Failed
            }
        };

        Ok(state)
    }

    /// Read-only snapshot of a job.
    pub fn status(&self, job_id: Uuid) -> Result<Job> {
        self.store.get(job_id)
    }

    /// Artifacts of a finished job; empty for any other state.
    pub fn list_artifacts(&self, job_id: Uuid) -> Result<Vec<ArtifactDescriptor>> {
        self.store.view(job_id, |job| job.artifacts().to_vec())
    }

    pub fn fetch_artifact(&self, job_id: Uuid, name: &str) -> Result<ArtifactDescriptor> {
        self.store
            .view(job_id, |job| {
                job.artifacts().iter().find(|a| a.name == name).cloned()
            })?
            .ok_or_else(|| AppError::NotFound(format!("artifact '{}' for job {}", name, job_id)))
    }

    pub fn job_count(&self) -> usize {
        self.store.len()
    }
}
