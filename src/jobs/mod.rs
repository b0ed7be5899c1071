//! Job Orchestration
//!
//! A job moves through `queued -> started -> {finished | failed}` and never
//! back. Submission is non-blocking: it stores the job and sends its id over
//! an in-process queue. Worker tasks receive ids and call
//! [`JobCoordinator::dispatch`], which runs one job's stages in sequence.
//!
//! # Module Structure
//!
//! - [`state`] - `JobState`, transitions and the `Job` record
//! - [`store`] - Snapshot-on-read job table
//! - [`queue`] - Dispatch messages and the worker pool
//! - [`pipeline`] - `JobRunner` trait and the research pipeline
//! - [`coordinator`] - Submission, dispatch and read access

/// Submission, dispatch and read access.
pub mod coordinator;
/// The work each job performs.
pub mod pipeline;
/// Dispatch transport and workers.
pub mod queue;
/// Lifecycle state machine.
pub mod state;
/// In-memory job table.
pub mod store;

pub use coordinator::JobCoordinator;
pub use pipeline::{JobRunner, ResearchPipeline, RunResult};
pub use queue::{DispatchMessage, DispatchQueue, DispatchReceiver, WorkerPool};
pub use state::{Job, JobInput, JobResult, JobState, StateTransition};
pub use store::JobStore;
