use std::collections::HashMap;

use parking_lot::RwLock;
use uuid::Uuid;

use crate::jobs::state::Job;
use crate::types::{AppError, Result};

/// Authoritative in-memory job table.
///
/// Reads hand out cloned snapshots; mutation goes through [`JobStore::update`],
/// which runs under the write lock so readers never see a half-applied change.
#[derive(Default)]
pub struct JobStore {
    jobs: RwLock<HashMap<Uuid, Job>>,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, job: Job) {
        self.jobs.write().insert(job.id, job);
    }

    pub fn remove(&self, id: Uuid) -> Option<Job> {
        self.jobs.write().remove(&id)
    }

    pub fn get(&self, id: Uuid) -> Result<Job> {
        self.jobs
            .read()
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("job {}", id)))
    }

    /// Read a projection of a job without cloning the whole record.
    pub fn view<T>(&self, id: Uuid, f: impl FnOnce(&Job) -> T) -> Result<T> {
        self.jobs
            .read()
            .get(&id)
            .map(f)
            .ok_or_else(|| AppError::NotFound(format!("job {}", id)))
    }

    pub fn update<T>(&self, id: Uuid, f: impl FnOnce(&mut Job) -> Result<T>) -> Result<T> {
        let mut jobs = self.jobs.write();
        let job = jobs
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("job {}", id)))?;
        f(job)
    }

    pub fn len(&self) -> usize {
        self.jobs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.read().is_empty()
    }
}
