//! In-memory job store
//!
//! Backs tests and local runs with the same claim/report contract the real
//! store service provides. All state lives under one mutex; `claim` and
//! `report_result` hold it for the whole transition, which is what makes
//! them atomic with respect to concurrent callers.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{ExecutionOutcome, Job, JobStatus};
use crate::error::StoreError;
use crate::store::JobStore;

/// In-memory `JobStore` implementation.
#[derive(Default)]
pub struct InMemoryJobStore {
    jobs: Mutex<HashMap<Uuid, Job>>,
    /// When set, every operation fails with `StoreError::Unavailable`.
    /// Lets tests drive the poll loop's backoff path.
    unavailable: AtomicBool,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Producer-side helper: enqueue a new pending job and return its id.
    pub fn submit(&self, code: impl Into<String>) -> Uuid {
        let id = Uuid::new_v4();
        let job = Job {
            id,
            code: code.into(),
            status: JobStatus::Pending,
            is_running: true,
            output: String::new(),
            error_text: String::new(),
            exit_code: None,
            created_at: chrono::Utc::now(),
            started_at: None,
            completed_at: None,
        };
        self.jobs.lock().unwrap().insert(id, job);
        id
    }

    /// Snapshot of a single record.
    pub fn get(&self, job_id: Uuid) -> Option<Job> {
        self.jobs.lock().unwrap().get(&job_id).cloned()
    }

    /// Toggle failure injection for every subsequent operation.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable(
                "in-memory store marked unavailable".to_string(),
            ))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn fetch_claimable(&self, limit: usize) -> Result<Vec<Job>, StoreError> {
        self.check_available()?;

        let jobs = self.jobs.lock().unwrap();
        let mut claimable: Vec<Job> = jobs
            .values()
            .filter(|job| job.status == JobStatus::Pending && job.is_running)
            .cloned()
            .collect();

        // Oldest first so a busy queue cannot starve early submissions.
        claimable.sort_by_key(|job| job.created_at);
        claimable.truncate(limit);

        Ok(claimable)
    }

    async fn claim(&self, job_id: Uuid) -> Result<bool, StoreError> {
        self.check_available()?;

        let mut jobs = self.jobs.lock().unwrap();
        let job = jobs.get_mut(&job_id).ok_or(StoreError::NotFound(job_id))?;

        if job.status != JobStatus::Pending {
            return Ok(false);
        }

        job.status = JobStatus::Running;
        job.started_at = Some(chrono::Utc::now());
        Ok(true)
    }

    async fn report_result(
        &self,
        job_id: Uuid,
        outcome: &ExecutionOutcome,
    ) -> Result<(), StoreError> {
        self.check_available()?;

        let mut jobs = self.jobs.lock().unwrap();
        let job = jobs.get_mut(&job_id).ok_or(StoreError::NotFound(job_id))?;

        job.status = outcome.status();
        job.output = outcome.stdout.clone();
        job.error_text = outcome.stderr.clone();
        job.exit_code = Some(outcome.exit_code);
        job.is_running = false;
        // Keep the original completion time if the same outcome is
        // re-applied; idempotent reports must not move the timestamp.
        if job.completed_at.is_none() {
            job.completed_at = Some(chrono::Utc::now());
        }

        Ok(())
    }
}
