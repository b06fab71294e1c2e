//! Job poller
//!
//! Polls the job store for claimable jobs, claims them, and dispatches
//! them to the sandbox through the bounded worker pool. Owns the poll
//! cadence, error backoff, and per-job error containment: a job can only
//! ever fail itself, never the loop.

use std::sync::Arc;
use std::time::Duration;

use crucible_core::domain::{ExecutionOutcome, Job};
use crucible_core::{JobStore, StoreError};
use tokio::sync::OwnedSemaphorePermit;
use tokio::time;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::pool::WorkerPool;
use crate::sandbox::Sandbox;

/// Job poller that continuously claims and executes jobs
pub struct JobPoller {
    config: Config,
    store: Arc<dyn JobStore>,
    sandbox: Arc<Sandbox>,
    pool: WorkerPool,
}

impl JobPoller {
    /// Creates a new job poller
    pub fn new(config: Config, store: Arc<dyn JobStore>, sandbox: Sandbox) -> Self {
        let pool = WorkerPool::new(config.max_parallel_jobs);
        Self {
            config,
            store,
            sandbox: Arc::new(sandbox),
            pool,
        }
    }

    /// Starts the polling loop.
    ///
    /// The loop itself never terminates: store failures abort the current
    /// cycle and back off, then polling resumes. Stopping the worker is a
    /// supervisor's decision, not the loop's.
    pub async fn run(&self) {
        info!(
            "Starting job poller (batch: {}, interval: {:?}, pool: {})",
            self.config.batch_size,
            self.config.poll_interval,
            self.pool.capacity()
        );

        loop {
            match self.poll_once().await {
                Ok(dispatched) => {
                    if dispatched > 0 {
                        info!("Dispatched {} job(s) this cycle", dispatched);
                    }
                    time::sleep(self.config.poll_interval).await;
                }
                Err(e) => {
                    error!("Error during poll cycle: {e}");
                    time::sleep(self.config.backoff_interval).await;
                }
            }
        }
    }

    /// Performs a single fetch-claim-dispatch cycle.
    ///
    /// Returns how many jobs were claimed and handed to the pool. The
    /// poller never waits for a dispatched job to finish before moving on.
    pub async fn poll_once(&self) -> Result<usize, StoreError> {
        debug!("Polling for claimable jobs");

        let jobs = self.store.fetch_claimable(self.config.batch_size).await?;

        if jobs.is_empty() {
            debug!("No jobs available");
            return Ok(0);
        }

        info!("Found {} claimable job(s)", jobs.len());

        let mut dispatched = 0;

        for job in jobs {
            // Take the execution slot before claiming, so a claimed job is
            // never left waiting behind a saturated pool.
            let permit = self.pool.acquire().await;

            if !self.store.claim(job.id).await? {
                // Lost the race to another worker. The fetch was only
                // advisory; this is expected, not an error.
                debug!("Job {} was claimed elsewhere, skipping", job.id);
                continue;
            }

            self.spawn_job_task(job, permit);
            dispatched += 1;
        }

        Ok(dispatched)
    }

    /// Spawns a detached task that executes one claimed job and reports
    /// the result, holding its pool permit until both are done.
    fn spawn_job_task(&self, job: Job, permit: OwnedSemaphorePermit) {
        let store = Arc::clone(&self.store);
        let sandbox = Arc::clone(&self.sandbox);
        let deadline = self.config.job_deadline;

        tokio::spawn(async move {
            let _permit = permit;

            info!("Executing job {}", job.id);
            let outcome = sandbox.execute(&job.code, deadline).await;
            info!(
                "Job {} finished with exit code {} ({})",
                job.id,
                outcome.exit_code,
                outcome.status()
            );

            if let Err(e) = report_with_retry(store.as_ref(), job.id, &outcome).await {
                // The record stays visibly `running`; nothing in-core
                // recovers it.
                error!("Failed to report result for job {}: {e}", job.id);
            }
        });
    }
}

/// Writes a result back with a short exponential backoff.
///
/// The store may be briefly unreachable right as an execution finishes;
/// giving up on the first failed write would discard completed work.
async fn report_with_retry(
    store: &dyn JobStore,
    job_id: Uuid,
    outcome: &ExecutionOutcome,
) -> Result<(), StoreError> {
    const MAX_ATTEMPTS: u32 = 3;
    const INITIAL_DELAY_MS: u64 = 500;

    let mut attempt = 0;
    let mut delay_ms = INITIAL_DELAY_MS;

    loop {
        attempt += 1;

        match store.report_result(job_id, outcome).await {
            Ok(()) => return Ok(()),
            Err(e) if attempt < MAX_ATTEMPTS => {
                warn!(
                    "Failed to report result for job {} (attempt {}/{}): {e}",
                    job_id, attempt, MAX_ATTEMPTS
                );
                time::sleep(Duration::from_millis(delay_ms)).await;
                delay_ms *= 2;
            }
            Err(e) => return Err(e),
        }
    }
}
