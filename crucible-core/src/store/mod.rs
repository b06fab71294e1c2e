//! Job store port
//!
//! Workers see the shared queue only through this trait: fetch candidates,
//! claim one, write the result back. All mutation goes through `claim` and
//! `report_result`, both of which the backing store must apply atomically.

pub mod memory;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{ExecutionOutcome, Job};
use crate::error::StoreError;

pub use memory::InMemoryJobStore;

/// Abstract queue of job records.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Fetches up to `limit` claimable jobs
    /// (`status == pending && is_running == true`), oldest first.
    ///
    /// The result is advisory only: another worker may claim any of these
    /// jobs before this caller does. `claim` is the sole arbiter of
    /// ownership.
    async fn fetch_claimable(&self, limit: usize) -> Result<Vec<Job>, StoreError>;

    /// Attempts to atomically transition the job out of `pending`, stamping
    /// `started_at` with the store's clock.
    ///
    /// Returns `false` when another caller won the race. Under concurrent
    /// callers exactly one claim on a given job succeeds.
    async fn claim(&self, job_id: Uuid) -> Result<bool, StoreError>;

    /// Atomically writes the terminal state for a claimed job: `status`
    /// (from the outcome's exit-code classification), `output`,
    /// `error_text`, `exit_code`, `completed_at`, `is_running = false`.
    ///
    /// Idempotent: re-applying the same outcome leaves the record
    /// unchanged.
    async fn report_result(
        &self,
        job_id: Uuid,
        outcome: &ExecutionOutcome,
    ) -> Result<(), StoreError>;
}
