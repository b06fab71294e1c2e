//! Job store API endpoints
//!
//! Maps the `JobStore` port onto the store service's REST API:
//! - Fetching claimable jobs
//! - Claiming a job for this worker
//! - Reporting the execution result

use async_trait::async_trait;
use crucible_core::domain::{ExecutionOutcome, Job};
use crucible_core::{JobStore, StoreError};
use reqwest::StatusCode;
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::StoreClient;

#[async_trait]
impl JobStore for StoreClient {
    async fn fetch_claimable(&self, limit: usize) -> Result<Vec<Job>, StoreError> {
        let url = format!("{}/api/jobs/claimable", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[("limit", limit)])
            .send()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        self.handle_response(response).await
    }

    async fn claim(&self, job_id: Uuid) -> Result<bool, StoreError> {
        let url = format!("{}/api/jobs/{}/claim", self.base_url, job_id);
        let response = self
            .http
            .post(&url)
            .json(&ClaimRequest {
                worker_id: self.worker_id.clone(),
            })
            .send()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        // A lost race comes back as 409; that is an expected answer, not a
        // failure of the operation.
        match response.status() {
            StatusCode::CONFLICT => {
                debug!("job {} already claimed elsewhere", job_id);
                Ok(false)
            }
            StatusCode::NOT_FOUND => Err(StoreError::NotFound(job_id)),
            _ => {
                self.handle_empty_response(response).await?;
                Ok(true)
            }
        }
    }

    async fn report_result(
        &self,
        job_id: Uuid,
        outcome: &ExecutionOutcome,
    ) -> Result<(), StoreError> {
        let url = format!("{}/api/jobs/{}/result", self.base_url, job_id);
        let response = self
            .http
            .post(&url)
            .json(&ReportResultRequest {
                stdout: &outcome.stdout,
                stderr: &outcome.stderr,
                exit_code: outcome.exit_code,
            })
            .send()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound(job_id));
        }

        self.handle_empty_response(response).await
    }
}

#[derive(Debug, Serialize)]
struct ClaimRequest {
    worker_id: String,
}

#[derive(Debug, Serialize)]
struct ReportResultRequest<'a> {
    stdout: &'a str,
    stderr: &'a str,
    exit_code: i32,
}
