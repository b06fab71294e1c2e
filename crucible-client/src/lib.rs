//! Crucible HTTP store client
//!
//! A type-safe HTTP client for the job store service's REST API. It is the
//! production implementation of the [`JobStore`] port: workers fetch
//! claimable jobs, claim them, and report execution results through it.
//!
//! # Example
//!
//! ```no_run
//! use crucible_client::StoreClient;
//! use crucible_core::JobStore;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), crucible_core::StoreError> {
//!     let store = StoreClient::new("http://localhost:8080", "worker-1");
//!
//!     let jobs = store.fetch_claimable(5).await?;
//!     println!("{} job(s) waiting", jobs.len());
//!     Ok(())
//! }
//! ```

mod jobs;

pub use crucible_core::{JobStore, StoreError};

use reqwest::Client;
use serde::de::DeserializeOwned;

/// HTTP client for the job store service.
///
/// Mutating requests carry the worker id so the store can record which
/// worker owns a claimed job.
#[derive(Debug, Clone)]
pub struct StoreClient {
    /// Base URL of the store service (e.g., "http://localhost:8080")
    base_url: String,
    /// HTTP client instance
    http: Client,
    /// Identifier this worker claims jobs under
    worker_id: String,
}

impl StoreClient {
    /// Create a new store client.
    ///
    /// # Arguments
    /// * `base_url` - The base URL of the store API (e.g., "http://localhost:8080")
    /// * `worker_id` - Identifier sent with every claim
    pub fn new(base_url: impl Into<String>, worker_id: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: Client::new(),
            worker_id: worker_id.into(),
        }
    }

    /// Create a new store client with a custom HTTP client.
    ///
    /// This allows configuring timeouts, proxies, TLS settings, etc.
    pub fn with_client(
        base_url: impl Into<String>,
        worker_id: impl Into<String>,
        http: Client,
    ) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
            worker_id: worker_id.into(),
        }
    }

    /// Get the base URL of the store service.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Get the worker id claims are made under.
    pub fn worker_id(&self) -> &str {
        &self.worker_id
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Handle a store response and deserialize the JSON body.
    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, StoreError> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(StoreError::rejected(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| StoreError::Decode(format!("failed to parse JSON response: {e}")))
    }

    /// Handle a store response that returns no content.
    async fn handle_empty_response(&self, response: reqwest::Response) -> Result<(), StoreError> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(StoreError::rejected(status.as_u16(), error_text));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = StoreClient::new("http://localhost:8080", "worker-1");
        assert_eq!(client.base_url(), "http://localhost:8080");
        assert_eq!(client.worker_id(), "worker-1");
    }

    #[test]
    fn test_client_trims_trailing_slash() {
        let client = StoreClient::new("http://localhost:8080/", "worker-1");
        assert_eq!(client.base_url(), "http://localhost:8080");
    }

    #[test]
    fn test_client_with_custom_client() {
        let http = Client::new();
        let client = StoreClient::with_client("http://localhost:8080", "worker-1", http);
        assert_eq!(client.base_url(), "http://localhost:8080");
    }
}
