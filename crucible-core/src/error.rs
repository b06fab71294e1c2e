//! Error types for job store operations

use thiserror::Error;
use uuid::Uuid;

/// Errors a [`JobStore`](crate::store::JobStore) operation can surface.
///
/// A lost claim race is NOT an error; `claim` reports it as `Ok(false)`.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be reached (network, availability).
    #[error("job store unavailable: {0}")]
    Unavailable(String),

    /// The store answered but rejected the request.
    #[error("job store rejected request (status {status}): {message}")]
    Rejected {
        /// HTTP status code
        status: u16,
        /// Error message from the store
        message: String,
    },

    /// A store response could not be decoded.
    #[error("failed to decode store response: {0}")]
    Decode(String),

    /// The referenced job does not exist.
    #[error("job {0} not found")]
    NotFound(Uuid),
}

impl StoreError {
    /// Create a rejection error from a status code and message.
    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            message: message.into(),
        }
    }

    /// Check if this error is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_)) || matches!(self, Self::Rejected { status: 404, .. })
    }
}
