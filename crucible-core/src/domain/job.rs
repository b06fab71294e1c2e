//! Job domain types

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Job execution record
///
/// Structure shared between the job store service (persists) and workers
/// (claim and update).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    /// Untrusted source text submitted by a producer.
    pub code: String,
    pub status: JobStatus,
    /// Coarse claim flag, distinct from `status`. Producers create jobs
    /// with `status = pending` and `is_running = true`; the store clears it
    /// when the result lands.
    pub is_running: bool,
    #[serde(default)]
    pub output: String,
    #[serde(default)]
    pub error_text: String,
    pub exit_code: Option<i32>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub started_at: Option<chrono::DateTime<chrono::Utc>>,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl Job {
    /// Whether the record is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self.status, JobStatus::Completed | JobStatus::Error)
    }
}

/// Job lifecycle status
///
/// Valid transitions: `pending -> running -> {completed | error}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Error,
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Error => "error",
        };
        f.write_str(s)
    }
}

/// Captured result of one sandboxed execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionOutcome {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl ExecutionOutcome {
    /// Outcome for an execution that never produced a usable exit status
    /// (launch failure, deadline expiry). Uses the `-1` sentinel.
    pub fn failed(stderr: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            stderr: stderr.into(),
            exit_code: -1,
        }
    }

    /// Terminal status this outcome maps to.
    ///
    /// The exit code alone decides: zero is `completed`, everything else is
    /// `error`. Stderr content never influences classification.
    pub fn status(&self) -> JobStatus {
        if self.exit_code == 0 {
            JobStatus::Completed
        } else {
            JobStatus::Error
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_exit_classifies_as_completed() {
        let outcome = ExecutionOutcome {
            stdout: "hello\n".to_string(),
            stderr: String::new(),
            exit_code: 0,
        };
        assert_eq!(outcome.status(), JobStatus::Completed);
    }

    #[test]
    fn nonzero_exit_classifies_as_error_even_with_clean_stderr() {
        let outcome = ExecutionOutcome {
            stdout: "partial".to_string(),
            stderr: String::new(),
            exit_code: 3,
        };
        assert_eq!(outcome.status(), JobStatus::Error);
    }

    #[test]
    fn failed_outcome_uses_sentinel_exit_code() {
        let outcome = ExecutionOutcome::failed("no such interpreter");
        assert_eq!(outcome.exit_code, -1);
        assert_eq!(outcome.status(), JobStatus::Error);
        assert!(outcome.stdout.is_empty());
    }

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&JobStatus::Completed).unwrap();
        assert_eq!(json, "\"completed\"");
    }
}
