//! Core domain types
//!
//! This module contains the core domain structures shared between the job
//! store service (for persistence) and workers (for execution).

pub mod job;

pub use job::{ExecutionOutcome, Job, JobStatus};
