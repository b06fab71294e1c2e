//! Scheduler layer for the worker
//!
//! This layer handles polling the job store for claimable jobs and
//! coordinating execution. It manages the lifecycle of jobs from claiming
//! to result reporting.

pub mod poller;

pub use poller::JobPoller;
