//! Crucible Core
//!
//! Core types and abstractions for the Crucible job-execution system.
//!
//! This crate contains:
//! - Domain types: job records, statuses, execution outcomes
//! - The `JobStore` port workers poll and report through, plus an
//!   in-memory implementation for tests and local runs

pub mod domain;
pub mod error;
pub mod store;

pub use error::StoreError;
pub use store::JobStore;
