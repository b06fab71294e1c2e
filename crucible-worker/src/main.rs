//! Crucible Worker
//!
//! A worker that executes queued code submissions in deadline-bounded
//! subprocesses.
//!
//! Architecture:
//! - Configuration: Load settings from environment or defaults
//! - Store client: HTTP communication with the job store service
//! - Sandbox: subprocess execution with output capture and a hard deadline
//! - Scheduler: polling, claiming, and dispatch through the worker pool
//!
//! The worker polls the store for pending jobs, claims them, runs each
//! one's code in an isolated child process, and writes the outcome back.

mod config;
mod pool;
mod sandbox;
mod scheduler;

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::sandbox::Sandbox;
use crate::scheduler::JobPoller;
use crucible_client::StoreClient;
use crucible_core::JobStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "crucible_worker=info,crucible_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Crucible Worker");

    // Load configuration
    let config = load_config()?;
    info!(
        "Loaded configuration: worker_id={}, store_url={}",
        config.worker_id, config.store_url
    );

    std::fs::create_dir_all(&config.scratch_dir).with_context(|| {
        format!(
            "Failed to create scratch directory {}",
            config.scratch_dir.display()
        )
    })?;

    // Initialize the store client and execution sandbox
    let store: Arc<dyn JobStore> = Arc::new(StoreClient::new(
        config.store_url.clone(),
        config.worker_id.clone(),
    ));
    let sandbox = Sandbox::new(config.interpreter.clone(), config.scratch_dir.clone());

    info!(
        "Poll interval: {:?}, job deadline: {:?}, pool capacity: {}",
        config.poll_interval, config.job_deadline, config.max_parallel_jobs
    );

    // Create the poller and run forever; only a supervisor stops us.
    let poller = JobPoller::new(config, store, sandbox);

    info!("Worker initialized successfully");
    poller.run().await;

    Ok(())
}

/// Loads configuration from environment variables with fallback to defaults
fn load_config() -> Result<Config> {
    match Config::from_env() {
        Ok(config) => {
            config.validate()?;
            Ok(config)
        }
        Err(_) => {
            info!("Failed to load config from environment, using defaults");
            let config = Config::default();
            config.validate()?;
            Ok(config)
        }
    }
}
