//! Worker configuration
//!
//! Defines all configurable parameters for the worker including polling
//! cadence, execution deadline, pool capacity, and store connection
//! settings.

use std::path::PathBuf;
use std::time::Duration;

/// Worker configuration
///
/// All intervals and limits are configurable to allow tuning for different
/// deployment scenarios (dev vs prod, short scripts vs long batches).
#[derive(Debug, Clone)]
pub struct Config {
    /// Unique identifier for this worker instance
    pub worker_id: String,

    /// Job store base URL (e.g., "http://localhost:8080")
    pub store_url: String,

    /// How many candidate jobs to fetch per poll cycle
    pub batch_size: usize,

    /// How long to sleep between poll cycles
    pub poll_interval: Duration,

    /// How long to sleep after a failed poll cycle before retrying
    pub backoff_interval: Duration,

    /// Maximum wall-clock time one job may execute
    pub job_deadline: Duration,

    /// Max jobs the worker executes concurrently
    pub max_parallel_jobs: usize,

    /// Interpreter that runs submitted code
    pub interpreter: String,

    /// Directory staged job scripts are written to
    pub scratch_dir: PathBuf,
}

impl Config {
    /// Creates a new configuration with defaults
    pub fn new(worker_id: String, store_url: String) -> Self {
        Self {
            worker_id,
            store_url,
            batch_size: 5,
            poll_interval: Duration::from_secs(2),
            backoff_interval: Duration::from_secs(5),
            job_deadline: Duration::from_secs(60),
            max_parallel_jobs: 2,
            interpreter: "python3".to_string(),
            scratch_dir: std::env::temp_dir(),
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Expected environment variables:
    /// - WORKER_ID (required)
    /// - STORE_URL (required)
    /// - BATCH_SIZE (optional, default: 5)
    /// - POLL_INTERVAL (optional, seconds, default: 2)
    /// - BACKOFF_INTERVAL (optional, seconds, default: 5)
    /// - JOB_DEADLINE (optional, seconds, default: 60)
    /// - MAX_PARALLEL_JOBS (optional, default: 2)
    /// - INTERPRETER (optional, default: python3)
    /// - SCRATCH_DIR (optional, default: system temp dir)
    pub fn from_env() -> anyhow::Result<Self> {
        let worker_id = std::env::var("WORKER_ID")
            .map_err(|_| anyhow::anyhow!("WORKER_ID environment variable not set"))?;

        let store_url = std::env::var("STORE_URL")
            .map_err(|_| anyhow::anyhow!("STORE_URL environment variable not set"))?;

        let batch_size = std::env::var("BATCH_SIZE")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(5);

        let poll_interval = std::env::var("POLL_INTERVAL")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(2));

        let backoff_interval = std::env::var("BACKOFF_INTERVAL")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(5));

        let job_deadline = std::env::var("JOB_DEADLINE")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(60));

        let max_parallel_jobs = std::env::var("MAX_PARALLEL_JOBS")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(2);

        let interpreter = std::env::var("INTERPRETER").unwrap_or_else(|_| "python3".to_string());

        let scratch_dir = std::env::var("SCRATCH_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| std::env::temp_dir());

        Ok(Self {
            worker_id,
            store_url,
            batch_size,
            poll_interval,
            backoff_interval,
            job_deadline,
            max_parallel_jobs,
            interpreter,
            scratch_dir,
        })
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.worker_id.is_empty() {
            anyhow::bail!("worker_id cannot be empty");
        }

        if self.store_url.is_empty() {
            anyhow::bail!("store_url cannot be empty");
        }

        if !self.store_url.starts_with("http://") && !self.store_url.starts_with("https://") {
            anyhow::bail!("store_url must start with http:// or https://");
        }

        if self.batch_size == 0 {
            anyhow::bail!("batch_size must be greater than 0");
        }

        if self.poll_interval.as_secs() == 0 {
            anyhow::bail!("poll_interval must be greater than 0");
        }

        if self.backoff_interval.as_secs() == 0 {
            anyhow::bail!("backoff_interval must be greater than 0");
        }

        if self.job_deadline.as_millis() == 0 {
            anyhow::bail!("job_deadline must be greater than 0");
        }

        if self.max_parallel_jobs == 0 {
            anyhow::bail!("max_parallel_jobs must be greater than 0");
        }

        if self.interpreter.is_empty() {
            anyhow::bail!("interpreter cannot be empty");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(
            uuid::Uuid::new_v4().to_string(),
            "http://localhost:8080".to_string(),
        )
    }
}
