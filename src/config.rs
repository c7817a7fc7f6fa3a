use std::time::Duration;

use crate::error::{JobQueueError, Result};

/// Sizing and deadline settings for a [`WorkerPool`](crate::worker::WorkerPool).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    /// Number of long-lived workers pulling from the queue. Must be at least 1.
    pub num_workers: usize,
    /// Maximum number of ids buffered while every worker is busy.
    pub queue_capacity: usize,
    /// Deadline for a single job, measured from the moment it starts running.
    pub job_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            num_workers: 3,
            queue_capacity: 100,
            job_timeout: Duration::from_secs(30),
        }
    }
}

impl PoolConfig {
    pub fn new(num_workers: usize, queue_capacity: usize, job_timeout: Duration) -> Self {
        Self {
            num_workers,
            queue_capacity,
            job_timeout,
        }
    }

    pub fn with_workers(mut self, num_workers: usize) -> Self {
        self.num_workers = num_workers;
        self
    }

    pub fn with_queue_capacity(mut self, queue_capacity: usize) -> Self {
        self.queue_capacity = queue_capacity;
        self
    }

    pub fn with_job_timeout(mut self, job_timeout: Duration) -> Self {
        self.job_timeout = job_timeout;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.num_workers == 0 {
            return Err(JobQueueError::InvalidConfig(
                "num_workers must be at least 1".to_string(),
            ));
        }
        if self.job_timeout.is_zero() {
            return Err(JobQueueError::InvalidConfig(
                "job_timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
