use std::sync::Arc;
use std::time::Duration;

use crate::config::PoolConfig;
use crate::error::{JobQueueError, Result};
use crate::scheduler::{Job, JobStatus, JobStore};
use crate::worker::{TaskExecutor, WorkerPool};

/// Error text recorded on a job the pool refused to queue.
pub const QUEUE_FULL_MESSAGE: &str = "queue is full";

/// Front door for callers that create and query jobs.
///
/// The pool never touches a record it rejected, so the service owns that
/// handoff: a job whose submission is refused is moved from `queued` to
/// `failed` with [`QUEUE_FULL_MESSAGE`] before the error is returned.
#[derive(Debug)]
pub struct JobService {
    store: JobStore,
    pool: WorkerPool,
}

impl JobService {
    /// Create an empty store and start a pool on it.
    pub fn start(config: PoolConfig, executor: Arc<dyn TaskExecutor>) -> Result<Self> {
        let store = JobStore::new();
        let pool = WorkerPool::new(store.clone(), config, executor)?;
        Ok(Self { store, pool })
    }

    /// Record a new queued job and submit it to the pool.
    ///
    /// # Errors
    ///
    /// - [`JobQueueError::InvalidTask`] if `task` is blank; nothing is stored.
    /// - [`JobQueueError::QueueFull`] if the pool rejected the job; the record
    ///   stays in the store with status `failed`.
    pub async fn create_job(&self, task: impl Into<String>) -> Result<Job> {
        let task = task.into();
        if task.trim().is_empty() {
            return Err(JobQueueError::InvalidTask);
        }

        let job = Job::new(task);
        self.store.save(job.clone()).await;

        if !self.pool.submit(job.id.clone()) {
            self.store
                .update_status(
                    &job.id,
                    JobStatus::Failed,
                    Some(QUEUE_FULL_MESSAGE.to_string()),
                )
                .await?;
            return Err(JobQueueError::QueueFull { id: job.id });
        }

        tracing::info!(job_id = %job.id, task = %job.task, "Job created");
        Ok(job)
    }

    pub async fn get_job(&self, id: &str) -> Result<Job> {
        self.store
            .get(id)
            .await
            .ok_or_else(|| JobQueueError::NotFound(id.to_string()))
    }

    pub async fn list_jobs(&self) -> Vec<Job> {
        self.store.list().await
    }

    /// Wait until no job is queued or running, checking every `poll`.
    pub async fn wait_idle(&self, poll: Duration) {
        let mut interval = tokio::time::interval(poll);
        loop {
            interval.tick().await;
            let queued = self.store.count_by_status(JobStatus::Queued).await;
            let running = self.store.count_by_status(JobStatus::Running).await;
            if queued == 0 && running == 0 {
                return;
            }
        }
    }

    pub fn store(&self) -> &JobStore {
        &self.store
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    /// Drain and stop the pool, handing back the store for final reporting.
    pub async fn shutdown(self) -> JobStore {
        self.pool.stop().await;
        self.store
    }
}
