use std::sync::Arc;
use std::time::Duration;

use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::config::PoolConfig;
use crate::error::Result;
use crate::scheduler::{DispatchQueue, JobStatus, JobStore};
use crate::worker::executor::{TaskError, TaskExecutor};

/// Fixed set of workers draining a bounded [`DispatchQueue`].
///
/// Workers are spawned on the current Tokio runtime as soon as the pool is
/// built. Each dequeued job is moved to `running`, executed on its own task
/// and raced against `job_timeout`; the outcome is written back through
/// [`JobStore::update_status`]. The pool only ever holds job ids, never the
/// records themselves.
#[derive(Debug)]
pub struct WorkerPool {
    queue: Arc<DispatchQueue>,
    store: JobStore,
    config: PoolConfig,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Validate `config` and start `config.num_workers` workers.
    ///
    /// # Errors
    ///
    /// Returns [`JobQueueError::InvalidConfig`](crate::error::JobQueueError::InvalidConfig)
    /// for a zero worker count or a zero deadline. Nothing is spawned in that case.
    ///
    /// # Panics
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(
        store: JobStore,
        config: PoolConfig,
        executor: Arc<dyn TaskExecutor>,
    ) -> Result<Self> {
        config.validate()?;

        let queue = Arc::new(DispatchQueue::new(config.queue_capacity));
        let workers = (1..=config.num_workers)
            .map(|id| {
                let worker = Worker {
                    id,
                    queue: queue.clone(),
                    store: store.clone(),
                    executor: executor.clone(),
                    job_timeout: config.job_timeout,
                };
                tokio::spawn(worker.run())
            })
            .collect();

        tracing::info!(
            num_workers = config.num_workers,
            queue_capacity = config.queue_capacity,
            job_timeout = ?config.job_timeout,
            "Worker pool started"
        );

        Ok(Self {
            queue,
            store,
            config,
            workers,
        })
    }

    /// Hand a job id to the pool without waiting.
    ///
    /// Returns false when the queue is full. The job's record is left
    /// exactly as it was; marking a rejected job is up to the caller.
    pub fn submit(&self, job_id: impl Into<String>) -> bool {
        let job_id = job_id.into();
        if self.queue.try_push(job_id.clone()) {
            tracing::debug!(job_id = %job_id, queued = self.queue.len(), "Job submitted");
            true
        } else {
            tracing::warn!(job_id = %job_id, "Job queue full, submission rejected");
            false
        }
    }

    /// Graceful shutdown: stop accepting ids, let the workers drain whatever
    /// is already queued, and wait for all of them to exit.
    ///
    /// Executors abandoned after a deadline are not waited for.
    pub async fn stop(self) {
        tracing::info!(pending = self.queue.len(), "Shutting down worker pool");
        self.queue.close();

        for handle in self.workers {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "Worker task ended abnormally");
            }
        }

        tracing::info!("All workers stopped");
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    pub fn store(&self) -> &JobStore {
        &self.store
    }

    /// Number of ids waiting for a worker.
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }
}

struct Worker {
    id: usize,
    queue: Arc<DispatchQueue>,
    store: JobStore,
    executor: Arc<dyn TaskExecutor>,
    job_timeout: Duration,
}

impl Worker {
    async fn run(self) {
        while let Some(job_id) = self.queue.pop().await {
            self.process_job(job_id).await;
        }
        tracing::info!(worker_id = self.id, "Worker stopped");
    }

    async fn process_job(&self, job_id: String) {
        if let Err(e) = self
            .store
            .update_status(&job_id, JobStatus::Running, None)
            .await
        {
            tracing::warn!(worker_id = self.id, job_id = %job_id, error = %e, "Skipping job");
            return;
        }
        tracing::info!(worker_id = self.id, job_id = %job_id, "Processing job");

        // The deadline starts now, once the job is running.
        let deadline = tokio::time::sleep(self.job_timeout);
        let cancel = CancellationToken::new();
        let task = {
            let executor = self.executor.clone();
            let job_id = job_id.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move { executor.execute(job_id, cancel).await })
        };

        // Dropping the JoinHandle on the deadline branch detaches the task
        // rather than aborting it.
        let (status, error) = tokio::select! {
            joined = task => match joined {
                Ok(Ok(())) => (JobStatus::Completed, None),
                Ok(Err(e)) => (JobStatus::Failed, Some(e.to_string())),
                Err(e) => (JobStatus::Failed, Some(TaskError::Panicked(panic_message(e)).to_string())),
            },
            _ = deadline => {
                cancel.cancel();
                (
                    JobStatus::Cancelled,
                    Some(format!("deadline exceeded after {:?}", self.job_timeout)),
                )
            }
        };

        match status {
            JobStatus::Completed => {
                tracing::info!(worker_id = self.id, job_id = %job_id, "Job completed");
            }
            JobStatus::Cancelled => {
                tracing::warn!(worker_id = self.id, job_id = %job_id, timeout = ?self.job_timeout, "Job cancelled");
            }
            _ => {
                tracing::info!(worker_id = self.id, job_id = %job_id, error = ?error, "Job failed");
            }
        }

        if let Err(e) = self.store.update_status(&job_id, status, error).await {
            tracing::warn!(
                worker_id = self.id,
                job_id = %job_id,
                status = %status,
                error = %e,
                "Failed to record job outcome"
            );
        }
    }
}

/// The message an executor panicked with, or the join error itself if the
/// task did not panic.
fn panic_message(err: JoinError) -> String {
    match err.try_into_panic() {
        Ok(payload) => payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string()),
        Err(err) => err.to_string(),
    }
}
