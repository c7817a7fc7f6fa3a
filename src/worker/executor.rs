use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Why a task did not finish successfully. The `Display` text is what ends
/// up in the job's error field.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    #[error("{0}")]
    Failed(String),

    #[error("cancelled: {0}")]
    Cancelled(String),

    #[error("task panicked: {0}")]
    Panicked(String),
}

/// The unit of work a worker runs for each job.
///
/// The pool spawns `execute` on its own task and races it against the job
/// deadline. When the deadline wins, `cancel` is triggered and the future is
/// left to finish on its own; its result is discarded. Implementations that
/// hold on to expensive resources should watch `cancel` and bail out early.
#[async_trait]
pub trait TaskExecutor: Send + Sync + 'static {
    async fn execute(&self, job_id: String, cancel: CancellationToken) -> Result<(), TaskError>;
}

/// Stand-in workload: sleeps for `base + (len(job_id) % 3) * step`, or stops
/// early with [`TaskError::Cancelled`] when the token fires.
#[derive(Debug, Clone)]
pub struct SimulatedExecutor {
    base: Duration,
    step: Duration,
}

impl Default for SimulatedExecutor {
    fn default() -> Self {
        Self::new(Duration::from_secs(2), Duration::from_secs(1))
    }
}

impl SimulatedExecutor {
    pub fn new(base: Duration, step: Duration) -> Self {
        Self { base, step }
    }

    /// How long the simulated work for `job_id` takes.
    pub fn duration_for(&self, job_id: &str) -> Duration {
        self.base + self.step * (job_id.len() % 3) as u32
    }
}

#[async_trait]
impl TaskExecutor for SimulatedExecutor {
    async fn execute(&self, job_id: String, cancel: CancellationToken) -> Result<(), TaskError> {
        let work = self.duration_for(&job_id);
        tracing::debug!(job_id = %job_id, duration = ?work, "Simulating work");

        tokio::select! {
            _ = tokio::time::sleep(work) => Ok(()),
            _ = cancel.cancelled() => {
                Err(TaskError::Cancelled("deadline exceeded".to_string()))
            }
        }
    }
}

/// Adapts an async closure into a [`TaskExecutor`].
///
/// ```
/// use jobqueue::worker::{CancellationToken, FnExecutor, TaskError};
///
/// let executor = FnExecutor::new(|job_id: String, _cancel: CancellationToken| async move {
///     if job_id.starts_with("bad") {
///         Err(TaskError::Failed(format!("cannot process {job_id}")))
///     } else {
///         Ok(())
///     }
/// });
/// # let _ = executor;
/// ```
pub struct FnExecutor<F> {
    f: F,
}

impl<F> FnExecutor<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> std::fmt::Debug for FnExecutor<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnExecutor").finish_non_exhaustive()
    }
}

#[async_trait]
impl<F, Fut> TaskExecutor for FnExecutor<F>
where
    F: Fn(String, CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
{
    async fn execute(&self, job_id: String, cancel: CancellationToken) -> Result<(), TaskError> {
        (self.f)(job_id, cancel).await
    }
}
