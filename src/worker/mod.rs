//! Worker pool and task execution.
//!
//! - **Pool**: a fixed number of workers pulling job ids from a bounded queue
//! - **Executor**: the pluggable work a worker runs for each job
//!
//! # Components
//!
//! - [`WorkerPool`]: spawns workers, accepts submissions, drains on stop
//! - [`TaskExecutor`]: trait implemented by the work to run per job
//! - [`SimulatedExecutor`]: sleeps for a job-dependent duration
//! - [`FnExecutor`]: wraps an async closure
//!
//! # Execution Flow
//!
//! 1. A worker pops the next id from the queue (FIFO)
//! 2. The job is marked `running` in the [`JobStore`](crate::scheduler::JobStore)
//! 3. [`TaskExecutor::execute`] runs on its own task, racing the job deadline
//! 4. The job ends `completed`, `failed` or `cancelled`
//!
//! # Deadlines
//!
//! A deadline only affects bookkeeping. The executor's cancellation token is
//! triggered but the task is never aborted, so work that ignores the token
//! keeps running in the background after its job is marked `cancelled`.

pub mod executor;
pub mod pool;

pub use executor::{FnExecutor, SimulatedExecutor, TaskError, TaskExecutor};
pub use pool::WorkerPool;
pub use tokio_util::sync::CancellationToken;
