use thiserror::Error;

use crate::scheduler::JobStatus;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JobQueueError {
    #[error("Job queue is full, job {id} was rejected")]
    QueueFull { id: String },

    #[error("Job not found: {0}")]
    NotFound(String),

    #[error("Invalid status transition for job {id}: {from} -> {to}")]
    InvalidTransition {
        id: String,
        from: JobStatus,
        to: JobStatus,
    },

    #[error("Invalid pool configuration: {0}")]
    InvalidConfig(String),

    #[error("Task description must not be empty")]
    InvalidTask,
}

pub type Result<T> = std::result::Result<T, JobQueueError>;
