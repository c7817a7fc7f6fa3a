use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;

use crate::error::{JobQueueError, Result};
use crate::scheduler::job::{Job, JobStatus};

/// In-memory status table shared between the pool and its callers.
///
/// Cloning the store yields another handle to the same table. Reads
/// (`get`, `list`) share the lock; writes (`save`, `update_status`) hold it
/// exclusively for a single map mutation. Records never leave the table by
/// reference: every read hands back an owned copy.
#[derive(Debug, Clone, Default)]
pub struct JobStore {
    jobs: Arc<RwLock<HashMap<String, Job>>>,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a job, replacing any record that already uses the same id.
    pub async fn save(&self, job: Job) {
        self.jobs.write().await.insert(job.id.clone(), job);
    }

    /// Get a copy of a job by ID
    pub async fn get(&self, id: &str) -> Option<Job> {
        self.jobs.read().await.get(id).cloned()
    }

    /// Move a job to `status`, replacing its error text and bumping
    /// `updated_at`.
    ///
    /// Fails with [`JobQueueError::NotFound`] for unknown ids and with
    /// [`JobQueueError::InvalidTransition`] when the move would go backwards
    /// or leave a terminal state; the record is untouched in both cases.
    pub async fn update_status(
        &self,
        id: &str,
        status: JobStatus,
        error: Option<String>,
    ) -> Result<()> {
        let mut jobs = self.jobs.write().await;
        let job = jobs
            .get_mut(id)
            .ok_or_else(|| JobQueueError::NotFound(id.to_string()))?;

        if !job.status.can_transition_to(status) {
            return Err(JobQueueError::InvalidTransition {
                id: id.to_string(),
                from: job.status,
                to: status,
            });
        }

        job.status = status;
        job.error = error;
        job.updated_at = Utc::now();
        Ok(())
    }

    /// Snapshot of every job, oldest first.
    pub async fn list(&self) -> Vec<Job> {
        let mut jobs: Vec<Job> = self.jobs.read().await.values().cloned().collect();
        jobs.sort_by_key(|j| j.created_at);
        jobs
    }

    /// Number of jobs currently in the given status.
    pub async fn count_by_status(&self, status: JobStatus) -> usize {
        self.jobs
            .read()
            .await
            .values()
            .filter(|j| j.status == status)
            .count()
    }

    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }
}
