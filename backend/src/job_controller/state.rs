//! State of long-running background jobs.
//!
//! A CSV import runs outside the request that started it. The request
//! registers a job id and returns it at once; the worker reports progress by
//! sending [`JobUpdate`] messages, and [`start_job_updater`] applies them to
//! the shared map the status endpoint reads from.

use common::jobs::JobStatus;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

/// Shared job registry, stored in the application state.
#[derive(Clone)]
pub struct JobsState {
    /// Current status of every job, keyed by job id.
    pub jobs: Arc<RwLock<HashMap<String, JobStatus>>>,

    /// Workers push updates here instead of locking `jobs` themselves.
    pub tx: mpsc::Sender<JobUpdate>,
}

#[derive(Debug)]
pub struct JobUpdate {
    pub(crate) job_id: String,
    pub(crate) status: JobStatus,
}

impl JobsState {
    /// Creates the registry and the receiving end for [`start_job_updater`].
    pub fn new() -> (Self, mpsc::Receiver<JobUpdate>) {
        let (tx, rx) = mpsc::channel(100);
        let state = JobsState {
            jobs: Arc::new(RwLock::new(HashMap::new())),
            tx,
        };
        (state, rx)
    }

    /// Registers a new job as `Pending` and returns its id.
    pub async fn register(&self) -> String {
        let job_id = Uuid::new_v4().to_string();
        self.jobs.write().await.insert(job_id.clone(), JobStatus::Pending);
        job_id
    }

    pub async fn status(&self, job_id: &str) -> Option<JobStatus> {
        self.jobs.read().await.get(job_id).cloned()
    }

    /// A reporter bound to one job.
    pub fn reporter(&self, job_id: &str) -> JobReporter {
        JobReporter {
            job_id: job_id.to_string(),
            tx: self.tx.clone(),
        }
    }
}

/// Sends status updates for a single job.
#[derive(Clone)]
pub struct JobReporter {
    job_id: String,
    tx: mpsc::Sender<JobUpdate>,
}

impl JobReporter {
    pub async fn report(&self, status: JobStatus) {
        let update = JobUpdate {
            job_id: self.job_id.clone(),
            status,
        };
        if self.tx.send(update).await.is_err() {
            log::warn!("job updater is gone, dropping update for {}", self.job_id);
        }
    }
}

/// Applies job updates to the shared registry until every sender is gone.
pub async fn start_job_updater(state: JobsState, mut rx: mpsc::Receiver<JobUpdate>) {
    while let Some(update) = rx.recv().await {
        let mut jobs = state.jobs.write().await;
        jobs.insert(update.job_id.clone(), update.status);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn updates_reach_the_registry() {
        let (state, rx) = JobsState::new();
        tokio::spawn(start_job_updater(state.clone(), rx));

        let job_id = state.register().await;
        assert_eq!(state.status(&job_id).await, Some(JobStatus::Pending));

        let reporter = state.reporter(&job_id);
        reporter.report(JobStatus::InProgress(10)).await;
        reporter.report(JobStatus::Completed("10 registros importados".into())).await;

        for _ in 0..50 {
            if state.status(&job_id).await.is_some_and(|s| s.is_finished()) {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        assert_eq!(
            state.status(&job_id).await,
            Some(JobStatus::Completed("10 registros importados".into()))
        );
        assert_eq!(state.status("unknown").await, None);
    }
}
