use serde::{Deserialize, Serialize};

/// Progress of a background job as reported by the status endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    Pending,
    /// Rows processed so far.
    InProgress(u32),
    Completed(String),
    Failed(String),
}

impl JobStatus {
    pub fn is_finished(&self) -> bool {
        matches!(self, JobStatus::Completed(_) | JobStatus::Failed(_))
    }
}

/// Answer of an endpoint that started a job.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JobStarted {
    pub job_id: String,
}
