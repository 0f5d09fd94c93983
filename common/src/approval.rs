//! Approval state machine and queue grouping.
//!
//! A version moves `PENDENTE -> OFICIAL` on approval or
//! `PENDENTE -> REJEITADO` on rejection (which needs a reason). Nothing leaves
//! `OFICIAL`, `REJEITADO` or `OBSOLETO`.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::error::ValidationError;
use crate::model::module::Module;
use crate::model::record::{PendingRecord, RecordStatus};

/// Default number of ids sent per bulk review call.
pub const DEFAULT_CHUNK_SIZE: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum ReviewDecision {
    Approve,
    Reject { reason: String },
}

impl ReviewDecision {
    /// Rejections must carry a non-blank reason.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            ReviewDecision::Reject { reason } if reason.trim().is_empty() => {
                Err(ValidationError::EmptyRejectionReason)
            }
            _ => Ok(()),
        }
    }

    pub fn target_status(&self) -> RecordStatus {
        match self {
            ReviewDecision::Approve => RecordStatus::Official,
            ReviewDecision::Reject { .. } => RecordStatus::Rejected,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("Registro já revisado ({0})")]
    AlreadyReviewed(RecordStatus),
    #[error("Registro não está aguardando aprovação ({0})")]
    NotPending(RecordStatus),
}

/// Applies `decision` to a version currently in `current`.
pub fn transition(current: RecordStatus, decision: &ReviewDecision) -> Result<RecordStatus, TransitionError> {
    match current {
        RecordStatus::Pending => Ok(decision.target_status()),
        s if s.is_terminal() => Err(TransitionError::AlreadyReviewed(s)),
        s => Err(TransitionError::NotPending(s)),
    }
}

/// Versions imported together, reviewed as a unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchGroup {
    pub batch_id: Uuid,
    pub module: Module,
    pub records: Vec<PendingRecord>,
}

impl BatchGroup {
    pub fn version_ids(&self) -> Vec<Uuid> {
        self.records.iter().map(|r| r.version.id).collect()
    }
}

/// One card in the approval queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ApprovalItem {
    Batch(BatchGroup),
    Single(PendingRecord),
}

impl ApprovalItem {
    pub fn version_ids(&self) -> Vec<Uuid> {
        match self {
            ApprovalItem::Batch(group) => group.version_ids(),
            ApprovalItem::Single(record) => vec![record.version.id],
        }
    }
}

/// Groups pending versions sharing a batch id; everything else stays a
/// single card. Cards appear in the order their first version was seen.
pub fn group_pending(records: Vec<PendingRecord>) -> Vec<ApprovalItem> {
    let mut items: Vec<ApprovalItem> = Vec::new();
    for record in records {
        match record.version.batch_id() {
            Some(batch_id) => {
                let existing = items.iter_mut().find_map(|item| match item {
                    ApprovalItem::Batch(group) if group.batch_id == batch_id => Some(group),
                    _ => None,
                });
                match existing {
                    Some(group) => group.records.push(record),
                    None => items.push(ApprovalItem::Batch(BatchGroup {
                        batch_id,
                        module: record.module.clone(),
                        records: vec![record],
                    })),
                }
            }
            None => items.push(ApprovalItem::Single(record)),
        }
    }
    items
}

/// Outcome of a bulk review that ran to completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkOutcome {
    pub total: usize,
    /// Ids submitted in chunks the platform accepted. This is not the number
    /// of versions that changed: ids that were unknown or no longer
    /// `PENDENTE` are skipped by the status filter and still counted here.
    pub succeeded: usize,
}

/// Number of ids confirmed before chunk `failed_chunk` (zero-based) failed.
pub fn succeeded_before(failed_chunk: usize, chunk_size: usize, total: usize) -> usize {
    (failed_chunk * chunk_size).min(total)
}
