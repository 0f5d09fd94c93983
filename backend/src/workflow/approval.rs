use common::approval::{succeeded_before, transition, BulkOutcome, ReviewDecision};
use common::authz::Action;
use common::error::ValidationError;
use log::{debug, info};
use uuid::Uuid;

use crate::error::AppError;
use crate::store::{Actor, RecordStore};

/// Approves or rejects `version_ids`, `chunk_size` ids per call.
///
/// The actor's role is checked again here even though clients only offer the
/// action to reviewers. Chunks run sequentially; when one fails the rest are
/// skipped and the error carries the number of ids confirmed before it.
pub async fn review(
    store: &RecordStore,
    actor: &Actor,
    version_ids: Vec<Uuid>,
    decision: ReviewDecision,
    chunk_size: usize,
) -> Result<BulkOutcome, AppError> {
    let action = match decision {
        ReviewDecision::Approve => Action::Approve,
        ReviewDecision::Reject { .. } => Action::Reject,
    };
    store.authorize(actor, action, None).await?;
    decision.validate()?;
    if version_ids.is_empty() {
        return Err(ValidationError::EmptySelection.into());
    }
    if let [single] = version_ids.as_slice() {
        let version = store.get_version(*single).await?;
        transition(version.status, &decision)?;
    }

    let total = version_ids.len();
    let chunk_size = chunk_size.max(1);
    for (index, chunk) in version_ids.chunks(chunk_size).enumerate() {
        if let Err(cause) = store.review_chunk(actor, chunk, &decision).await {
            return Err(AppError::PartialBatchFailure {
                succeeded: succeeded_before(index, chunk_size, total),
                total,
                cause: Box::new(cause),
            });
        }
        debug!("review chunk {} ({} ids) applied", index + 1, chunk.len());
    }

    info!(
        "{} versions moved to {} by {}",
        total,
        decision.target_status(),
        actor.user_id
    );
    Ok(BulkOutcome {
        total,
        succeeded: total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::testing::FlakyPlatform;
    use crate::platform::DataPlatform;
    use crate::store::testing::{actor, module, sqlite};
    use common::model::permission::Permission;
    use common::model::profile::Role;
    use common::model::record::RecordStatus;
    use serde_json::{json, Map};
    use std::sync::Arc;

    fn ids(n: usize) -> Vec<Uuid> {
        (0..n).map(|_| Uuid::new_v4()).collect()
    }

    #[tokio::test]
    async fn issues_one_call_per_chunk() {
        let flaky = Arc::new(FlakyPlatform::failing_update(Arc::new(sqlite()), 0));
        let store = RecordStore::new(flaky.clone());
        let outcome = review(&store, &actor(Role::Supervisor), ids(120), ReviewDecision::Approve, 50)
            .await
            .unwrap();
        assert_eq!(outcome, BulkOutcome { total: 120, succeeded: 120 });
        assert_eq!(flaky.update_calls(), 3);
    }

    #[tokio::test]
    async fn failure_reports_ids_confirmed_before_it() {
        for (failing_chunk, expected) in [(1, 0), (2, 50), (3, 100)] {
            let flaky = Arc::new(FlakyPlatform::failing_update(Arc::new(sqlite()), failing_chunk));
            let store = RecordStore::new(flaky.clone());
            let err = review(&store, &actor(Role::Admin), ids(120), ReviewDecision::Approve, 50)
                .await
                .unwrap_err();
            match err {
                AppError::PartialBatchFailure { succeeded, total, .. } => {
                    assert_eq!(succeeded, expected);
                    assert_eq!(total, 120);
                }
                other => panic!("unexpected error {:?}", other),
            }
            // Fail-fast: no call after the failing one.
            assert_eq!(flaky.update_calls(), failing_chunk);
        }
    }

    #[tokio::test]
    async fn employees_cannot_review() {
        let flaky = Arc::new(FlakyPlatform::failing_update(Arc::new(sqlite()), 0));
        let store = RecordStore::new(flaky.clone());
        let err = review(&store, &actor(Role::Employee), ids(3), ReviewDecision::Approve, 50)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
        assert_eq!(flaky.update_calls(), 0);
    }

    #[tokio::test]
    async fn rejection_without_reason_never_reaches_the_platform() {
        let flaky = Arc::new(FlakyPlatform::failing_update(Arc::new(sqlite()), 0));
        let store = RecordStore::new(flaky.clone());
        let decision = ReviewDecision::Reject { reason: " ".into() };
        let err = review(&store, &actor(Role::Admin), ids(2), decision, 50)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        let err = review(&store, &actor(Role::Admin), Vec::new(), ReviewDecision::Approve, 50)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(flaky.update_calls(), 0);
    }

    #[tokio::test]
    async fn bulk_outcome_counts_submitted_ids() {
        let store = RecordStore::new(Arc::new(sqlite()));
        let module = module(&store).await;
        let admin = actor(Role::Admin);
        let mut content = Map::new();
        content.insert("nome".into(), json!("João"));
        let official = store.create_record(&admin, module.id, content).await.unwrap();

        let submitted = vec![official.version.id, Uuid::new_v4()];
        let outcome = review(&store, &admin, submitted, ReviewDecision::Reject { reason: "x".into() }, 50)
            .await
            .unwrap();
        assert_eq!(outcome, BulkOutcome { total: 2, succeeded: 2 });
        let untouched = store.get_version(official.version.id).await.unwrap();
        assert_eq!(untouched.status, RecordStatus::Official);
    }

    #[tokio::test]
    async fn approving_twice_is_a_conflict() {
        let platform: Arc<dyn DataPlatform> = Arc::new(sqlite());
        let store = RecordStore::new(platform);
        let module = module(&store).await;
        let admin = actor(Role::Admin);
        let employee = actor(Role::Employee);
        let mut permission = Permission::none(employee.user_id, module.id);
        permission.can_view = true;
        permission.can_insert = true;
        store.upsert_permission(&admin, permission).await.unwrap();

        let mut content = Map::new();
        content.insert("nome".into(), json!("Maria"));
        let record = store.create_record(&employee, module.id, content).await.unwrap();

        review(&store, &admin, vec![record.version.id], ReviewDecision::Approve, 50)
            .await
            .unwrap();
        assert_eq!(
            store.get_version(record.version.id).await.unwrap().status,
            RecordStatus::Official
        );

        let again = review(&store, &admin, vec![record.version.id], ReviewDecision::Approve, 50)
            .await
            .unwrap_err();
        assert!(matches!(again, AppError::InvalidTransition(_)));
    }
}
