use common::model::audit::AuditLogEntry;
use common::model::tables;
use log::error;

use super::RecordStore;

impl RecordStore {
    /// Appends an audit entry. A failed write is logged and otherwise
    /// ignored; it never fails the operation being audited.
    pub async fn audit(&self, entry: AuditLogEntry) {
        let row = match serde_json::to_value(&entry) {
            Ok(row) => row,
            Err(e) => {
                error!("could not serialize audit entry: {}", e);
                return;
            }
        };
        if let Err(e) = self.platform.insert(tables::AUDIT_LOG, vec![row]).await {
            error!(
                "audit write failed ({:?} on {}): {}",
                entry.action, entry.target_table, e
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::{actor, sqlite};
    use super::*;
    use crate::platform::Query;
    use common::model::audit::AuditAction;
    use common::model::profile::Role;
    use serde_json::json;
    use std::sync::Arc;
    use uuid::Uuid;

    #[tokio::test]
    async fn writes_entries_with_snapshots() {
        let platform = Arc::new(sqlite());
        let store = RecordStore::new(platform.clone());
        let admin = actor(Role::Admin);
        let target = Uuid::new_v4();
        store
            .audit(
                admin
                    .audit(AuditAction::Approve, tables::RECORD_VERSIONS)
                    .target(target)
                    .after(json!({ "status": "OFICIAL" })),
            )
            .await;

        let rows = store
            .platform()
            .select(&Query::table(tables::AUDIT_LOG))
            .await
            .unwrap();
        let entries: Vec<AuditLogEntry> = crate::platform::decode(rows).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, AuditAction::Approve);
        assert_eq!(entries[0].target_id, Some(target));
        assert_eq!(entries[0].after, Some(json!({ "status": "OFICIAL" })));
        assert_eq!(entries[0].ip.as_deref(), Some("127.0.0.1"));
    }
}
