use common::model::audit::AuditAction;
use common::model::permission::Permission;
use common::model::tables;
use serde_json::json;
use uuid::Uuid;

use super::{Actor, RecordStore};
use crate::error::AppError;
use crate::platform::{Filter, PlatformError, Query};

impl RecordStore {
    pub async fn permission_for(&self, user_id: Uuid, module_id: Uuid) -> Result<Option<Permission>, AppError> {
        let query = Query::table(tables::PERMISSIONS)
            .filter(Filter::eq("usuario_id", user_id.to_string()))
            .filter(Filter::eq("modulo_id", module_id.to_string()));
        Ok(self.fetch(&query).await?.into_iter().next())
    }

    pub async fn list_permissions(&self, module_id: Uuid) -> Result<Vec<Permission>, AppError> {
        let query = Query::table(tables::PERMISSIONS).filter(Filter::eq("modulo_id", module_id.to_string()));
        self.fetch(&query).await
    }

    /// Replaces the permission row of `(user, module)`.
    pub async fn upsert_permission(&self, actor: &Actor, permission: Permission) -> Result<Permission, AppError> {
        let key = [
            Filter::eq("usuario_id", permission.user_id.to_string()),
            Filter::eq("modulo_id", permission.module_id.to_string()),
        ];
        let before = self.permission_for(permission.user_id, permission.module_id).await?;
        self.platform.delete(tables::PERMISSIONS, &key).await?;
        let row = serde_json::to_value(&permission).map_err(PlatformError::from)?;
        let stored: Permission = self.insert_one(tables::PERMISSIONS, row).await?;

        self.audit(
            actor
                .audit(AuditAction::Edit, tables::PERMISSIONS)
                .target(permission.module_id)
                .before(json!(before))
                .after(json!(&stored)),
        )
        .await;
        Ok(stored)
    }
}
