//! Request and response bodies shared by the backend routes and the
//! frontend client.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::approval::ApprovalItem;
use crate::model::catalog::CatalogItem;
use crate::model::category::Category;
use crate::model::field::{FieldDefinition, FieldDraft, FieldOption};
use crate::model::module::Module;
use crate::model::permission::Permission;
use crate::model::profile::Role;
use crate::model::record::CurrentRecord;
use crate::reconcile::infer::ColumnCheck;
use crate::reconcile::mapping::ColumnMapping;
use crate::reconcile::parse::ParsedCsv;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    #[serde(rename = "nome")]
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub user_id: Uuid,
}

/// Resolved session of the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionInfo {
    Ready { user_id: Uuid, role: Role, name: String },
    /// The profile lookup timed out; the caller runs with `role` (read-only).
    Degraded { user_id: Uuid, role: Role },
}

impl SessionInfo {
    pub fn role(&self) -> Role {
        match self {
            SessionInfo::Ready { role, .. } | SessionInfo::Degraded { role, .. } => *role,
        }
    }

    pub fn user_id(&self) -> Uuid {
        match self {
            SessionInfo::Ready { user_id, .. } | SessionInfo::Degraded { user_id, .. } => *user_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateModuleRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category_id: Option<Uuid>,
    #[serde(default)]
    pub fields: Vec<FieldDraft>,
}

/// Partial change to a field. Absent members are left as they are.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateFieldRequest {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub required: Option<bool>,
    #[serde(default)]
    pub order: Option<i32>,
    #[serde(default)]
    pub options: Option<Vec<FieldOption>>,
    #[serde(default)]
    pub mask: Option<String>,
}

/// A module with everything needed to render its forms and tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleDetail {
    pub module: Module,
    /// Ordered.
    pub fields: Vec<FieldDefinition>,
    /// Options of catalog and module reference fields, keyed by field
    /// technical name. Fields missing here fall back to free text.
    pub options: std::collections::HashMap<String, Vec<FieldOption>>,
    pub can_insert: bool,
    pub can_edit: bool,
    pub can_delete: bool,
    pub can_export: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveRecordRequest {
    pub content: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordPage {
    pub records: Vec<CurrentRecord>,
    pub page: u32,
    pub page_size: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingResponse {
    pub items: Vec<ApprovalItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApproveRequest {
    pub version_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RejectRequest {
    pub version_ids: Vec<Uuid>,
    pub reason: String,
}

/// Parsed upload with the inferred schema and a suggested mapping against
/// the target module.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsvPreview {
    pub file_name: String,
    pub csv: ParsedCsv,
    pub columns: Vec<ColumnCheck>,
    pub mappings: Vec<ColumnMapping>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportRequest {
    pub module_id: Uuid,
    pub file_name: String,
    pub csv: ParsedCsv,
    pub mappings: Vec<ColumnMapping>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportRequest {
    pub module_id: Uuid,
    /// Technical names of the exported fields. Empty exports every field.
    #[serde(default)]
    pub fields: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogItemsResponse {
    pub items: Vec<CatalogItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoriesResponse {
    pub categories: Vec<Category>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionsResponse {
    pub permissions: Vec<Permission>,
}

/// Error body returned by every failing route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn session_info_is_tagged() {
        let info = SessionInfo::Degraded {
            user_id: Uuid::nil(),
            role: Role::ReadOnly,
        };
        let value = serde_json::to_value(&info).unwrap();
        assert_eq!(value["state"], json!("degraded"));
        assert_eq!(value["role"], json!("consulta"));
        assert_eq!(info.role(), Role::ReadOnly);
    }

    #[test]
    fn update_field_request_is_partial() {
        let req: UpdateFieldRequest = serde_json::from_value(json!({ "label": "Nome completo" })).unwrap();
        assert_eq!(req.label.as_deref(), Some("Nome completo"));
        assert!(req.required.is_none() && req.order.is_none());
    }
}
