use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An administrator-defined dynamic table.
///
/// Modules are soft-disabled through `active`; hard deletion only happens by
/// cascading from the owning [`Category`](super::category::Category).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub id: Uuid,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "descricao", default)]
    pub description: Option<String>,
    #[serde(rename = "ativo")]
    pub active: bool,
    #[serde(rename = "criado_por", default)]
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    #[serde(rename = "categoria_id", default)]
    pub category_id: Option<Uuid>,
}
