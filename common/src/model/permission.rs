use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Per-user, per-module capabilities. Administrators never consult this
/// table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    #[serde(rename = "usuario_id")]
    pub user_id: Uuid,
    #[serde(rename = "modulo_id")]
    pub module_id: Uuid,
    #[serde(rename = "pode_ver", default)]
    pub can_view: bool,
    #[serde(rename = "pode_inserir", default)]
    pub can_insert: bool,
    #[serde(rename = "pode_editar", default)]
    pub can_edit: bool,
    #[serde(rename = "pode_aprovar", default)]
    pub can_approve: bool,
    #[serde(rename = "pode_exportar", default)]
    pub can_export: bool,
}

impl Permission {
    pub fn none(user_id: Uuid, module_id: Uuid) -> Self {
        Self {
            user_id,
            module_id,
            can_view: false,
            can_insert: false,
            can_edit: false,
            can_approve: false,
            can_export: false,
        }
    }
}
