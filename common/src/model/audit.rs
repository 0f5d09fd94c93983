use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Login,
    Create,
    Edit,
    Delete,
    Approve,
    Reject,
    Export,
    Import,
    Disable,
}

/// Append-only audit trail row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: Uuid,
    #[serde(rename = "usuario_id")]
    pub actor_id: Option<Uuid>,
    #[serde(rename = "acao")]
    pub action: AuditAction,
    #[serde(rename = "tabela")]
    pub target_table: String,
    #[serde(rename = "registro_id", default)]
    pub target_id: Option<Uuid>,
    #[serde(rename = "dados_antes", default)]
    pub before: Option<Value>,
    #[serde(rename = "dados_depois", default)]
    pub after: Option<Value>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub ip: Option<String>,
}

impl AuditLogEntry {
    pub fn new(actor_id: Option<Uuid>, action: AuditAction, target_table: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            actor_id,
            action,
            target_table: target_table.to_string(),
            target_id: None,
            before: None,
            after: None,
            created_at: Utc::now(),
            ip: None,
        }
    }

    pub fn target(mut self, id: Uuid) -> Self {
        self.target_id = Some(id);
        self
    }

    pub fn before(mut self, snapshot: Value) -> Self {
        self.before = Some(snapshot);
        self
    }

    pub fn after(mut self, snapshot: Value) -> Self {
        self.after = Some(snapshot);
        self
    }

    pub fn ip(mut self, ip: Option<String>) -> Self {
        self.ip = ip;
        self
    }
}
