use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use uuid::Uuid;

use super::module::Module;

/// Key of the legacy batch marker embedded in version content. New rows also
/// carry the batch in `RecordVersion::import_batch_id`.
pub const BATCH_MARKER: &str = "_lote_id";

/// Approval status of a version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordStatus {
    #[serde(rename = "RASCUNHO")]
    Draft,
    #[serde(rename = "PENDENTE")]
    Pending,
    #[serde(rename = "OFICIAL")]
    Official,
    #[serde(rename = "REJEITADO")]
    Rejected,
    #[serde(rename = "OBSOLETO")]
    Obsolete,
}

impl RecordStatus {
    /// Value stored in the `status` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordStatus::Draft => "RASCUNHO",
            RecordStatus::Pending => "PENDENTE",
            RecordStatus::Official => "OFICIAL",
            RecordStatus::Rejected => "REJEITADO",
            RecordStatus::Obsolete => "OBSOLETO",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RecordStatus::Draft => "Rascunho",
            RecordStatus::Pending => "Pendente",
            RecordStatus::Official => "Oficial",
            RecordStatus::Rejected => "Rejeitado",
            RecordStatus::Obsolete => "Obsoleto",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RecordStatus::Official | RecordStatus::Rejected | RecordStatus::Obsolete
        )
    }
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable identity of one logical row. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MasterRecord {
    pub id: Uuid,
    #[serde(rename = "modulo_id")]
    pub module_id: Uuid,
    #[serde(rename = "uuid_externo")]
    pub external_id: Uuid,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// One snapshot of a master record's content plus its approval state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordVersion {
    pub id: Uuid,
    #[serde(rename = "registro_mestre_id")]
    pub master_id: Uuid,
    #[serde(rename = "versao")]
    pub version: i32,
    #[serde(rename = "conteudo")]
    pub content: Map<String, Value>,
    pub status: RecordStatus,
    pub is_atual: bool,
    #[serde(rename = "criado_por", default)]
    pub created_by: Option<Uuid>,
    #[serde(rename = "revisado_por", default)]
    pub reviewed_by: Option<Uuid>,
    #[serde(rename = "revisado_em", default)]
    pub reviewed_at: Option<DateTime<Utc>>,
    #[serde(rename = "motivo_rejeicao", default)]
    pub rejection_reason: Option<String>,
    #[serde(rename = "lote_importacao_id", default)]
    pub import_batch_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl RecordVersion {
    /// Batch this version was imported with, preferring the explicit column
    /// and falling back to the marker older imports wrote into the content.
    pub fn batch_id(&self) -> Option<Uuid> {
        self.import_batch_id.or_else(|| {
            self.content
                .get(BATCH_MARKER)
                .and_then(Value::as_str)
                .and_then(|s| Uuid::parse_str(s).ok())
        })
    }
}

/// A current version joined with its master record, the shape returned by the
/// record listing query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentRecord {
    #[serde(flatten)]
    pub version: RecordVersion,
    #[serde(rename = "registros_mestre")]
    pub master: MasterRecord,
}

/// A pending version with enough context to render an approval card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingRecord {
    pub version: RecordVersion,
    pub module: Module,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn version_row() -> Value {
        json!({
            "id": "f0c9a3f4-2a8e-4f3e-9b4f-5f0c2b1a9d01",
            "registro_mestre_id": "a1b2c3d4-0000-4000-8000-000000000001",
            "versao": 1,
            "conteudo": { "nome": "Maria" },
            "status": "PENDENTE",
            "is_atual": true,
            "created_at": "2024-03-01T12:00:00Z"
        })
    }

    #[test]
    fn joined_row_nests_master() {
        let mut row = version_row();
        row["registros_mestre"] = json!({
            "id": "a1b2c3d4-0000-4000-8000-000000000001",
            "modulo_id": "b1b2c3d4-0000-4000-8000-000000000002",
            "uuid_externo": "c1b2c3d4-0000-4000-8000-000000000003"
        });
        let record: CurrentRecord = serde_json::from_value(row).unwrap();
        assert_eq!(record.version.status, RecordStatus::Pending);
        assert_eq!(record.master.id, record.version.master_id);
    }

    #[test]
    fn batch_id_falls_back_to_content_marker() {
        let mut row = version_row();
        row["conteudo"][BATCH_MARKER] = json!("d1b2c3d4-0000-4000-8000-000000000004");
        let version: RecordVersion = serde_json::from_value(row).unwrap();
        assert_eq!(
            version.batch_id(),
            Some(Uuid::parse_str("d1b2c3d4-0000-4000-8000-000000000004").unwrap())
        );

        let explicit = Uuid::new_v4();
        let version = RecordVersion {
            import_batch_id: Some(explicit),
            ..version
        };
        assert_eq!(version.batch_id(), Some(explicit));
    }

    #[test]
    fn terminal_statuses() {
        assert!(!RecordStatus::Pending.is_terminal());
        assert!(RecordStatus::Official.is_terminal());
        assert!(RecordStatus::Rejected.is_terminal());
        assert!(RecordStatus::Obsolete.is_terminal());
    }
}
