use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImportStatus {
    #[serde(rename = "processando")]
    Processing,
    #[serde(rename = "concluido")]
    Finished,
    #[serde(rename = "erro")]
    Failed,
}

/// One CSV upload. Versions created by the upload point back at it through
/// `RecordVersion::import_batch_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportBatch {
    pub id: Uuid,
    #[serde(rename = "nome_arquivo")]
    pub file_name: String,
    #[serde(rename = "modulo_id")]
    pub module_id: Uuid,
    pub status: ImportStatus,
    #[serde(rename = "iniciado_em")]
    pub started_at: DateTime<Utc>,
    #[serde(rename = "finalizado_em", default)]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(rename = "log_erros", default)]
    pub error_log: Option<String>,
}
