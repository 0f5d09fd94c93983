use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Groups modules. Deleting a category is the only path that hard-deletes
/// modules (and, through them, every field, record and version).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "descricao", default)]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}
