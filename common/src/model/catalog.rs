use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::field::FieldOption;

/// A shared list of options that select fields can point at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub id: Uuid,
    #[serde(rename = "nome")]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: Uuid,
    #[serde(rename = "catalogo_id")]
    pub catalog_id: Uuid,
    #[serde(rename = "valor")]
    pub value: String,
    #[serde(rename = "rotulo")]
    pub label: String,
    #[serde(rename = "ativo", default)]
    pub active: bool,
    #[serde(rename = "ordem", default)]
    pub order: i32,
}

impl From<&CatalogItem> for FieldOption {
    fn from(item: &CatalogItem) -> Self {
        FieldOption {
            value: item.value.clone(),
            label: item.label.clone(),
        }
    }
}
