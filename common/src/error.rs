use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::field::FieldDefinition;

/// Client-side validation failure. Blocks submission locally and never
/// reaches the network.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ValidationError {
    #[error("O campo \"{label}\" é obrigatório")]
    Required { field: String, label: String },
    #[error("Valor inválido para o campo \"{label}\"")]
    Invalid { field: String, label: String },
    #[error("Campo desconhecido: {0}")]
    UnknownField(String),
    #[error("Informe o motivo da rejeição")]
    EmptyRejectionReason,
    #[error("Nenhum registro selecionado")]
    EmptySelection,
    #[error("Arquivo CSV inválido: {0}")]
    Csv(String),
    #[error("Linha {row}, coluna '{column}': valor inválido")]
    CsvCell { row: usize, column: String },
    #[error("{0}")]
    Other(String),
}

impl ValidationError {
    pub fn required(field: &FieldDefinition) -> Self {
        ValidationError::Required {
            field: field.technical_name.clone(),
            label: field.label.clone(),
        }
    }

    pub fn invalid(field: &FieldDefinition) -> Self {
        ValidationError::Invalid {
            field: field.technical_name.clone(),
            label: field.label.clone(),
        }
    }

    /// Technical name of the offending field, when there is one.
    pub fn field(&self) -> Option<&str> {
        match self {
            ValidationError::Required { field, .. } | ValidationError::Invalid { field, .. } => {
                Some(field)
            }
            ValidationError::UnknownField(field) => Some(field),
            _ => None,
        }
    }
}

/// Joins several validation messages into one operator-facing line.
pub fn summarize(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
