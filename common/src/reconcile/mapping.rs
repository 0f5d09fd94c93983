use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::infer::ColumnCheck;
use super::parse::ParsedCsv;
use crate::coercion;
use crate::error::ValidationError;
use crate::model::field::{FieldDefinition, FieldDraft, FieldType};
use crate::model::record::BATCH_MARKER;
use crate::schema::{slugify, unique_technical_name};

/// Where a CSV column goes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MappingTarget {
    Ignore,
    /// An existing field of the module, by technical name.
    Existing { technical_name: String },
    /// A field created by the import.
    New { draft: FieldDraft },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMapping {
    /// Header of the column in the file.
    pub column: String,
    pub target: MappingTarget,
}

/// Initial mapping offered to the operator: a column whose header matches
/// an existing field (by technical name or label) maps onto it, anything
/// else becomes a new field of the inferred type.
pub fn suggest(checks: &[ColumnCheck], existing: &[FieldDefinition]) -> Vec<ColumnMapping> {
    checks
        .iter()
        .map(|check| {
            let slug = slugify(&check.title);
            let matched = existing.iter().find(|field| {
                field.technical_name == slug || field.label.eq_ignore_ascii_case(check.title.trim())
            });
            let target = match matched {
                Some(field) => MappingTarget::Existing {
                    technical_name: field.technical_name.clone(),
                },
                None => {
                    let mut draft = FieldDraft::new(check.title.clone(), check.field_type);
                    draft.options = check.options.clone();
                    MappingTarget::New { draft }
                }
            };
            ColumnMapping {
                column: check.title.clone(),
                target,
            }
        })
        .collect()
}

#[derive(Debug, Clone)]
struct Binding {
    column_index: usize,
    column: String,
    field: FieldDefinition,
}

/// A checked mapping: which fields must be created and which column feeds
/// which field.
#[derive(Debug, Clone)]
pub struct ImportPlan {
    pub new_fields: Vec<FieldDefinition>,
    bindings: Vec<Binding>,
}

impl ImportPlan {
    /// Checks `mappings` against the file headers and the module's current
    /// fields. New fields get unique technical names and are ordered after
    /// the existing ones.
    pub fn build(
        module_id: Uuid,
        headers: &[String],
        mappings: &[ColumnMapping],
        existing: &[FieldDefinition],
    ) -> Result<Self, ValidationError> {
        let mut taken: Vec<String> = existing.iter().map(|f| f.technical_name.clone()).collect();
        let mut next_order = existing.iter().map(|f| f.order).max().map_or(0, |o| o + 1);
        let mut new_fields = Vec::new();
        let mut bindings: Vec<Binding> = Vec::new();

        for mapping in mappings {
            let column_index = headers
                .iter()
                .position(|h| h == &mapping.column)
                .ok_or_else(|| {
                    ValidationError::Csv(format!("coluna '{}' não encontrada no arquivo", mapping.column))
                })?;

            let field = match &mapping.target {
                MappingTarget::Ignore => continue,
                MappingTarget::Existing { technical_name } => existing
                    .iter()
                    .find(|f| &f.technical_name == technical_name)
                    .cloned()
                    .ok_or_else(|| ValidationError::UnknownField(technical_name.clone()))?,
                MappingTarget::New { draft } => {
                    let technical_name = unique_technical_name(&draft.label, &taken);
                    taken.push(technical_name.clone());
                    let field = draft.clone().into_definition(module_id, technical_name, next_order);
                    next_order += 1;
                    new_fields.push(field.clone());
                    field
                }
            };

            if bindings
                .iter()
                .any(|b| b.field.technical_name == field.technical_name)
            {
                return Err(ValidationError::Csv(format!(
                    "o campo '{}' recebe mais de uma coluna",
                    field.label
                )));
            }
            bindings.push(Binding {
                column_index,
                column: mapping.column.clone(),
                field,
            });
        }

        if bindings.is_empty() {
            return Err(ValidationError::Csv("nenhuma coluna foi mapeada".into()));
        }
        Ok(Self { new_fields, bindings })
    }

    /// Converts one data row. `line` is the 1-based line number in the file,
    /// header included, used in the error.
    pub fn convert_row(&self, line: usize, row: &[String]) -> Result<Map<String, Value>, ValidationError> {
        let mut content = Map::new();
        for binding in &self.bindings {
            let cell = row.get(binding.column_index).map(String::as_str).unwrap_or("");
            let error = || ValidationError::CsvCell {
                row: line,
                column: binding.column.clone(),
            };
            if cell.trim().is_empty() {
                if binding.field.required {
                    return Err(error());
                }
                continue;
            }
            let value = coerce_cell(&binding.field, cell).ok_or_else(error)?;
            content.insert(binding.field.technical_name.clone(), value);
        }
        Ok(content)
    }

    /// Converts every row of `csv`, tagging each with `batch_id`. Stops at the
    /// first invalid cell so nothing is written for a file with bad data.
    pub fn convert(&self, csv: &ParsedCsv, batch_id: Uuid) -> Result<Vec<Map<String, Value>>, ValidationError> {
        csv.rows
            .iter()
            .enumerate()
            .map(|(index, row)| {
                let mut content = self.convert_row(index + 2, row)?;
                content.insert(BATCH_MARKER.to_string(), Value::String(batch_id.to_string()));
                Ok(content)
            })
            .collect()
    }
}

fn coerce_cell(field: &FieldDefinition, cell: &str) -> Option<Value> {
    let value = coercion::to_storage(cell, field.field_type)?.to_json();
    match (&field.field_type, field.options.as_deref()) {
        (FieldType::Select, Some(options)) if !options.is_empty() => {
            let text = cell.trim();
            options
                .iter()
                .find(|o| o.value == text || o.label.eq_ignore_ascii_case(text))
                .map(|o| Value::String(o.value.clone()))
        }
        _ => Some(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::field::FieldOption;
    use crate::reconcile::infer::infer_columns;
    use crate::reconcile::parse::parse;
    use serde_json::json;

    fn existing_field(name: &str, label: &str, field_type: FieldType, order: i32) -> FieldDefinition {
        FieldDefinition {
            id: Uuid::new_v4(),
            module_id: Uuid::nil(),
            technical_name: name.to_string(),
            label: label.to_string(),
            field_type,
            required: true,
            order,
            options: None,
            mask: None,
            catalog_id: None,
            reference_module_id: None,
        }
    }

    fn sample_csv() -> ParsedCsv {
        parse("Nome;CPF;Salário;Observação\nAna;123.456.789-01;1.500,00;\nBruno;98765432100;2000;ok\n".as_bytes())
            .unwrap()
    }

    #[test]
    fn suggest_matches_existing_fields() {
        let csv = sample_csv();
        let existing = vec![existing_field("nome", "Nome", FieldType::ShortText, 0)];
        let mappings = suggest(&infer_columns(&csv), &existing);
        assert_eq!(
            mappings[0].target,
            MappingTarget::Existing {
                technical_name: "nome".into()
            }
        );
        match &mappings[2].target {
            MappingTarget::New { draft } => assert_eq!(draft.field_type, FieldType::Currency),
            other => panic!("unexpected target {:?}", other),
        }
    }

    #[test]
    fn builds_plan_and_converts_rows() {
        let csv = sample_csv();
        let existing = vec![existing_field("nome", "Nome", FieldType::ShortText, 3)];
        let mut mappings = suggest(&infer_columns(&csv), &existing);
        mappings[3].target = MappingTarget::Ignore;
        let module_id = Uuid::new_v4();
        let plan = ImportPlan::build(module_id, &csv.headers, &mappings, &existing).unwrap();

        assert_eq!(plan.new_fields.len(), 2);
        assert_eq!(plan.new_fields[0].technical_name, "cpf");
        assert_eq!(plan.new_fields[0].order, 4);
        assert_eq!(plan.new_fields[1].technical_name, "salario");
        assert_eq!(plan.new_fields[1].module_id, module_id);

        let batch = Uuid::new_v4();
        let rows = plan.convert(&csv, batch).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["nome"], json!("Ana"));
        assert_eq!(rows[0]["cpf"], json!("12345678901"));
        assert_eq!(rows[0]["salario"], json!(150000));
        assert_eq!(rows[0][BATCH_MARKER], json!(batch.to_string()));
        assert!(rows[1].get("observacao").is_none());
    }

    #[test]
    fn inferred_select_accepts_values_first_seen_late() {
        let mut input = String::from("situacao\n");
        for i in 0..150 {
            input.push_str(if i % 2 == 0 { "Ativo\n" } else { "Inativo\n" });
        }
        input.push_str("Afastado\n");
        let csv = parse(input.as_bytes()).unwrap();
        let mappings = suggest(&infer_columns(&csv), &[]);
        let plan = ImportPlan::build(Uuid::nil(), &csv.headers, &mappings, &[]).unwrap();
        assert_eq!(plan.new_fields[0].field_type, FieldType::Select);

        let rows = plan.convert(&csv, Uuid::nil()).unwrap();
        assert_eq!(rows.len(), 151);
        assert_eq!(rows[150]["situacao"], json!("Afastado"));
    }

    #[test]
    fn new_field_names_do_not_collide() {
        let existing = vec![existing_field("nome", "Nome", FieldType::ShortText, 0)];
        let headers = vec!["Nome completo".to_string(), "nome".to_string()];
        let mappings = vec![
            ColumnMapping {
                column: "nome".into(),
                target: MappingTarget::New {
                    draft: FieldDraft::new("Nome", FieldType::ShortText),
                },
            },
            ColumnMapping {
                column: "Nome completo".into(),
                target: MappingTarget::Ignore,
            },
        ];
        let plan = ImportPlan::build(Uuid::nil(), &headers, &mappings, &existing).unwrap();
        assert_eq!(plan.new_fields[0].technical_name, "nome_2");
    }

    #[test]
    fn reports_first_bad_cell_with_line_and_column() {
        let csv = parse(b"nome,idade\nAna,30\nBia,trinta\nCaio,x\n").unwrap();
        let mappings = vec![
            ColumnMapping {
                column: "nome".into(),
                target: MappingTarget::New {
                    draft: FieldDraft::new("nome", FieldType::ShortText),
                },
            },
            ColumnMapping {
                column: "idade".into(),
                target: MappingTarget::New {
                    draft: FieldDraft::new("idade", FieldType::Integer),
                },
            },
        ];
        let plan = ImportPlan::build(Uuid::nil(), &csv.headers, &mappings, &[]).unwrap();
        let err = plan.convert(&csv, Uuid::nil()).unwrap_err();
        assert_eq!(
            err,
            ValidationError::CsvCell {
                row: 3,
                column: "idade".into()
            }
        );
        assert_eq!(err.to_string(), "Linha 3, coluna 'idade': valor inválido");
    }

    #[test]
    fn required_cells_must_be_filled() {
        let csv = parse(b"nome\nAna\n\n").unwrap();
        let existing = vec![existing_field("nome", "Nome", FieldType::ShortText, 0)];
        let plan = ImportPlan::build(Uuid::nil(), &csv.headers, &suggest(&infer_columns(&csv), &existing), &existing)
            .unwrap();
        assert!(plan.convert_row(3, &[String::new()]).is_err());
    }

    #[test]
    fn select_cells_accept_value_or_label() {
        let mut field = existing_field("situacao", "Situação", FieldType::Select, 0);
        field.options = Some(vec![FieldOption {
            value: "A".into(),
            label: "Ativo".into(),
        }]);
        let headers = vec!["situacao".to_string()];
        let mappings = vec![ColumnMapping {
            column: "situacao".into(),
            target: MappingTarget::Existing {
                technical_name: "situacao".into(),
            },
        }];
        let plan = ImportPlan::build(Uuid::nil(), &headers, &mappings, &[field]).unwrap();
        assert_eq!(plan.convert_row(2, &["ativo".into()]).unwrap()["situacao"], json!("A"));
        assert_eq!(plan.convert_row(2, &["A".into()]).unwrap()["situacao"], json!("A"));
        assert!(plan.convert_row(2, &["Inativo".into()]).is_err());
    }

    #[test]
    fn rejects_bad_mappings() {
        let headers = vec!["a".to_string()];
        let missing_column = vec![ColumnMapping {
            column: "b".into(),
            target: MappingTarget::Ignore,
        }];
        assert!(ImportPlan::build(Uuid::nil(), &headers, &missing_column, &[]).is_err());

        let all_ignored = vec![ColumnMapping {
            column: "a".into(),
            target: MappingTarget::Ignore,
        }];
        assert!(ImportPlan::build(Uuid::nil(), &headers, &all_ignored, &[]).is_err());

        let unknown = vec![ColumnMapping {
            column: "a".into(),
            target: MappingTarget::Existing {
                technical_name: "zzz".into(),
            },
        }];
        assert_eq!(
            ImportPlan::build(Uuid::nil(), &headers, &unknown, &[]).unwrap_err(),
            ValidationError::UnknownField("zzz".into())
        );
    }
}
