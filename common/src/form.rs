//! Form state behind the dynamic record form.
//!
//! The state holds one edit buffer per field. Updating a field never touches
//! another; masked types are re-formatted on every keystroke, so the buffer
//! may hold partial input, but the payload produced on submission is always
//! fully coerced.

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::future::Future;

use crate::coercion;
use crate::error::ValidationError;
use crate::model::field::FieldType;
use crate::model::value::{Content, FieldValue, content_to_json};
use crate::schema::{ResolvedField, Widget};

#[derive(Debug, Clone, PartialEq)]
pub struct FormState {
    fields: Vec<ResolvedField>,
    values: BTreeMap<String, String>,
}

/// Result of validating the current buffers.
#[derive(Debug, Clone, PartialEq)]
pub enum Validity {
    Valid,
    Invalid(Vec<ValidationError>),
}

impl Validity {
    pub fn is_valid(&self) -> bool {
        matches!(self, Validity::Valid)
    }

    pub fn errors(&self) -> &[ValidationError] {
        match self {
            Validity::Valid => &[],
            Validity::Invalid(errors) => errors,
        }
    }
}

/// Why a submission did not go through.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitError<E> {
    /// Local validation failed; the submit callback was not called.
    Invalid(Vec<ValidationError>),
    /// The callback failed. The form keeps its values.
    Rejected(E),
}

impl FormState {
    /// Builds the state for `fields` (already in display order) seeded with
    /// stored content.
    pub fn new(fields: Vec<ResolvedField>, initial: &Map<String, Value>) -> Self {
        let values = fields
            .iter()
            .map(|f| {
                let text = initial
                    .get(f.name())
                    .map(|v| coercion::edit_text(v, f.definition.field_type))
                    .unwrap_or_default();
                (f.name().to_string(), text)
            })
            .collect();
        Self { fields, values }
    }

    pub fn fields(&self) -> &[ResolvedField] {
        &self.fields
    }

    pub fn value(&self, name: &str) -> &str {
        self.values.get(name).map(String::as_str).unwrap_or("")
    }

    pub fn values(&self) -> &BTreeMap<String, String> {
        &self.values
    }

    /// Stores new input for `name`. Unknown names are ignored.
    pub fn set(&mut self, name: &str, raw: &str) {
        let Some(field) = self.fields.iter().find(|f| f.name() == name) else {
            return;
        };
        let text = match field.widget {
            Widget::Masked => coercion::mask_input(
                raw,
                field.definition.field_type,
                field.definition.mask.as_deref(),
            ),
            _ => raw.to_string(),
        };
        self.values.insert(name.to_string(), text);
    }

    /// Current buffers and whether they would pass validation.
    pub fn snapshot(&self) -> (BTreeMap<String, String>, Validity) {
        let validity = match self.validate() {
            Ok(_) => Validity::Valid,
            Err(errors) => Validity::Invalid(errors),
        };
        (self.values.clone(), validity)
    }

    pub fn error_for(&self, name: &str) -> Option<ValidationError> {
        self.validate()
            .err()
            .and_then(|errors| errors.into_iter().find(|e| e.field() == Some(name)))
    }

    /// Coerces every buffer. Blank optional fields are left out of the
    /// content; blank required fields and values that do not fit their type
    /// are errors.
    pub fn validate(&self) -> Result<Content, Vec<ValidationError>> {
        let mut errors = Vec::new();
        let mut content = Content::new();
        for field in &self.fields {
            let def = &field.definition;
            let raw = self.value(field.name());
            if raw.trim().is_empty() {
                if def.required && def.field_type != FieldType::Boolean {
                    errors.push(ValidationError::required(def));
                }
                continue;
            }
            let value = coercion::to_storage(raw, def.field_type);
            let value = match (&field.widget, value) {
                (Widget::Select(options), Some(FieldValue::Choice(v)))
                    if !options.iter().any(|o| o.value == v) =>
                {
                    None
                }
                (_, value) => value,
            };
            match value {
                Some(value) => {
                    content.insert(def.technical_name.clone(), value);
                }
                None => errors.push(ValidationError::invalid(def)),
            }
        }
        if errors.is_empty() {
            Ok(content)
        } else {
            Err(errors)
        }
    }

    /// JSON object keyed by technical name, ready to send.
    pub fn payload(&self) -> Result<Map<String, Value>, Vec<ValidationError>> {
        self.validate().map(|content| content_to_json(&content))
    }

    /// Validates, then hands the payload to `on_submit`.
    ///
    /// On any failure the buffers are untouched so the operator can retry;
    /// closing or resetting the form after success is up to the caller.
    pub async fn submit<F, Fut, E>(&self, on_submit: F) -> Result<(), SubmitError<E>>
    where
        F: FnOnce(Map<String, Value>) -> Fut,
        Fut: Future<Output = Result<(), E>>,
    {
        let payload = self.payload().map_err(SubmitError::Invalid)?;
        on_submit(payload).await.map_err(SubmitError::Rejected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::field::{FieldDefinition, FieldOption};
    use crate::schema::{OptionSources, resolve};
    use serde_json::json;
    use std::cell::Cell;
    use uuid::Uuid;

    fn field(name: &str, label: &str, field_type: FieldType, required: bool, order: i32) -> FieldDefinition {
        FieldDefinition {
            id: Uuid::new_v4(),
            module_id: Uuid::nil(),
            technical_name: name.to_string(),
            label: label.to_string(),
            field_type,
            required,
            order,
            options: None,
            mask: None,
            catalog_id: None,
            reference_module_id: None,
        }
    }

    fn form(fields: &[FieldDefinition], initial: Value) -> FormState {
        let resolved = resolve(fields, &OptionSources::default());
        FormState::new(resolved, initial.as_object().unwrap())
    }

    #[tokio::test]
    async fn empty_required_field_blocks_submission() {
        let mut state = form(&[field("nome", "Nome", FieldType::ShortText, true, 0)], json!({}));
        state.set("nome", "");
        let called = Cell::new(false);

        let result = state
            .submit(|_| async {
                called.set(true);
                Ok::<(), String>(())
            })
            .await;

        assert!(!called.get());
        match result {
            Err(SubmitError::Invalid(errors)) => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].to_string(), "O campo \"Nome\" é obrigatório");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn failed_submit_keeps_values() {
        let mut state = form(&[field("nome", "Nome", FieldType::ShortText, true, 0)], json!({}));
        state.set("nome", "Joana");

        let result = state
            .submit(|payload| async move {
                assert_eq!(payload["nome"], json!("Joana"));
                Err::<(), _>("timeout")
            })
            .await;

        assert_eq!(result, Err(SubmitError::Rejected("timeout")));
        assert_eq!(state.value("nome"), "Joana");
    }

    #[test]
    fn updates_do_not_touch_other_fields() {
        let mut state = form(
            &[
                field("nome", "Nome", FieldType::ShortText, false, 0),
                field("cpf", "CPF", FieldType::NationalId, false, 1),
                field("salario", "Salário", FieldType::Currency, false, 2),
            ],
            json!({ "nome": "Ana", "cpf": "12345678909", "salario": 150000 }),
        );
        assert_eq!(state.value("cpf"), "123.456.789-09");
        assert_eq!(state.value("salario"), "R$ 1.500,00");

        state.set("salario", "R$ 1.500,001");
        assert_eq!(state.value("salario"), "R$ 15.000,01");
        assert_eq!(state.value("nome"), "Ana");
        assert_eq!(state.value("cpf"), "123.456.789-09");

        let payload = state.payload().unwrap();
        assert_eq!(payload["salario"], json!(1500001));
        assert_eq!(payload["cpf"], json!("12345678909"));
    }

    #[test]
    fn partial_mask_input_is_allowed_but_invalid_values_are_reported() {
        let mut state = form(
            &[
                field("idade", "Idade", FieldType::Integer, false, 0),
                field("cpf", "CPF", FieldType::NationalId, false, 1),
            ],
            json!({}),
        );
        state.set("cpf", "123");
        assert_eq!(state.value("cpf"), "123");
        state.set("idade", "doze");

        let (values, validity) = state.snapshot();
        assert_eq!(values["idade"], "doze");
        assert!(!validity.is_valid());
        assert!(state.error_for("idade").is_some());
        assert!(state.error_for("cpf").is_none());
    }

    #[test]
    fn select_rejects_values_outside_options() {
        let mut situacao = field("situacao", "Situação", FieldType::Select, true, 0);
        situacao.options = Some(vec![FieldOption::same("ativo")]);
        let mut state = form(&[situacao], json!({}));

        state.set("situacao", "outro");
        assert!(state.validate().is_err());
        state.set("situacao", "ativo");
        assert_eq!(state.payload().unwrap()["situacao"], json!("ativo"));
    }

    #[test]
    fn untouched_decimals_save_what_was_loaded() {
        let state = form(
            &[
                field("area", "Área", FieldType::Decimal, false, 0),
                field("fator", "Fator", FieldType::Decimal, false, 1),
                field("total", "Total", FieldType::Decimal, false, 2),
            ],
            json!({ "area": 1234.0, "fator": 1234.5, "total": 1234567.0 }),
        );
        assert_eq!(state.value("area"), "1234");
        assert_eq!(state.value("fator"), "1234,5");

        let payload = state.payload().unwrap();
        assert_eq!(payload["area"], json!(1234.0));
        assert_eq!(payload["fator"], json!(1234.5));
        assert_eq!(payload["total"], json!(1234567.0));
    }

    #[test]
    fn blank_optional_fields_are_omitted() {
        let state = form(
            &[
                field("nome", "Nome", FieldType::ShortText, true, 0),
                field("obs", "Observação", FieldType::LongText, false, 1),
            ],
            json!({ "nome": "Ana" }),
        );
        let payload = state.payload().unwrap();
        assert_eq!(payload.len(), 1);
        assert!(!payload.contains_key("obs"));
    }
}
