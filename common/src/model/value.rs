//! Typed record content.
//!
//! Content travels as plain JSON (`field name -> value`) so that the export
//! endpoint and third-party readers see ordinary objects. Inside the
//! application it is validated against the module's field definitions at the
//! boundary and carried as [`Content`].

use chrono::{NaiveDate, NaiveTime};
use serde::{Serialize, Serializer};
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;

use super::field::{FieldDefinition, FieldType};
use crate::coercion;
use crate::error::ValidationError;

/// A single coerced value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Decimal(f64),
    /// Minor currency units (centavos).
    Currency(i64),
    Date(NaiveDate),
    Time(NaiveTime),
    Bool(bool),
    /// Value of an enumerated option.
    Choice(String),
    /// Id of a referenced record or catalog item.
    Reference(String),
}

/// Validated content of one record version, keyed by technical field name.
pub type Content = BTreeMap<String, FieldValue>;

impl FieldValue {
    /// Storage representation.
    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Text(s) | FieldValue::Choice(s) | FieldValue::Reference(s) => {
                Value::String(s.clone())
            }
            FieldValue::Integer(n) | FieldValue::Currency(n) => Value::Number((*n).into()),
            FieldValue::Decimal(x) => Number::from_f64(*x).map(Value::Number).unwrap_or(Value::Null),
            FieldValue::Date(d) => Value::String(d.format("%Y-%m-%d").to_string()),
            FieldValue::Time(t) => Value::String(t.format("%H:%M").to_string()),
            FieldValue::Bool(b) => Value::Bool(*b),
        }
    }

    /// Reads a stored (or client-submitted) JSON value as `field_type`.
    ///
    /// Strings go through [`coercion::to_storage`] so raw operator input is
    /// accepted; numbers and booleans are taken as already coerced. Returns
    /// `None` for null and for anything that does not fit the type.
    pub fn from_json(value: &Value, field_type: FieldType) -> Option<FieldValue> {
        match value {
            Value::Null => None,
            Value::String(s) => coercion::to_storage(s, field_type),
            Value::Bool(b) => match field_type {
                FieldType::Boolean => Some(FieldValue::Bool(*b)),
                _ => None,
            },
            Value::Number(n) => match field_type {
                FieldType::Integer => n
                    .as_i64()
                    .or_else(|| n.as_f64().filter(|x| x.fract() == 0.0).map(|x| x as i64))
                    .map(FieldValue::Integer),
                FieldType::Decimal => n.as_f64().map(FieldValue::Decimal),
                FieldType::Currency => n
                    .as_i64()
                    .or_else(|| n.as_f64().map(|x| x.round() as i64))
                    .map(FieldValue::Currency),
                FieldType::Boolean => n.as_i64().map(|x| FieldValue::Bool(x != 0)),
                FieldType::NationalId
                | FieldType::BusinessId
                | FieldType::Phone
                | FieldType::ShortText
                | FieldType::LongText
                | FieldType::Select
                | FieldType::CatalogReference
                | FieldType::ModuleReference => coercion::to_storage(&n.to_string(), field_type),
                FieldType::Date | FieldType::Time | FieldType::Email => None,
            },
            Value::Array(_) | Value::Object(_) => None,
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

/// Validates raw content against `fields`.
///
/// Keys starting with `_` are bookkeeping markers and are ignored; any other
/// key without a definition is rejected. Every problem is reported, not just
/// the first one.
pub fn validate_content(
    fields: &[FieldDefinition],
    raw: &Map<String, Value>,
) -> Result<Content, Vec<ValidationError>> {
    let mut errors = Vec::new();
    let mut content = Content::new();

    for key in raw.keys() {
        if !key.starts_with('_') && !fields.iter().any(|f| &f.technical_name == key) {
            errors.push(ValidationError::UnknownField(key.clone()));
        }
    }

    for field in fields {
        let raw_value = raw.get(&field.technical_name).unwrap_or(&Value::Null);
        let blank = match raw_value {
            Value::Null => true,
            Value::String(s) => s.trim().is_empty(),
            _ => false,
        };
        if blank {
            if field.required {
                errors.push(ValidationError::required(field));
            }
            continue;
        }
        match FieldValue::from_json(raw_value, field.field_type) {
            Some(value) if option_allowed(field, &value) => {
                content.insert(field.technical_name.clone(), value);
            }
            _ => errors.push(ValidationError::invalid(field)),
        }
    }

    if errors.is_empty() {
        Ok(content)
    } else {
        Err(errors)
    }
}

/// Inline option sets constrain the accepted values; catalog-backed and
/// free-text fallbacks do not.
fn option_allowed(field: &FieldDefinition, value: &FieldValue) -> bool {
    match (field.field_type, &field.options, value) {
        (FieldType::Select, Some(options), FieldValue::Choice(v)) if field.catalog_id.is_none() && !options.is_empty() => {
            options.iter().any(|o| &o.value == v)
        }
        _ => true,
    }
}

/// Storage form of validated content.
pub fn content_to_json(content: &Content) -> Map<String, Value> {
    content
        .iter()
        .map(|(k, v)| (k.clone(), v.to_json()))
        .collect()
}
