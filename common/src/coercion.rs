//! Conversion between operator input, storage representation and display
//! text.
//!
//! Every function here fails soft: empty or unparseable input yields `None`
//! (or the input unchanged, for display helpers) and nothing panics, so a
//! form can keep rendering whatever the operator has typed so far.

use chrono::{NaiveDate, NaiveTime};
use num_format::{Locale, ToFormattedString};
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

use crate::model::field::FieldType;
use crate::model::value::FieldValue;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());

/// Longest digit run accepted by the currency mask (R$ 9.999.999.999.999,99).
const MAX_CURRENCY_DIGITS: usize = 15;

/// Coerces raw operator input into the storage representation of
/// `field_type`.
pub fn to_storage(raw: &str, field_type: FieldType) -> Option<FieldValue> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    match field_type {
        FieldType::ShortText | FieldType::LongText => Some(FieldValue::Text(trimmed.to_string())),
        FieldType::Email => EMAIL_RE
            .is_match(trimmed)
            .then(|| FieldValue::Text(trimmed.to_string())),
        FieldType::Integer => parse_integer(trimmed).map(FieldValue::Integer),
        FieldType::Decimal => parse_decimal(trimmed).map(FieldValue::Decimal),
        FieldType::Currency => parse_decimal(trimmed)
            .and_then(to_cents)
            .map(FieldValue::Currency),
        FieldType::Date => parse_date(trimmed).map(FieldValue::Date),
        FieldType::Time => parse_time(trimmed).map(FieldValue::Time),
        FieldType::Boolean => parse_bool(trimmed).map(FieldValue::Bool),
        FieldType::NationalId | FieldType::BusinessId | FieldType::Phone => {
            let digits = digits_only(trimmed);
            (!digits.is_empty()).then_some(FieldValue::Text(digits))
        }
        FieldType::Select | FieldType::CatalogReference => {
            Some(FieldValue::Choice(trimmed.to_string()))
        }
        FieldType::ModuleReference => Some(FieldValue::Reference(trimmed.to_string())),
    }
}

/// Formats a stored value for display.
pub fn to_display(value: &FieldValue, field_type: FieldType) -> String {
    match value {
        FieldValue::Text(s) => match field_type {
            FieldType::NationalId | FieldType::BusinessId => format_national_id(s),
            FieldType::Phone => format_phone(s),
            _ => s.clone(),
        },
        FieldValue::Integer(n) => n.to_string(),
        FieldValue::Decimal(x) => format_decimal(*x),
        FieldValue::Currency(cents) => format_currency(*cents),
        FieldValue::Date(d) => d.format("%d/%m/%Y").to_string(),
        FieldValue::Time(t) => t.format("%H:%M").to_string(),
        FieldValue::Bool(true) => "Sim".to_string(),
        FieldValue::Bool(false) => "Não".to_string(),
        FieldValue::Choice(s) | FieldValue::Reference(s) => s.clone(),
    }
}

/// Display text for a value as it sits in stored JSON content. Values that
/// no longer fit the field's type are shown verbatim.
pub fn display_json(value: &Value, field_type: FieldType) -> String {
    match FieldValue::from_json(value, field_type) {
        Some(typed) => to_display(&typed, field_type),
        None => raw_text(value),
    }
}

/// Text placed in an input widget when a stored value is loaded for editing.
///
/// Date and time inputs work on ISO text, checkboxes on `"true"`/`"false"`;
/// decimals drop thousands grouping so `parse_decimal` reads them back
/// unchanged. Everything else starts out formatted as it would be displayed.
pub fn edit_text(value: &Value, field_type: FieldType) -> String {
    match (field_type, FieldValue::from_json(value, field_type)) {
        (_, None) => raw_text(value),
        (FieldType::Date, Some(FieldValue::Date(d))) => d.format("%Y-%m-%d").to_string(),
        (FieldType::Decimal, Some(FieldValue::Decimal(x))) => {
            x.to_string().replace('.', Locale::pt.decimal())
        }
        (FieldType::Boolean, Some(FieldValue::Bool(b))) => b.to_string(),
        (_, Some(typed)) => to_display(&typed, field_type),
    }
}

/// Re-formats an edit buffer after a keystroke. Masked types are normalised
/// to their display form; fields with a custom `#` pattern get the pattern
/// applied to their digits; everything else is returned untouched.
pub fn mask_input(raw: &str, field_type: FieldType, pattern: Option<&str>) -> String {
    let digits = digits_only(raw);
    match field_type {
        FieldType::Currency => {
            if digits.is_empty() {
                return String::new();
            }
            let significant: String = digits.chars().take(MAX_CURRENCY_DIGITS).collect();
            format_currency(significant.parse::<i64>().unwrap_or(0))
        }
        FieldType::NationalId => format_national_id(&truncate(&digits, 11)),
        FieldType::BusinessId => format_national_id(&truncate(&digits, 14)),
        FieldType::Phone => format_phone(&truncate(&digits, 11)),
        _ => match pattern {
            Some(p) if p.contains('#') && !digits.is_empty() => apply_pattern(&digits, p),
            _ => raw.to_string(),
        },
    }
}

/// Parses a number written with either decimal separator.
///
/// When both `.` and `,` appear the dot is a thousands separator and the last
/// comma is the decimal point (`"1.234,56"` is 1234.56). Several dots and no
/// comma are also read as thousands separators.
pub fn parse_decimal(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '-'))
        .collect();
    if !cleaned.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }
    let has_dot = cleaned.contains('.');
    let has_comma = cleaned.contains(',');
    let normalized = if has_dot && has_comma {
        replace_last_comma(&cleaned.replace('.', ""))
    } else if has_comma {
        replace_last_comma(&cleaned)
    } else if cleaned.matches('.').count() > 1 {
        cleaned.replace('.', "")
    } else {
        cleaned
    };
    normalized.parse::<f64>().ok().filter(|x| x.is_finite())
}

fn replace_last_comma(s: &str) -> String {
    match s.rfind(',') {
        Some(idx) => format!("{}.{}", s[..idx].replace(',', ""), &s[idx + 1..]),
        None => s.to_string(),
    }
}

fn parse_integer(raw: &str) -> Option<i64> {
    let cleaned: String = raw.chars().filter(|c| !matches!(c, '.' | ' ')).collect();
    cleaned.parse::<i64>().ok()
}

fn to_cents(amount: f64) -> Option<i64> {
    let cents = (amount * 100.0).round();
    (cents.abs() < 9.0e15).then_some(cents as i64)
}

/// Accepts `DD/MM/YYYY` and the storage format `YYYY-MM-DD` (optionally
/// followed by a time part).
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%d/%m/%Y")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
        .ok()
        .or_else(|| {
            raw.get(..10)
                .filter(|_| raw.as_bytes().get(10) == Some(&b'T'))
                .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
        })
}

fn parse_time(raw: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .ok()
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_lowercase().as_str() {
        "sim" | "s" | "true" | "1" | "x" | "yes" | "y" | "verdadeiro" => Some(true),
        "não" | "nao" | "n" | "false" | "0" | "no" | "falso" => Some(false),
        _ => None,
    }
}

pub fn digits_only(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

fn truncate(digits: &str, max: usize) -> String {
    digits.chars().take(max).collect()
}

/// `R$ 1.234,56` from 123456 centavos.
pub fn format_currency(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!(
        "{}R$ {}{}{:02}",
        sign,
        (abs / 100).to_formatted_string(&Locale::pt),
        Locale::pt.decimal(),
        abs % 100
    )
}

fn format_decimal(value: f64) -> String {
    let text = format!("{}", value.abs());
    let (int_part, frac_part) = match text.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (text.as_str(), None),
    };
    let grouped = match int_part.parse::<u64>() {
        Ok(n) => n.to_formatted_string(&Locale::pt),
        Err(_) => int_part.to_string(),
    };
    let sign = if value < 0.0 { "-" } else { "" };
    match frac_part {
        Some(f) => format!("{}{}{}{}", sign, grouped, Locale::pt.decimal(), f),
        None => format!("{}{}", sign, grouped),
    }
}

/// Punctuates a CPF (11 digits) or CNPJ (14 digits). Any other length is
/// returned unchanged.
pub fn format_national_id(raw: &str) -> String {
    let d = digits_only(raw);
    match d.len() {
        11 => format!("{}.{}.{}-{}", &d[..3], &d[3..6], &d[6..9], &d[9..]),
        14 => format!(
            "{}.{}.{}/{}-{}",
            &d[..2],
            &d[2..5],
            &d[5..8],
            &d[8..12],
            &d[12..]
        ),
        _ => raw.to_string(),
    }
}

/// Punctuates a 10-digit landline or 11-digit mobile number. Any other length
/// is returned unchanged.
pub fn format_phone(raw: &str) -> String {
    let d = digits_only(raw);
    match d.len() {
        10 => format!("({}) {}-{}", &d[..2], &d[2..6], &d[6..]),
        11 => format!("({}) {}-{}", &d[..2], &d[2..7], &d[7..]),
        _ => raw.to_string(),
    }
}

/// Lays `digits` over a pattern where `#` stands for one digit. Literal
/// characters are emitted only while digits remain, so partial input renders
/// progressively.
pub fn apply_pattern(digits: &str, pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut remaining = digits.chars().peekable();
    for p in pattern.chars() {
        if remaining.peek().is_none() {
            break;
        }
        if p == '#' {
            if let Some(d) = remaining.next() {
                out.push(d);
            }
        } else {
            out.push(p);
        }
    }
    out
}

fn raw_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn blank_input_is_null_for_every_type() {
        for field_type in FieldType::ALL {
            assert_eq!(to_storage("", field_type), None, "{:?}", field_type);
            assert_eq!(to_storage("   \t ", field_type), None, "{:?}", field_type);
        }
    }

    #[test]
    fn national_ids_by_length() {
        assert_eq!(format_national_id("12345678909"), "123.456.789-09");
        assert_eq!(format_national_id("12345678000195"), "12.345.678/0001-95");
        // unexpected lengths pass through untouched
        assert_eq!(format_national_id("1234"), "1234");
        assert_eq!(format_national_id("12.34"), "12.34");

        let stored = to_storage("123.456.789-09", FieldType::NationalId).unwrap();
        assert_eq!(stored, FieldValue::Text("12345678909".into()));
        assert_eq!(to_display(&stored, FieldType::NationalId), "123.456.789-09");
    }

    #[test]
    fn phone_templates() {
        assert_eq!(format_phone("1133334444"), "(11) 3333-4444");
        assert_eq!(format_phone("11999998888"), "(11) 99999-8888");
        assert_eq!(format_phone("999"), "999");
    }

    #[test]
    fn decimal_separators() {
        assert_eq!(parse_decimal("1.234,56"), Some(1234.56));
        assert_eq!(parse_decimal("1234,56"), Some(1234.56));
        assert_eq!(parse_decimal("1234.56"), Some(1234.56));
        assert_eq!(parse_decimal("1.234.567"), Some(1234567.0));
        assert_eq!(parse_decimal("R$ 10,50"), Some(10.5));
        assert_eq!(parse_decimal("abc"), None);
        assert_eq!(
            to_storage("1.234,56", FieldType::Decimal),
            Some(FieldValue::Decimal(1234.56))
        );
    }

    #[test]
    fn decimal_edit_text_has_no_grouping() {
        assert_eq!(edit_text(&json!(1234.0), FieldType::Decimal), "1234");
        assert_eq!(edit_text(&json!(1234.5), FieldType::Decimal), "1234,5");
        assert_eq!(edit_text(&json!(-0.25), FieldType::Decimal), "-0,25");
        assert_eq!(display_json(&json!(1234.5), FieldType::Decimal), "1.234,5");
    }

    #[test]
    fn currency_is_stored_in_cents() {
        assert_eq!(
            to_storage("R$ 1.234,56", FieldType::Currency),
            Some(FieldValue::Currency(123456))
        );
        assert_eq!(
            to_storage("1500", FieldType::Currency),
            Some(FieldValue::Currency(150000))
        );
        assert_eq!(format_currency(123456), "R$ 1.234,56");
        assert_eq!(format_currency(5), "R$ 0,05");
        assert_eq!(format_currency(-250), "-R$ 2,50");
    }

    #[test]
    fn dates_normalise_to_iso() {
        let date = to_storage("05/11/1990", FieldType::Date).unwrap();
        assert_eq!(date.to_json(), json!("1990-11-05"));
        let iso = to_storage("1990-11-05", FieldType::Date).unwrap();
        assert_eq!(iso, date);
        assert_eq!(to_display(&date, FieldType::Date), "05/11/1990");
        assert_eq!(to_storage("31/02/2020", FieldType::Date), None);
        assert!(to_storage("2024-01-02T10:00:00Z", FieldType::Date).is_some());
    }

    #[test]
    fn booleans_and_emails() {
        assert_eq!(to_storage("Sim", FieldType::Boolean), Some(FieldValue::Bool(true)));
        assert_eq!(to_storage("não", FieldType::Boolean), Some(FieldValue::Bool(false)));
        assert_eq!(to_storage("talvez", FieldType::Boolean), None);
        assert!(to_storage("ana@prefeitura.gov.br", FieldType::Email).is_some());
        assert_eq!(to_storage("ana@", FieldType::Email), None);
    }

    #[test]
    fn masks_reformat_each_keystroke() {
        assert_eq!(mask_input("1", FieldType::Currency, None), "R$ 0,01");
        assert_eq!(mask_input("R$ 0,012", FieldType::Currency, None), "R$ 0,12");
        assert_eq!(mask_input("123456", FieldType::Currency, None), "R$ 1.234,56");
        assert_eq!(mask_input("", FieldType::Currency, None), "");
        assert_eq!(mask_input("1234", FieldType::NationalId, None), "1234");
        assert_eq!(
            mask_input("123456789091234", FieldType::NationalId, None),
            "123.456.789-09"
        );
        assert_eq!(mask_input("11999998888", FieldType::Phone, None), "(11) 99999-8888");
        assert_eq!(
            mask_input("8801", FieldType::ShortText, Some("#####-###")),
            "8801"
        );
        assert_eq!(
            mask_input("88015100", FieldType::ShortText, Some("#####-###")),
            "88015-100"
        );
        assert_eq!(mask_input("livre", FieldType::ShortText, None), "livre");
    }

    #[test]
    fn display_of_stored_json() {
        assert_eq!(display_json(&json!(150000), FieldType::Currency), "R$ 1.500,00");
        assert_eq!(display_json(&json!(1234.5), FieldType::Decimal), "1.234,5");
        assert_eq!(display_json(&json!(null), FieldType::ShortText), "");
        assert_eq!(display_json(&json!("n/d"), FieldType::Date), "n/d");
        assert_eq!(edit_text(&json!("1990-11-05"), FieldType::Date), "1990-11-05");
        assert_eq!(edit_text(&json!(true), FieldType::Boolean), "true");
    }
}
