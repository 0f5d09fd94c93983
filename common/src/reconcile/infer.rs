use serde::{Deserialize, Serialize};

use super::parse::ParsedCsv;
use crate::coercion;
use crate::model::field::{FieldOption, FieldType};
use crate::schema::slugify;

/// Rows looked at when guessing a column's type.
pub const SAMPLE_ROWS: usize = 100;

/// A column needs more sampled values than this before it may become a
/// select field.
const MIN_SELECT_SAMPLE: usize = 5;
/// And fewer distinct values than this.
const MAX_SELECT_OPTIONS: usize = 5;

const DATE_HINTS: [&str; 4] = ["data", "nascimento", "date", "dt_"];
const AMOUNT_HINTS: [&str; 7] = ["valor", "preco", "salario", "custo", "montante", "price", "amount"];
const EMAIL_HINTS: [&str; 2] = ["email", "e_mail"];

/// Inferred schema of one CSV column, shown to the operator on the mapping
/// screen before anything is written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnCheck {
    /// Header text as it appears in the file.
    pub title: String,
    pub field_type: FieldType,
    /// Distinct values, for columns inferred as select.
    pub options: Option<Vec<FieldOption>>,
    /// First non-empty value, as an example for the operator.
    pub first_row: Option<String>,
}

/// Guesses the type of a column from its header and sampled values.
///
/// Rules are tried in order and the first match wins:
/// 1. date hint in the header
/// 2. amount hint in the header (currency)
/// 3. "email" in the header
/// 4. "cpf" / "cnpj" in the header
/// 5. more than 5 sampled values with fewer than 5 distinct ones (select)
/// 6. every sampled value numeric (integer, or decimal when any has a
///    fractional part)
/// 7. short text
pub fn infer_field_type(header: &str, sample: &[&str]) -> (FieldType, Option<Vec<FieldOption>>) {
    let slug = slugify(header);
    let has = |hints: &[&str]| hints.iter().any(|hint| slug.contains(hint));

    if has(&DATE_HINTS) {
        return (FieldType::Date, None);
    }
    if has(&AMOUNT_HINTS) {
        return (FieldType::Currency, None);
    }
    if has(&EMAIL_HINTS) {
        return (FieldType::Email, None);
    }
    if slug.contains("cnpj") {
        return (FieldType::BusinessId, None);
    }
    if slug.contains("cpf") {
        return (FieldType::NationalId, None);
    }

    let mut distinct: Vec<&str> = Vec::new();
    for value in sample {
        if !distinct.contains(value) {
            distinct.push(value);
        }
    }
    if sample.len() > MIN_SELECT_SAMPLE && distinct.len() < MAX_SELECT_OPTIONS {
        let options = distinct.into_iter().map(FieldOption::same).collect();
        return (FieldType::Select, Some(options));
    }

    if !sample.is_empty() && sample.iter().all(|v| is_numeric(v)) {
        let field_type = if sample.iter().all(|v| is_integer(v)) {
            FieldType::Integer
        } else {
            FieldType::Decimal
        };
        return (field_type, None);
    }

    (FieldType::ShortText, None)
}

fn is_integer(value: &str) -> bool {
    let digits = value.strip_prefix('-').unwrap_or(value);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

fn is_numeric(value: &str) -> bool {
    value
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '-'))
        && coercion::parse_decimal(value).is_some()
}

/// Runs [`infer_field_type`] over every column of `csv`.
///
/// The type is guessed from the first [`SAMPLE_ROWS`] rows, but a select
/// column's options cover every value in the file so later rows still
/// convert.
pub fn infer_columns(csv: &ParsedCsv) -> Vec<ColumnCheck> {
    csv.headers
        .iter()
        .enumerate()
        .map(|(index, title)| {
            let sample = csv.sample(index, SAMPLE_ROWS);
            let (field_type, mut options) = infer_field_type(title, &sample);
            if let Some(options) = options.as_mut() {
                for value in csv.sample(index, csv.rows.len()).into_iter().skip(sample.len()) {
                    if !options.iter().any(|o| o.value == value) {
                        options.push(FieldOption::same(value));
                    }
                }
            }
            ColumnCheck {
                title: title.clone(),
                field_type,
                options,
                first_row: sample.first().map(|v| v.to_string()),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::parse::parse;

    #[test]
    fn amount_header_wins_over_integer_values() {
        let mut input = String::from("valor_mensal\n");
        for _ in 0..10 {
            input.push_str("1500\n");
        }
        let columns = infer_columns(&parse(input.as_bytes()).unwrap());
        assert_eq!(columns.len(), 1);
        assert_eq!(columns[0].field_type, FieldType::Currency);
        assert_eq!(columns[0].options, None);
        assert_eq!(columns[0].first_row.as_deref(), Some("1500"));
    }

    #[test]
    fn header_rules_follow_priority() {
        // "data" beats "valor"
        assert_eq!(infer_field_type("Data do Valor", &[]).0, FieldType::Date);
        assert_eq!(infer_field_type("Nascimento", &[]).0, FieldType::Date);
        assert_eq!(infer_field_type("Preço unitário", &[]).0, FieldType::Currency);
        assert_eq!(infer_field_type("E-mail", &["x"]).0, FieldType::Email);
        assert_eq!(infer_field_type("CPF do titular", &["123"]).0, FieldType::NationalId);
        assert_eq!(infer_field_type("cnpj", &[]).0, FieldType::BusinessId);
    }

    #[test]
    fn few_distinct_values_become_select() {
        let sample = ["Ativo", "Inativo", "Ativo", "Ativo", "Inativo", "Ativo"];
        let (field_type, options) = infer_field_type("situacao", &sample);
        assert_eq!(field_type, FieldType::Select);
        assert_eq!(
            options.unwrap(),
            vec![FieldOption::same("Ativo"), FieldOption::same("Inativo")]
        );
    }

    #[test]
    fn select_options_cover_rows_past_the_sample() {
        let mut input = String::from("nome;situacao\n");
        for i in 0..SAMPLE_ROWS {
            let situacao = if i % 2 == 0 { "Ativo" } else { "Inativo" };
            input.push_str(&format!("Servidor {};{}\n", i, situacao));
        }
        input.push_str("Servidor final;Afastado\n");
        let csv = parse(input.as_bytes()).unwrap();

        let columns = infer_columns(&csv);
        assert_eq!(columns[1].field_type, FieldType::Select);
        assert_eq!(
            columns[1].options.as_deref().unwrap(),
            &[
                FieldOption::same("Ativo"),
                FieldOption::same("Inativo"),
                FieldOption::same("Afastado"),
            ][..]
        );
    }

    #[test]
    fn select_rule_runs_before_numeric_rule() {
        let sample = ["1", "2", "1", "2", "1", "2"];
        assert_eq!(infer_field_type("quantidade", &sample).0, FieldType::Select);
    }

    #[test]
    fn small_samples_never_become_select() {
        let sample = ["1", "2", "1", "2", "1"];
        assert_eq!(infer_field_type("quantidade", &sample).0, FieldType::Integer);
    }

    #[test]
    fn numeric_columns() {
        let integers = ["1", "2", "3", "4", "5", "6"];
        assert_eq!(infer_field_type("qtd", &integers).0, FieldType::Integer);
        let decimals = ["1,5", "2", "3.25", "4", "5", "6"];
        assert_eq!(infer_field_type("peso", &decimals).0, FieldType::Decimal);
    }

    #[test]
    fn falls_back_to_text() {
        let names = ["Ana", "Bia", "Caio", "Davi", "Enzo", "Fabi"];
        assert_eq!(infer_field_type("nome", &names).0, FieldType::ShortText);
        assert_eq!(infer_field_type("observacao", &[]).0, FieldType::ShortText);
    }
}
