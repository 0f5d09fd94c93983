use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

const BOM: char = '\u{FEFF}';
const CANDIDATE_DELIMITERS: [u8; 4] = [b',', b';', b'\t', b'|'];

/// An uploaded CSV file, header row split from data rows. Every row has
/// exactly as many cells as there are headers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedCsv {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ParsedCsv {
    /// Non-empty values of column `index` among the first `limit` rows.
    pub fn sample(&self, index: usize, limit: usize) -> Vec<&str> {
        self.rows
            .iter()
            .take(limit)
            .filter_map(|row| row.get(index))
            .map(String::as_str)
            .filter(|v| !v.is_empty())
            .collect()
    }
}

/// Picks the delimiter that occurs most often in the header line.
pub fn detect_delimiter(header_line: &str) -> u8 {
    CANDIDATE_DELIMITERS
        .iter()
        .copied()
        .max_by_key(|&d| header_line.bytes().filter(|&b| b == d).count())
        .filter(|&d| header_line.as_bytes().contains(&d))
        .unwrap_or(b',')
}

/// Trims, strips one layer of surrounding quotes and replaces non-breaking
/// spaces.
pub fn normalize_cell(cell: &str) -> String {
    let s = cell.trim();
    let s = s
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .or_else(|| s.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')))
        .unwrap_or(s);
    s.replace('\u{00A0}', " ").trim().to_string()
}

/// Parses an uploaded file. The header row is mandatory and its cells must
/// be non-empty; short rows are padded and long rows truncated to the header
/// width; fully blank rows are dropped.
pub fn parse(bytes: &[u8]) -> Result<ParsedCsv, ValidationError> {
    let text = std::str::from_utf8(bytes)
        .map_err(|_| ValidationError::Csv("o arquivo não está em UTF-8".into()))?;
    let text = text.trim_start_matches(BOM);
    let header_line = text.lines().next().unwrap_or("");
    if header_line.trim().is_empty() {
        return Err(ValidationError::Csv("cabeçalho ausente".into()));
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(detect_delimiter(header_line))
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| ValidationError::Csv(e.to_string()))?
        .iter()
        .map(normalize_cell)
        .collect();
    if let Some(position) = headers.iter().position(String::is_empty) {
        return Err(ValidationError::Csv(format!(
            "a coluna {} do cabeçalho está vazia",
            position + 1
        )));
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| ValidationError::Csv(e.to_string()))?;
        let mut row: Vec<String> = record.iter().take(headers.len()).map(normalize_cell).collect();
        if row.iter().all(String::is_empty) {
            continue;
        }
        row.resize(headers.len(), String::new());
        rows.push(row);
    }

    Ok(ParsedCsv { headers, rows })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_semicolons() {
        assert_eq!(detect_delimiter("nome;cpf;valor"), b';');
        assert_eq!(detect_delimiter("nome,cpf"), b',');
        assert_eq!(detect_delimiter("nome\tcpf"), b'\t');
        assert_eq!(detect_delimiter("nome"), b',');
    }

    #[test]
    fn parses_with_bom_and_quotes() {
        let input = "\u{FEFF}nome;valor\n\"Ana Souza\";\"1.234,56\"\n\n'José'; 10 \n";
        let parsed = parse(input.as_bytes()).unwrap();
        assert_eq!(parsed.headers, ["nome", "valor"]);
        assert_eq!(
            parsed.rows,
            vec![
                vec!["Ana Souza".to_string(), "1.234,56".to_string()],
                vec!["José".to_string(), "10".to_string()],
            ]
        );
    }

    #[test]
    fn pads_short_rows() {
        let parsed = parse(b"a,b,c\n1\n4,5,6,7\n").unwrap();
        assert_eq!(parsed.rows[0], ["1", "", ""]);
        assert_eq!(parsed.rows[1], ["4", "5", "6"]);
    }

    #[test]
    fn rejects_blank_header_cells() {
        assert!(matches!(parse(b"nome,,cpf\n1,2,3\n"), Err(ValidationError::Csv(_))));
        assert!(matches!(parse(b""), Err(ValidationError::Csv(_))));
    }

    #[test]
    fn sample_skips_empty_cells() {
        let parsed = parse(b"x\n1\n\n2\n \n3\n").unwrap();
        assert_eq!(parsed.sample(0, 2), ["1", "2"]);
    }
}
