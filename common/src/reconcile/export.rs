use crate::model::record::CurrentRecord;
use crate::schema::ResolvedField;

/// UTF-8 byte-order mark. Spreadsheet tools that assume a legacy locale
/// encoding only read the file as UTF-8 when it is present.
pub const BOM: &str = "\u{FEFF}";

const FIXED_HEADERS: [&str; 3] = ["ID", "Status", "Data"];

/// Escapes one cell: `"` is always doubled, and the cell is wrapped in
/// quotes only when it contains a comma or a line break.
pub fn escape_cell(value: &str) -> String {
    let escaped = value.replace('"', "\"\"");
    if value.contains([',', '\n', '\r']) {
        format!("\"{}\"", escaped)
    } else {
        escaped
    }
}

fn push_line<I, S>(out: &mut String, cells: I)
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let line = cells
        .into_iter()
        .map(|c| escape_cell(c.as_ref()))
        .collect::<Vec<_>>()
        .join(",");
    out.push_str(&line);
    out.push('\n');
}

/// Renders `records` as CSV with the columns `ID, Status, Data` followed by
/// the labels of `fields`, in the order given. Values are formatted for
/// display, as the operator sees them on screen.
pub fn to_csv(records: &[CurrentRecord], fields: &[ResolvedField]) -> String {
    let mut out = String::from(BOM);
    push_line(
        &mut out,
        FIXED_HEADERS
            .iter()
            .map(|h| h.to_string())
            .chain(fields.iter().map(|f| f.definition.label.clone())),
    );
    for record in records {
        let version = &record.version;
        let fixed = [
            record.master.id.to_string(),
            version.status.label().to_string(),
            version.created_at.format("%d/%m/%Y").to_string(),
        ];
        let values = fields.iter().map(|field| {
            version
                .content
                .get(field.name())
                .map(|value| field.display(value))
                .unwrap_or_default()
        });
        push_line(&mut out, fixed.into_iter().chain(values));
    }
    out
}
