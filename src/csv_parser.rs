// Spreadsheet CSV export → rows keyed by header.
// Line oriented and best effort: ragged rows are padded, blank lines skipped, malformed
// quoting never fails the parse.

use csv::{QuoteStyle, WriterBuilder};
use tracing::debug;

use crate::models::Row;

/// Header line plus one row per non-blank line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedCsv {
    pub headers: Vec<String>,
    pub rows: Vec<Row>,
}

/// Parses CSV text whose first line is the header.
///
/// Rows shorter than the header get empty trailing cells, extra cells are ignored.
/// See [`parse_line`] for the field rules.
pub fn parse_csv(text: &str) -> ParsedCsv {
    let mut lines = text.lines();
    let Some(header_line) = lines.next() else {
        return ParsedCsv::default();
    };
    let headers = parse_line(header_line);

    let rows: Vec<Row> = lines
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(n, line)| {
            let values = parse_line(line);
            if values.len() > headers.len() {
                debug!(
                    line = n + 2,
                    extra = values.len() - headers.len(),
                    "ignoring extra cells"
                );
            }
            headers
                .iter()
                .enumerate()
                .map(|(i, h)| (h.as_str(), values.get(i).map_or("", String::as_str)))
                .collect::<Row>()
        })
        .collect();

    ParsedCsv { headers, rows }
}

/// Splits one line into trimmed fields.
///
/// A `"` toggles quoted mode anywhere in a field; inside quotes `""` is a literal quote.
/// A `,` outside quoted mode ends the field. An unterminated quote runs to the end of
/// the line.
pub fn parse_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                fields.push(current.trim().to_string());
                current.clear();
            }
            other => current.push(other),
        }
    }
    if in_quotes {
        debug!("unterminated quote; field runs to end of line");
    }
    fields.push(current.trim().to_string());
    fields
}

/// Writes `rows` as CSV under `headers`, quoting only fields that need it.
/// Cells missing from a row are written empty.
pub fn format_csv(headers: &[String], rows: &[Row]) -> Result<String, csv::Error> {
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Necessary)
        .from_writer(Vec::new());
    writer.write_record(headers)?;
    for row in rows {
        writer.write_record(headers.iter().map(|h| row.get(h).unwrap_or("")))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
