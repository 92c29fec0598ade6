// src/parse.rs

use csv::{ReaderBuilder, StringRecord, Trim};

use crate::error::ParseError;

/// Cells of the current row, located by header name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawRecord {
    pub event: String,
    pub heat: String,
    pub time: Option<String>,
}

fn column_index(header: &StringRecord, name: &str) -> Option<usize> {
    header.iter().position(|h| h.eq_ignore_ascii_case(name))
}

fn malformed(e: csv::Error) -> ParseError {
    ParseError::Malformed(e.to_string())
}

/// Split exported CSV into header + current row.
///
/// The first record is the header, the last record with any non-empty cell
/// is taken as the current row (sheet exports pad with rows like `,,`).
/// Columns are matched by name, so the sheet may reorder them freely.
pub fn parse_csv(text: &str) -> Result<RawRecord, ParseError> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    let header = rdr.headers().map_err(malformed)?.clone();

    let mut current = None;
    for result in rdr.records() {
        let record = result.map_err(malformed)?;
        if record.iter().any(|c| !c.is_empty()) {
            current = Some(record);
        }
    }
    let row = current.ok_or(ParseError::NoDataRow)?;

    let event_idx = column_index(&header, "Event").ok_or(ParseError::MissingColumn("Event"))?;
    let heat_idx = column_index(&header, "Heat").ok_or(ParseError::MissingColumn("Heat"))?;
    let time_idx = column_index(&header, "Time");

    let cell = |idx: usize| row.get(idx).unwrap_or_default().to_string();

    Ok(RawRecord {
        event: cell(event_idx),
        heat: cell(heat_idx),
        time: time_idx.map(cell),
    })
}
