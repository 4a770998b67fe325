//! Delimited text codec.
//!
//! Records are split on newlines and fields on the delimiter. There is no
//! quoting or escaping: a `"` is an ordinary character and a delimiter inside
//! a field always splits it. Rows may have any number of fields.

use crate::error::Result;
use csv::{QuoteStyle, ReaderBuilder, Trim, WriterBuilder};
use std::fs::{self, OpenOptions};
use std::path::Path;

/// Default field delimiter for every portal file.
pub const DELIMITER: u8 = b',';

/// One positional record.
pub type Row = Vec<String>;

/// Whether `field` survives a write and re-read as a single field. Rows are
/// never quoted, so the delimiter or a line break would split it.
pub fn is_plain_field(field: &str) -> bool {
    !field.contains([char::from(DELIMITER), '\r', '\n'])
}

/// Parse `text` into rows.
///
/// Fields are trimmed of surrounding whitespace. Blank lines (including the
/// trailing one left by a final newline) produce no row.
pub fn parse(text: &str, delimiter: u8) -> Result<Vec<Row>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .delimiter(delimiter)
        .quoting(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_owned).collect());
    }
    Ok(rows)
}

/// Serialize rows, terminating every row with `\n`.
pub fn serialize(rows: &[Row], delimiter: u8) -> Result<String> {
    let mut writer = WriterBuilder::new()
        .delimiter(delimiter)
        .quote_style(QuoteStyle::Never)
        .flexible(true)
        .from_writer(Vec::new());

    for row in rows {
        writer.write_record(row)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| crate::error::PortalError::Io(e.into_error()))?;
    String::from_utf8(bytes).map_err(|e| crate::error::PortalError::Codec(e.to_string()))
}

/// Read and parse a whole file. A missing file reads as no rows.
pub fn read_rows(path: &Path) -> Result<Vec<Row>> {
    match fs::read_to_string(path) {
        Ok(text) => parse(&text, DELIMITER),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(e.into()),
    }
}

/// Append one row to `path`, creating the file and its parent directory if needed.
pub fn append_row(path: &Path, row: &[String]) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut writer = WriterBuilder::new()
        .delimiter(DELIMITER)
        .quote_style(QuoteStyle::Never)
        .flexible(true)
        .from_writer(file);
    writer.write_record(row)?;
    writer.flush()?;
    Ok(())
}
