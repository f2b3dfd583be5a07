//! Result sink: product records as CSV or JSON.

use std::path::Path;

use thiserror::Error;

use crate::models::{ProductRecord, PRODUCT_COLUMNS};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV encoding failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV output is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Output format options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Json,
    Csv,
}

impl OutputFormat {
    /// Interpret a `format` query value. Anything but `csv` means JSON.
    pub fn from_param(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.trim().eq_ignore_ascii_case("csv") => Self::Csv,
            _ => Self::Json,
        }
    }
}

fn csv_writer<W: std::io::Write>(out: W, records: &[ProductRecord]) -> Result<(), ExportError> {
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(out);
    // Header is written by hand so an empty result still gets one.
    writer.write_record(PRODUCT_COLUMNS)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Encode records as CSV with a header row. Absent optionals are empty cells.
pub fn to_csv(records: &[ProductRecord]) -> Result<String, ExportError> {
    let mut buf = Vec::new();
    csv_writer(&mut buf, records)?;
    Ok(String::from_utf8(buf)?)
}

/// Encode records as a pretty-printed JSON array. Absent optionals are `null`.
pub fn to_json(records: &[ProductRecord]) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(records)?)
}

/// Write records to a CSV file, replacing it if it exists.
pub fn write_csv_file(path: &Path, records: &[ProductRecord]) -> Result<(), ExportError> {
    let file = std::fs::File::create(path)?;
    csv_writer(std::io::BufWriter::new(file), records)
}

/// Default CSV filename for a CLI run.
pub fn csv_filename(category: &str, start_page: u32, end_page: u32) -> String {
    format!("daraz_{}_p{}-{}.csv", category, start_page, end_page)
}
