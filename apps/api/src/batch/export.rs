//! CSV export of a finished batch.
//!
//! Columns follow schema declaration order, then `file_name`. Absent values
//! are empty cells; `skills` is written as a JSON array string.

use serde_json::Value;
use thiserror::Error;

use crate::batch::types::BatchRow;
use crate::extraction::RESUME_FIELDS;

pub const CSV_FILE_NAME: &str = "parsed_resumes.csv";
const PROVENANCE_COLUMN: &str = "file_name";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Nothing to export: no resumes were parsed")]
    Empty,

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Row serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("CSV buffer error: {0}")]
    Buffer(String),
}

pub fn csv_header() -> Vec<&'static str> {
    RESUME_FIELDS
        .iter()
        .map(|f| f.name)
        .chain(std::iter::once(PROVENANCE_COLUMN))
        .collect()
}

/// Renders rows as CSV text. Refuses to produce an empty table.
pub fn rows_to_csv(rows: &[BatchRow]) -> Result<String, ExportError> {
    if rows.is_empty() {
        return Err(ExportError::Empty);
    }

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(csv_header())?;

    for row in rows {
        let record = serde_json::to_value(&row.record)?;
        let mut cells: Vec<String> = RESUME_FIELDS
            .iter()
            .map(|field| cell(record.get(field.name)))
            .collect();
        cells.push(row.file_name.clone());
        writer.write_record(&cells)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ExportError::Buffer(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| ExportError::Buffer(e.to_string()))
}

fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
