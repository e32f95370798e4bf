use serde::Serialize;
use thiserror::Error;

use crate::extraction::{ExtractError, ResumeRecord, SchemaViolation};
use crate::llm_client::LlmError;

/// Tunables for one batch run.
#[derive(Debug, Clone, Copy)]
pub struct BatchSettings {
    pub min_text_chars: usize,
    pub max_prompt_chars: usize,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            min_text_chars: 50,
            max_prompt_chars: 6000,
        }
    }
}

/// Pipeline stages an entry moves through on the success path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStage {
    Selected,
    TextExtracted,
    Truncated,
    Submitted,
    Validated,
    Accumulated,
}

/// Everything that can go wrong for a single archive entry.
/// None of these abort the batch.
#[derive(Debug, Error)]
pub enum EntryError {
    #[error("Could not read entry from archive: {0}")]
    ArchiveRead(String),

    #[error("Could not extract document text: {0}")]
    DocumentParse(String),

    #[error("Extracted text too short ({chars} characters, minimum {min})")]
    UnextractableText { chars: usize, min: usize },

    #[error("Upstream error: {0}")]
    Upstream(LlmError),

    #[error("Schema violation: {0}")]
    SchemaViolation(SchemaViolation),
}

impl From<ExtractError> for EntryError {
    fn from(err: ExtractError) -> Self {
        match err {
            ExtractError::Upstream(e) => EntryError::Upstream(e),
            ExtractError::Schema(e) => EntryError::SchemaViolation(e),
        }
    }
}

impl EntryError {
    pub fn code(&self) -> &'static str {
        match self {
            EntryError::ArchiveRead(_) => "ARCHIVE_READ_ERROR",
            EntryError::DocumentParse(_) => "DOCUMENT_PARSE_ERROR",
            EntryError::UnextractableText { .. } => "UNEXTRACTABLE_TEXT",
            EntryError::Upstream(_) => "UPSTREAM_ERROR",
            EntryError::SchemaViolation(_) => "SCHEMA_VIOLATION",
        }
    }
}

/// One successfully parsed resume plus the archive path it came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchRow {
    #[serde(flatten)]
    pub record: ResumeRecord,
    pub file_name: String,
}

/// Operator-facing report for one failed entry. `stage` is the last stage
/// the entry reached before failing.
#[derive(Debug, Clone, Serialize)]
pub struct EntryDiagnostic {
    pub file_name: String,
    pub code: &'static str,
    pub stage: EntryStage,
    pub message: String,
}

impl EntryDiagnostic {
    pub fn new(file_name: String, stage: EntryStage, err: &EntryError) -> Self {
        Self {
            file_name,
            code: err.code(),
            stage,
            message: err.to_string(),
        }
    }
}

/// Accumulator for one run. Rows keep archive order; failed and skipped
/// entries never appear in `rows`.
#[derive(Debug, Default, Serialize)]
pub struct BatchResult {
    pub total_entries: usize,
    pub skipped: usize,
    pub failed: usize,
    pub rows: Vec<BatchRow>,
    pub diagnostics: Vec<EntryDiagnostic>,
}

impl BatchResult {
    pub fn new(total_entries: usize) -> Self {
        Self {
            total_entries,
            ..Default::default()
        }
    }

    pub fn succeeded(&self) -> usize {
        self.rows.len()
    }

    /// An export is only offered when at least one entry succeeded.
    pub fn export_available(&self) -> bool {
        !self.rows.is_empty()
    }

    pub(crate) fn push_row(&mut self, row: BatchRow) {
        self.rows.push(row);
    }

    pub(crate) fn record_skip(&mut self) {
        self.skipped += 1;
    }

    pub(crate) fn record_failure(&mut self, diagnostic: EntryDiagnostic) {
        self.failed += 1;
        self.diagnostics.push(diagnostic);
    }
}
