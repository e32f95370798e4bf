//! Axum route handlers for the Batch API.

use axum::{
    extract::{Multipart, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::batch::export::{rows_to_csv, CSV_FILE_NAME};
use crate::batch::types::{BatchResult, BatchRow, EntryDiagnostic};
use crate::errors::AppError;
use crate::state::AppState;

const ARCHIVE_FIELD: &str = "archive";

// ────────────────────────────────────────────────────────────────────────────
// Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct BatchReport {
    pub batch_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub total_entries: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub export_available: bool,
    pub rows: Vec<BatchRow>,
    pub diagnostics: Vec<EntryDiagnostic>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/batches
///
/// Parses every resume in the uploaded ZIP and returns the rows plus per-entry
/// diagnostics. Always 200 once the archive itself could be opened.
pub async fn handle_parse_batch(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<BatchReport>, AppError> {
    let archive = read_archive_field(multipart).await?;
    let batch_id = Uuid::new_v4();
    let started_at = Utc::now();

    info!("Batch {batch_id}: received {} byte archive", archive.len());
    let result = run_batch(&state, &archive).await?;
    let finished_at = Utc::now();

    Ok(Json(BatchReport {
        batch_id,
        started_at,
        finished_at,
        total_entries: result.total_entries,
        succeeded: result.succeeded(),
        failed: result.failed,
        skipped: result.skipped,
        export_available: result.export_available(),
        rows: result.rows,
        diagnostics: result.diagnostics,
    }))
}

/// POST /api/v1/batches/csv
///
/// Same pipeline, but answers with the CSV download. With zero successful
/// entries there is nothing to download and the request fails with 422.
pub async fn handle_export_csv(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let archive = read_archive_field(multipart).await?;
    let result = run_batch(&state, &archive).await?;

    if !result.export_available() {
        return Err(AppError::UnprocessableEntity(format!(
            "No resumes could be parsed: {} failed, {} skipped",
            result.failed, result.skipped
        )));
    }

    let csv = rows_to_csv(&result.rows).map_err(|e| AppError::Export(e.to_string()))?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{CSV_FILE_NAME}\""),
            ),
            (
                header::HeaderName::from_static("x-resumes-parsed"),
                result.succeeded().to_string(),
            ),
            (
                header::HeaderName::from_static("x-resumes-failed"),
                result.failed.to_string(),
            ),
        ],
        csv,
    )
        .into_response())
}

async fn run_batch(state: &AppState, archive: &[u8]) -> Result<BatchResult, AppError> {
    state
        .processor
        .run(archive)
        .await
        .map_err(|e| AppError::Validation(e.to_string()))
}

/// Pulls the ZIP upload out of the multipart body.
async fn read_archive_field(mut multipart: Multipart) -> Result<Bytes, AppError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(ARCHIVE_FIELD) {
            let bytes = field.bytes().await?;
            if bytes.is_empty() {
                return Err(AppError::Validation(format!(
                    "multipart field '{ARCHIVE_FIELD}' is empty"
                )));
            }
            return Ok(bytes);
        }
    }
    Err(AppError::Validation(format!(
        "multipart field '{ARCHIVE_FIELD}' is required"
    )))
}
