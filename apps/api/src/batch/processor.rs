//! BatchProcessor drives one archive through the extraction pipeline.
//!
//! Per entry: Selected → TextExtracted → Truncated → Submitted → Validated →
//! Accumulated, or Selected → Skipped, or any stage → Failed.
//!
//! Entries run strictly one after another (one document and one LLM call in
//! flight). A failing entry is converted to a diagnostic and counted; it never
//! aborts the batch.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::batch::archive::{classify_entry, ArchiveError, EntryPlan, ResumeArchive};
use crate::batch::types::{
    BatchResult, BatchRow, BatchSettings, EntryDiagnostic, EntryError, EntryStage,
};
use crate::extraction::text::is_viable;
use crate::extraction::{DocumentKind, ResumeExtractor, ResumeRecord, TextExtractor};
use crate::llm_client::CompletionService;

#[derive(Clone)]
pub struct BatchProcessor {
    completion: Arc<dyn CompletionService>,
    extractor: Arc<dyn TextExtractor>,
    settings: BatchSettings,
}

impl BatchProcessor {
    pub fn new(
        completion: Arc<dyn CompletionService>,
        extractor: Arc<dyn TextExtractor>,
        settings: BatchSettings,
    ) -> Self {
        Self {
            completion,
            extractor,
            settings,
        }
    }

    /// Processes every entry of `archive_bytes`.
    ///
    /// Only an unreadable container is an error; per-entry failures end up in
    /// `BatchResult::diagnostics`.
    pub async fn run(&self, archive_bytes: &[u8]) -> Result<BatchResult, ArchiveError> {
        let mut archive = ResumeArchive::open(archive_bytes)?;
        let mut result = BatchResult::new(archive.len());
        let resume_extractor =
            ResumeExtractor::new(self.completion.as_ref(), self.settings.max_prompt_chars);

        info!("Starting batch: {} archive entries", result.total_entries);

        for index in 0..result.total_entries {
            let file_name = archive.entry_name(index);

            let kind = match classify_entry(&file_name) {
                EntryPlan::Process(kind) => kind,
                EntryPlan::Skip(reason) => {
                    debug!("Skipping {file_name}: {reason:?}");
                    result.record_skip();
                    continue;
                }
            };

            let mut stage = EntryStage::Selected;
            match self
                .process_entry(&mut archive, index, kind, &resume_extractor, &mut stage)
                .await
            {
                Ok(record) => {
                    debug!("{file_name} -> {:?}", EntryStage::Accumulated);
                    result.push_row(BatchRow { record, file_name });
                }
                Err(err) => {
                    warn!("Failed parsing {file_name} at {stage:?}: {err}");
                    result.record_failure(EntryDiagnostic::new(file_name, stage, &err));
                }
            }
        }

        info!(
            "Batch finished: {} parsed, {} failed, {} skipped",
            result.succeeded(),
            result.failed,
            result.skipped
        );
        if !result.export_available() && result.failed > 0 {
            warn!("No resumes were parsed; {} entries failed", result.failed);
        }

        Ok(result)
    }

    /// Runs one selected entry to completion, advancing `stage` as it goes.
    async fn process_entry(
        &self,
        archive: &mut ResumeArchive<'_>,
        index: usize,
        kind: DocumentKind,
        resume_extractor: &ResumeExtractor<'_>,
        stage: &mut EntryStage,
    ) -> Result<ResumeRecord, EntryError> {
        let bytes = archive
            .read_entry(index)
            .map_err(|e| EntryError::ArchiveRead(e.to_string()))?;

        let text = self.extract_text(kind, bytes).await?;
        *stage = EntryStage::TextExtracted;

        if !is_viable(&text, self.settings.min_text_chars) {
            return Err(EntryError::UnextractableText {
                chars: text.trim().chars().count(),
                min: self.settings.min_text_chars,
            });
        }

        let prompt = resume_extractor.prompt_for(&text);
        *stage = EntryStage::Truncated;
        debug!("Submitting entry {index}: {} prompt characters", prompt.chars().count());

        *stage = EntryStage::Submitted;
        let record = resume_extractor.submit(&prompt).await?;
        *stage = EntryStage::Validated;

        Ok(record)
    }

    /// Document parsing is CPU-bound, so it runs on the blocking pool.
    async fn extract_text(&self, kind: DocumentKind, bytes: Vec<u8>) -> Result<String, EntryError> {
        let extractor = Arc::clone(&self.extractor);
        tokio::task::spawn_blocking(move || extractor.extract_text(kind, &bytes))
            .await
            .map_err(|e| {
                EntryError::DocumentParse(format!("{} extraction aborted: {e}", kind.as_str()))
            })?
            .map_err(|e| EntryError::DocumentParse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::io::Cursor;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::batch::archive::fixtures::build_zip;
    use crate::extraction::documents::fixtures::{make_test_docx, make_test_pdf};
    use crate::extraction::{DocumentTextExtractor, ExtractionError};
    use crate::llm_client::LlmError;

    /// Answers calls in order from a queue and records every prompt.
    struct ScriptedCompletion {
        replies: Mutex<VecDeque<Result<String, LlmError>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedCompletion {
        fn new(replies: Vec<Result<&str, LlmError>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(
                    replies
                        .into_iter()
                        .map(|r| r.map(str::to_string))
                        .collect(),
                ),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl CompletionService for ScriptedCompletion {
        async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(LlmError::EmptyContent))
        }
    }

    /// Treats entry bytes as UTF-8 text; bytes starting with "CORRUPT" fail.
    struct PlainTextExtractor;

    impl TextExtractor for PlainTextExtractor {
        fn extract_text(&self, kind: DocumentKind, bytes: &[u8]) -> Result<String, ExtractionError> {
            if bytes.starts_with(b"CORRUPT") {
                return Err(match kind {
                    DocumentKind::Pdf => ExtractionError::PdfParsing("bad xref".into()),
                    DocumentKind::Docx => ExtractionError::DocxParsing("bad zip".into()),
                });
            }
            Ok(String::from_utf8_lossy(bytes).into_owned())
        }
    }

    const RESUME_TEXT: &[u8] =
        b"Jane Doe\njane.doe@example.com\nSenior engineer with ten years of Rust and Go.";

    const JANE_JSON: &str = r#"{
        "name": "Jane Doe",
        "email": "jane.doe@example.com",
        "phone": null,
        "skills": ["Rust", "Go"],
        "education": null,
        "experience_summary": "Senior engineer",
        "linkedin": null,
        "github": null
    }"#;

    fn processor(
        completion: Arc<ScriptedCompletion>,
        extractor: Arc<dyn TextExtractor>,
    ) -> BatchProcessor {
        BatchProcessor::new(completion, extractor, BatchSettings::default())
    }

    fn assert_counts_add_up(result: &BatchResult) {
        assert_eq!(
            result.succeeded() + result.failed + result.skipped,
            result.total_entries
        );
    }

    #[tokio::test]
    async fn test_system_and_unsupported_entries_skipped_silently() {
        let zip = build_zip(&[
            ("__MACOSX/resume.pdf", RESUME_TEXT),
            ("notes.txt", RESUME_TEXT),
            ("resumes/", b""),
            ("resumes/jane.pdf", RESUME_TEXT),
        ]);
        let completion = ScriptedCompletion::new(vec![Ok(JANE_JSON)]);
        let result = processor(completion.clone(), Arc::new(PlainTextExtractor))
            .run(&zip)
            .await
            .unwrap();

        assert_eq!(result.total_entries, 4);
        assert_eq!(result.skipped, 3);
        assert_eq!(result.failed, 0);
        assert_eq!(result.succeeded(), 1);
        assert!(result.diagnostics.is_empty());
        assert_eq!(completion.calls(), 1);
        assert_counts_add_up(&result);
    }

    #[tokio::test]
    async fn test_two_page_pdf_resume_parsed() {
        let pdf = make_test_pdf(&[
            "Jane Doe jane.doe@example.com Senior Software Engineer",
            "Skills Rust Go Kubernetes PostgreSQL Distributed Systems",
        ]);
        let zip = build_zip(&[("resumes/jane.pdf", pdf.as_slice())]);
        let completion = ScriptedCompletion::new(vec![Ok(JANE_JSON)]);
        let result = processor(completion.clone(), Arc::new(DocumentTextExtractor))
            .run(&zip)
            .await
            .unwrap();

        assert_eq!(result.failed, 0, "diagnostics: {:?}", result.diagnostics);
        assert_eq!(result.succeeded(), 1);
        let row = &result.rows[0];
        assert_eq!(row.file_name, "resumes/jane.pdf");
        assert_eq!(row.record.name.as_deref(), Some("Jane Doe"));
        assert_eq!(row.record.email.as_deref(), Some("jane.doe@example.com"));
        assert!(!row.record.skills.is_empty());
        assert!(result.export_available());
        assert!(completion.prompts.lock().unwrap()[0].contains("Jane"));
    }

    #[tokio::test]
    async fn test_short_text_counted_as_failure_without_model_call() {
        let zip = build_zip(&[("tiny.pdf", b"0123456789")]);
        let completion = ScriptedCompletion::new(vec![Ok(JANE_JSON)]);
        let result = processor(completion.clone(), Arc::new(PlainTextExtractor))
            .run(&zip)
            .await
            .unwrap();

        assert_eq!(result.failed, 1);
        assert_eq!(result.succeeded(), 0);
        assert!(!result.export_available());
        assert_eq!(completion.calls(), 0);
        assert_eq!(result.diagnostics[0].code, "UNEXTRACTABLE_TEXT");
        assert_eq!(result.diagnostics[0].stage, EntryStage::TextExtracted);
        assert_counts_add_up(&result);
    }

    #[tokio::test]
    async fn test_corrupt_docx_isolated_and_order_preserved() {
        let pdf = make_test_pdf(&[
            "Jane Doe jane.doe@example.com Senior Software Engineer",
            "Skills Rust Go Kubernetes PostgreSQL Distributed Systems",
        ]);
        let docx = make_test_docx(&[
            "John Roe",
            "john.roe@example.com",
            "Data engineer experienced with Python, Spark and Airflow pipelines.",
        ]);
        let zip = build_zip(&[
            ("a_jane.pdf", pdf.as_slice()),
            ("b_broken.docx", b"this is not a docx container"),
            ("c_john.docx", docx.as_slice()),
        ]);
        let john_json = r#"{"name": "John Roe", "email": "john.roe@example.com", "skills": ["Python"]}"#;
        let completion = ScriptedCompletion::new(vec![Ok(JANE_JSON), Ok(john_json)]);
        let result = processor(completion.clone(), Arc::new(DocumentTextExtractor))
            .run(&zip)
            .await
            .unwrap();

        assert_eq!(result.succeeded(), 2);
        assert_eq!(result.failed, 1);
        let names: Vec<&str> = result.rows.iter().map(|r| r.file_name.as_str()).collect();
        assert_eq!(names, vec!["a_jane.pdf", "c_john.docx"]);
        assert_eq!(result.diagnostics[0].file_name, "b_broken.docx");
        assert_eq!(result.diagnostics[0].code, "DOCUMENT_PARSE_ERROR");
        assert_eq!(result.diagnostics[0].stage, EntryStage::Selected);
        assert_eq!(completion.calls(), 2);
        assert_counts_add_up(&result);
    }

    #[tokio::test]
    async fn test_skills_as_string_is_schema_violation() {
        let zip = build_zip(&[("jane.docx", RESUME_TEXT)]);
        let completion = ScriptedCompletion::new(vec![Ok(r#"{"skills": "Python, Go"}"#)]);
        let result = processor(completion, Arc::new(PlainTextExtractor))
            .run(&zip)
            .await
            .unwrap();

        assert_eq!(result.failed, 1);
        assert_eq!(result.succeeded(), 0);
        assert_eq!(result.diagnostics[0].code, "SCHEMA_VIOLATION");
        assert_eq!(result.diagnostics[0].stage, EntryStage::Submitted);
        assert!(result.diagnostics[0].message.contains("skills"));
    }

    #[tokio::test]
    async fn test_upstream_failure_does_not_abort_batch() {
        let zip = build_zip(&[("one.pdf", RESUME_TEXT), ("two.pdf", RESUME_TEXT)]);
        let completion = ScriptedCompletion::new(vec![
            Err(LlmError::Unauthorized {
                status: 401,
                message: "invalid x-api-key".into(),
            }),
            Ok(JANE_JSON),
        ]);
        let result = processor(completion, Arc::new(PlainTextExtractor))
            .run(&zip)
            .await
            .unwrap();

        assert_eq!(result.failed, 1);
        assert_eq!(result.succeeded(), 1);
        assert_eq!(result.diagnostics[0].file_name, "one.pdf");
        assert_eq!(result.diagnostics[0].code, "UPSTREAM_ERROR");
        assert_eq!(result.rows[0].file_name, "two.pdf");
    }

    /// Flips every byte of one entry's compressed payload so it fails its read.
    fn corrupt_entry_payload(zip_bytes: &mut [u8], index: usize) {
        let (start, len) = {
            let mut archive = zip::ZipArchive::new(Cursor::new(&*zip_bytes)).unwrap();
            let entry = archive.by_index_raw(index).unwrap();
            (entry.data_start() as usize, entry.compressed_size() as usize)
        };
        for byte in &mut zip_bytes[start..start + len] {
            *byte ^= 0xFF;
        }
    }

    #[tokio::test]
    async fn test_unreadable_entry_isolated() {
        let mut zip = build_zip(&[("a_damaged.pdf", RESUME_TEXT), ("b_jane.pdf", RESUME_TEXT)]);
        corrupt_entry_payload(&mut zip, 0);

        let completion = ScriptedCompletion::new(vec![Ok(JANE_JSON)]);
        let result = processor(completion.clone(), Arc::new(PlainTextExtractor))
            .run(&zip)
            .await
            .unwrap();

        assert_eq!(result.failed, 1);
        assert_eq!(result.succeeded(), 1);
        assert_eq!(result.diagnostics[0].file_name, "a_damaged.pdf");
        assert_eq!(result.diagnostics[0].code, "ARCHIVE_READ_ERROR");
        assert_eq!(result.diagnostics[0].stage, EntryStage::Selected);
        assert_eq!(result.rows[0].file_name, "b_jane.pdf");
        assert_eq!(completion.calls(), 1);
        assert_counts_add_up(&result);
    }

    #[tokio::test]
    async fn test_extractor_failure_counted() {
        let zip = build_zip(&[("bad.pdf", b"CORRUPT pdf bytes")]);
        let completion = ScriptedCompletion::new(vec![]);
        let result = processor(completion.clone(), Arc::new(PlainTextExtractor))
            .run(&zip)
            .await
            .unwrap();

        assert_eq!(result.failed, 1);
        assert!(result.diagnostics[0].message.contains("bad xref"));
        assert_eq!(completion.calls(), 0);
    }

    #[tokio::test]
    async fn test_long_text_truncated_before_submission() {
        let mut text = "r".repeat(120);
        text.push_str("BEYOND-BUDGET");
        let zip = build_zip(&[("long.pdf", text.as_bytes())]);
        let completion = ScriptedCompletion::new(vec![Ok("{}")]);
        let settings = BatchSettings {
            min_text_chars: 50,
            max_prompt_chars: 120,
        };
        let result = BatchProcessor::new(completion.clone(), Arc::new(PlainTextExtractor), settings)
            .run(&zip)
            .await
            .unwrap();

        assert_eq!(result.succeeded(), 1);
        let prompts = completion.prompts.lock().unwrap();
        assert!(prompts[0].contains(&"r".repeat(120)));
        assert!(!prompts[0].contains("BEYOND-BUDGET"));
    }

    #[tokio::test]
    async fn test_empty_archive_yields_empty_result() {
        let zip = build_zip(&[]);
        let result = processor(ScriptedCompletion::new(vec![]), Arc::new(PlainTextExtractor))
            .run(&zip)
            .await
            .unwrap();
        assert_eq!(result.total_entries, 0);
        assert!(!result.export_available());
    }

    #[tokio::test]
    async fn test_non_zip_upload_is_rejected() {
        let result = processor(ScriptedCompletion::new(vec![]), Arc::new(PlainTextExtractor))
            .run(b"plain bytes")
            .await;
        assert!(result.is_err());
    }
}
