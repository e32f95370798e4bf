//! Document text extraction for the supported resume formats.
//!
//! `TextExtractor` is the seam: the batch loop only sees bytes in and text out.
//! `DocumentTextExtractor` is the production backend (pdf-extract + docx-rs).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("PDF parsing failed: {0}")]
    PdfParsing(String),

    #[error("DOCX parsing failed: {0}")]
    DocxParsing(String),
}

/// Resume formats accepted from an archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Docx,
}

impl DocumentKind {
    /// Detects the kind from an entry path's extension (case-insensitive).
    pub fn from_path(path: &str) -> Option<Self> {
        let file_name = path.rsplit('/').next().unwrap_or(path);
        let (stem, ext) = file_name.rsplit_once('.')?;
        if stem.is_empty() {
            return None;
        }
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(DocumentKind::Pdf),
            "docx" => Some(DocumentKind::Docx),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Pdf => "pdf",
            DocumentKind::Docx => "docx",
        }
    }
}

/// Turns document bytes into plain text. Empty string when nothing is extractable.
pub trait TextExtractor: Send + Sync {
    fn extract_text(&self, kind: DocumentKind, bytes: &[u8]) -> Result<String, ExtractionError>;
}

pub struct DocumentTextExtractor;

impl TextExtractor for DocumentTextExtractor {
    fn extract_text(&self, kind: DocumentKind, bytes: &[u8]) -> Result<String, ExtractionError> {
        match kind {
            DocumentKind::Pdf => extract_pdf_text(bytes),
            DocumentKind::Docx => extract_docx_text(bytes),
        }
    }
}

/// Page texts joined by newlines.
fn extract_pdf_text(bytes: &[u8]) -> Result<String, ExtractionError> {
    let pages = pdf_extract::extract_text_from_mem_by_pages(bytes)
        .map_err(|e| ExtractionError::PdfParsing(e.to_string()))?;
    Ok(pages.join("\n"))
}

/// Top-level paragraph texts joined by newlines.
fn extract_docx_text(bytes: &[u8]) -> Result<String, ExtractionError> {
    use docx_rs::DocumentChild;

    let docx = docx_rs::read_docx(bytes).map_err(|e| ExtractionError::DocxParsing(e.to_string()))?;

    let paragraphs: Vec<String> = docx
        .document
        .children
        .iter()
        .filter_map(|child| match child {
            DocumentChild::Paragraph(p) => Some(p),
            _ => None,
        })
        .map(|p| {
            let mut text = String::new();
            push_paragraph_text(&p.children, &mut text);
            text
        })
        .collect();

    Ok(paragraphs.join("\n"))
}

/// Hyperlinks and tracked insertions are part of the visible text; deletions are not.
fn push_paragraph_text(children: &[docx_rs::ParagraphChild], out: &mut String) {
    use docx_rs::{InsertChild, ParagraphChild};

    for child in children {
        match child {
            ParagraphChild::Run(run) => push_run_text(run, out),
            ParagraphChild::Hyperlink(link) => push_paragraph_text(&link.children, out),
            ParagraphChild::Insert(insert) => {
                for inserted in &insert.children {
                    if let InsertChild::Run(run) = inserted {
                        push_run_text(run, out);
                    }
                }
            }
            _ => {}
        }
    }
}

fn push_run_text(run: &docx_rs::Run, out: &mut String) {
    use docx_rs::RunChild;

    for run_child in &run.children {
        match run_child {
            RunChild::Text(t) => out.push_str(&t.text),
            RunChild::Tab(_) => out.push('\t'),
            RunChild::Break(_) => out.push('\n'),
            _ => {}
        }
    }
}
