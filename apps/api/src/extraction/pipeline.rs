//! Single-document extraction: text → truncated text → prompt → completion → record.
//!
//! The two halves are exposed separately so the batch loop can track which
//! stage an entry reached.

use thiserror::Error;
use tracing::debug;

use crate::extraction::prompts::build_prompt;
use crate::extraction::schema::{format_instructions, ResumeRecord};
use crate::extraction::text::truncate_chars;
use crate::extraction::validator::SchemaViolation;
use crate::llm_client::{CompletionService, LlmError};

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Upstream error: {0}")]
    Upstream(#[from] LlmError),

    #[error("Schema violation: {0}")]
    Schema(#[from] SchemaViolation),
}

/// Runs the model-facing half of the pipeline for one resume.
pub struct ResumeExtractor<'a> {
    completion: &'a dyn CompletionService,
    format_instructions: String,
    max_prompt_chars: usize,
}

impl<'a> ResumeExtractor<'a> {
    pub fn new(completion: &'a dyn CompletionService, max_prompt_chars: usize) -> Self {
        Self {
            completion,
            format_instructions: format_instructions(),
            max_prompt_chars,
        }
    }

    /// The prompt that would be submitted for `text`.
    pub fn prompt_for(&self, text: &str) -> String {
        let truncated = truncate_chars(text, self.max_prompt_chars);
        if truncated.len() < text.len() {
            debug!(
                "Truncated resume text to {} characters",
                self.max_prompt_chars
            );
        }
        build_prompt(truncated, &self.format_instructions)
    }

    /// Sends a rendered prompt and validates the model's answer.
    pub async fn submit(&self, prompt: &str) -> Result<ResumeRecord, ExtractError> {
        let raw = self.completion.complete(prompt).await?;
        Ok(ResumeRecord::parse(&raw)?)
    }
}
