// Extraction pipeline: schema, prompt, validation, and document text.
// All model calls go through llm_client::CompletionService.

pub mod documents;
pub mod pipeline;
pub mod prompts;
pub mod schema;
pub mod text;
pub mod validator;

pub use documents::{DocumentKind, DocumentTextExtractor, ExtractionError, TextExtractor};
pub use pipeline::{ExtractError, ResumeExtractor};
pub use schema::{ResumeRecord, RESUME_FIELDS};
pub use validator::SchemaViolation;
