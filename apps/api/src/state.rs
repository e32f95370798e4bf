use crate::batch::BatchProcessor;
use crate::config::Config;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Owns the completion service and text extractor; cheap to clone.
    pub processor: BatchProcessor,
    pub config: Config,
}
