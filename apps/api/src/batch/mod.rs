// Batch processing: archive traversal, per-entry fault isolation, export.
// Entries are processed sequentially; see processor.rs.

pub mod archive;
pub mod export;
pub mod handlers;
pub mod processor;
pub mod types;

pub use processor::BatchProcessor;
pub use types::BatchSettings;
