//! ZIP container access and the entry skip policy.

use std::io::{Cursor, Read};

use thiserror::Error;
use zip::result::ZipError;
use zip::ZipArchive;

use crate::extraction::DocumentKind;

const SYSTEM_METADATA_SEGMENT: &str = "__MACOSX";

/// The upload itself could not be opened; no entry was processed.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Upload is not a readable ZIP archive: {0}")]
    Unreadable(#[from] ZipError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Directory,
    SystemMetadata,
    UnsupportedExtension,
}

/// What the batch loop should do with an entry, decided from its path alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryPlan {
    Process(DocumentKind),
    Skip(SkipReason),
}

pub fn classify_entry(name: &str) -> EntryPlan {
    if name.ends_with('/') {
        return EntryPlan::Skip(SkipReason::Directory);
    }
    if name.split('/').any(|segment| segment == SYSTEM_METADATA_SEGMENT) {
        return EntryPlan::Skip(SkipReason::SystemMetadata);
    }
    match DocumentKind::from_path(name) {
        Some(kind) => EntryPlan::Process(kind),
        None => EntryPlan::Skip(SkipReason::UnsupportedExtension),
    }
}

/// An in-memory archive, read entry by entry in central-directory order.
pub struct ResumeArchive<'a> {
    zip: ZipArchive<Cursor<&'a [u8]>>,
}

impl<'a> ResumeArchive<'a> {
    pub fn open(bytes: &'a [u8]) -> Result<Self, ArchiveError> {
        Ok(Self {
            zip: ZipArchive::new(Cursor::new(bytes))?,
        })
    }

    pub fn len(&self) -> usize {
        self.zip.len()
    }

    pub fn entry_name(&self, index: usize) -> String {
        self.zip
            .name_for_index(index)
            .map(str::to_string)
            .unwrap_or_else(|| format!("<entry {index}>"))
    }

    /// Reads one entry fully into memory.
    pub fn read_entry(&mut self, index: usize) -> Result<Vec<u8>, ZipError> {
        let mut file = self.zip.by_index(index)?;
        // Declared sizes are untrusted, so no pre-allocation.
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)?;
        Ok(bytes)
    }
}
