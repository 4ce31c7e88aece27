// Work unit types handed from the walker to the workers

use std::path::{Path, PathBuf};

/// One discovered regular file waiting to be hashed
///
/// A job is moved into exactly one worker through the queue and never shared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub path: PathBuf,
    pub metadata: Option<JobMetadata>,
}

/// Stat-time facts carried along for the bulk-load format
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobMetadata {
    pub size: u64,
    /// Extension without the leading dot, pipes removed; empty when absent
    pub extension: String,
}

impl Job {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            metadata: None,
        }
    }

    pub fn with_metadata(path: impl Into<PathBuf>, size: u64) -> Self {
        let path = path.into();
        let metadata = JobMetadata::from_path(&path, size);
        Self {
            path,
            metadata: Some(metadata),
        }
    }
}

impl JobMetadata {
    pub fn from_path(path: &Path, size: u64) -> Self {
        Self {
            size,
            extension: clean_extension(path),
        }
    }
}

/// Extension field for a record: `Path::extension` semantics, so dotfiles
/// like `.bashrc` have none. Pipes would break the value's field layout.
pub fn clean_extension(path: &Path) -> String {
    path.extension()
        .map(|ext| ext.to_string_lossy().replace('|', ""))
        .unwrap_or_default()
}
