// Centralized error handling module
// Per-file failures (open, read, output) are local to one job; everything else ends the run

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for hashr
#[derive(Error, Debug)]
pub enum HashrError {
    /// The directory walk could not stat or descend into a path
    #[error("failed to traverse {}: {reason}", path.display())]
    Traversal { path: PathBuf, reason: String },

    /// A discovered file could not be opened
    #[error("failed to open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A file errored mid-stream
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A finished record could not be written to the data stream
    #[error("failed to write record for {key}: {source}")]
    Output {
        key: String,
        #[source]
        source: io::Error,
    },

    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("failed to spawn worker {id}: {reason}")]
    WorkerSpawn { id: usize, reason: String },

    #[error("worker {id} panicked")]
    WorkerPanicked { id: usize },

    /// Every worker is gone while the walk still has jobs to hand out
    #[error("job queue closed before discovery finished")]
    QueueClosed,

    /// Any other I/O failure, tagged with what was being done
    #[error("I/O error while {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: io::Error,
    },
}

impl HashrError {
    pub fn open(path: impl Into<PathBuf>, source: io::Error) -> Self {
        HashrError::Open { path: path.into(), source }
    }

    pub fn read(path: impl Into<PathBuf>, source: io::Error) -> Self {
        HashrError::Read { path: path.into(), source }
    }

    pub fn invalid_config(message: impl Into<String>) -> Self {
        HashrError::InvalidConfig { message: message.into() }
    }

    /// Create an Io error with context about the operation
    pub fn from_io_error(source: io::Error, operation: &str) -> Self {
        HashrError::Io {
            operation: operation.to_string(),
            source,
        }
    }

    /// True for failures that only skip one file and never abort the run
    pub fn is_per_file(&self) -> bool {
        matches!(
            self,
            HashrError::Open { .. } | HashrError::Read { .. } | HashrError::Output { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, HashrError>;
