// Hash core library
// Concurrent multi-digest hashing of a directory tree into key/value load records

pub mod barrier;
pub mod digest;
pub mod error;
pub mod job;
pub mod output;
pub mod path_utils;
pub mod pool;
pub mod scan;

// Re-export commonly used types for convenience
pub use barrier::{CompletionBarrier, CompletionGuard, SENTINEL_BIAS};
pub use digest::{DigestSet, Digests, HashComputer, DEFAULT_BUFFER_SIZE};
pub use error::HashrError;
pub use job::{Job, JobMetadata};
pub use output::{OutputFormat, OutputRecord, RecordSink, DEFAULT_COLLECTION};
pub use pool::{WorkerContext, WorkerPool};
pub use scan::{ScanCounters, ScanEngine, ScanStats};
