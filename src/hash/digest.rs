// Multi-digest computation
// Streams one file through MD5, SHA-1, SHA-256 and SHA-512 in a single pass

use super::error::{HashrError, Result};
use md5::Md5;
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha512};
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

/// 2 MiB, large enough to amortize read syscalls
pub const DEFAULT_BUFFER_SIZE: usize = 1 << 21;

/// Finalized digests for one byte stream, lowercase hex
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Digests {
    pub md5: String,
    pub sha1: String,
    pub sha256: String,
    pub sha512: String,
    /// Number of bytes fed into the accumulators
    pub bytes: u64,
}

impl Digests {
    /// Digest an in-memory byte slice
    pub fn from_bytes(data: &[u8]) -> Self {
        let mut set = DigestSet::new();
        set.update(data);
        set.finalize()
    }
}

/// The four running accumulators for one job
///
/// Every chunk is fed to all four; the order between them does not matter
/// because they share no state.
pub struct DigestSet {
    md5: Md5,
    sha1: Sha1,
    sha256: Sha256,
    sha512: Sha512,
    bytes: u64,
}

impl DigestSet {
    pub fn new() -> Self {
        Self {
            md5: Md5::new(),
            sha1: Sha1::new(),
            sha256: Sha256::new(),
            sha512: Sha512::new(),
            bytes: 0,
        }
    }

    pub fn update(&mut self, chunk: &[u8]) {
        Digest::update(&mut self.md5, chunk);
        Digest::update(&mut self.sha1, chunk);
        Digest::update(&mut self.sha256, chunk);
        Digest::update(&mut self.sha512, chunk);
        self.bytes += chunk.len() as u64;
    }

    pub fn finalize(self) -> Digests {
        Digests {
            md5: hex::encode(self.md5.finalize()),
            sha1: hex::encode(self.sha1.finalize()),
            sha256: hex::encode(self.sha256.finalize()),
            sha512: hex::encode(self.sha512.finalize()),
            bytes: self.bytes,
        }
    }
}

impl Default for DigestSet {
    fn default() -> Self {
        Self::new()
    }
}

/// Hash computer owning one reusable read buffer
///
/// A worker keeps a single computer for its whole lifetime so the buffer is
/// allocated once rather than per file.
pub struct HashComputer {
    buffer: Vec<u8>,
}

impl HashComputer {
    /// Create a HashComputer with the default 2 MiB buffer
    pub fn new() -> Self {
        Self::with_buffer_size(DEFAULT_BUFFER_SIZE)
    }

    /// Create a HashComputer with a custom buffer size (at least one byte)
    pub fn with_buffer_size(buffer_size: usize) -> Self {
        Self {
            buffer: vec![0u8; buffer_size.max(1)],
        }
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer.len()
    }

    /// Open `path` and hash its full contents
    ///
    /// The file handle is dropped before this returns.
    pub fn compute_file(&mut self, path: &Path) -> Result<Digests> {
        let mut file = File::open(path).map_err(|e| HashrError::open(path, e))?;
        self.compute_reader(&mut file, path)
    }

    /// Hash everything `reader` yields until end of stream
    ///
    /// The reader is not closed. Any read error other than `Interrupted`
    /// aborts without finalizing and is reported against `path`.
    pub fn compute_reader<R: Read>(&mut self, reader: &mut R, path: &Path) -> Result<Digests> {
        let mut set = DigestSet::new();

        loop {
            let bytes_read = match reader.read(&mut self.buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(HashrError::read(path, e)),
            };
            set.update(&self.buffer[..bytes_read]);
        }

        Ok(set.finalize())
    }
}

impl Default for HashComputer {
    fn default() -> Self {
        Self::new()
    }
}
