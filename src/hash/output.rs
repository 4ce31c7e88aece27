// Output record wire formats and the serialized writer
// Records go to the data stream only; diagnostics never share it

use super::digest::Digests;
use super::error::{HashrError, Result};
use std::io::Write;
use std::sync::{Mutex, PoisonError};

/// Collection name used by the bulk-load format when none is configured
pub const DEFAULT_COLLECTION: &str = "files";

/// Wire format for records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// `SET "<key>" "<md5>|<sha1>|<sha256>|<sha512>"` lines
    #[default]
    Plain,
    /// RESP `HSET <collection> <key> <size>|<ext>|<md5>|<sha1>|<sha256>|<sha512>` commands
    Resp,
}

impl OutputFormat {
    /// Whether jobs need size and extension attached at discovery time
    pub fn needs_metadata(self) -> bool {
        matches!(self, OutputFormat::Resp)
    }

    pub fn name(self) -> &'static str {
        match self {
            OutputFormat::Plain => "plain",
            OutputFormat::Resp => "resp",
        }
    }
}

/// One finished file, ready to serialize
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputRecord {
    /// Prefix-joined relative path, unescaped
    pub key: String,
    /// Pipe-delimited fields
    pub value: String,
}

impl OutputRecord {
    pub fn plain(key: impl Into<String>, digests: &Digests) -> Self {
        Self {
            key: key.into(),
            value: format!(
                "{}|{}|{}|{}",
                digests.md5, digests.sha1, digests.sha256, digests.sha512
            ),
        }
    }

    pub fn resp(key: impl Into<String>, size: u64, extension: &str, digests: &Digests) -> Self {
        Self {
            key: key.into(),
            value: format!(
                "{}|{}|{}|{}|{}|{}",
                size, extension, digests.md5, digests.sha1, digests.sha256, digests.sha512
            ),
        }
    }
}

/// Backslash before every double quote
pub fn escape_key(key: &str) -> String {
    key.replace('"', "\\\"")
}

pub fn encode_plain(record: &OutputRecord) -> Vec<u8> {
    format!("SET \"{}\" \"{}\"\n", escape_key(&record.key), record.value).into_bytes()
}

/// `*4` array of bulk strings: HSET, collection, key, value
pub fn encode_resp(collection: &str, record: &OutputRecord) -> Vec<u8> {
    let mut out = Vec::with_capacity(
        32 + collection.len() + record.key.len() + record.value.len(),
    );
    out.extend_from_slice(b"*4\r\n$4\r\nHSET\r\n");
    push_bulk_string(&mut out, collection.as_bytes());
    push_bulk_string(&mut out, record.key.as_bytes());
    push_bulk_string(&mut out, record.value.as_bytes());
    out
}

fn push_bulk_string(out: &mut Vec<u8>, bytes: &[u8]) {
    out.extend_from_slice(format!("${}\r\n", bytes.len()).as_bytes());
    out.extend_from_slice(bytes);
    out.extend_from_slice(b"\r\n");
}

/// Shared data-stream writer
///
/// Workers serialize their record first and only take the lock for the
/// write itself, so hashing and formatting stay fully concurrent while the
/// bytes of two records never interleave.
pub struct RecordSink<W: Write + Send> {
    format: OutputFormat,
    collection: String,
    writer: Mutex<W>,
}

impl<W: Write + Send> RecordSink<W> {
    pub fn new(writer: W, format: OutputFormat, collection: impl Into<String>) -> Self {
        Self {
            format,
            collection: collection.into(),
            writer: Mutex::new(writer),
        }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn encode(&self, record: &OutputRecord) -> Vec<u8> {
        match self.format {
            OutputFormat::Plain => encode_plain(record),
            OutputFormat::Resp => encode_resp(&self.collection, record),
        }
    }

    /// Write one record atomically with respect to other workers
    pub fn emit(&self, record: &OutputRecord) -> Result<()> {
        let bytes = self.encode(record);
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        writer.write_all(&bytes).map_err(|source| HashrError::Output {
            key: record.key.clone(),
            source,
        })
    }

    pub fn flush(&self) -> Result<()> {
        self.writer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .flush()
            .map_err(|e| HashrError::from_io_error(e, "flushing output"))
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}
