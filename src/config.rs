//! Configuration types for hashr
//!
//! This module defines:
//! - CLI argument parsing using clap derive macros
//! - Runtime configuration with validation

use crate::hash::error::{HashrError, Result};
use crate::hash::{OutputFormat, ScanEngine, DEFAULT_BUFFER_SIZE, DEFAULT_COLLECTION};
use clap::Parser;
use std::ffi::OsString;
use std::path::PathBuf;

/// Maximum reasonable worker count
const MAX_THREADS: usize = 1024;

/// Hash every file under a directory with MD5, SHA-1, SHA-256 and SHA-512
#[derive(Parser, Debug, Clone)]
#[command(
    name = "hashr",
    version,
    about = "Hash every file under a directory with MD5, SHA-1, SHA-256 and SHA-512",
    long_about = "Walks a directory tree and hashes every regular file concurrently.\n\n\
                  Emits one key/value load command per file on stdout; progress and \
                  errors go to stderr.",
    after_help = "EXAMPLES:\n    \
        hashr /data > hashes.txt\n    \
        hashr /data --threads 8 --prefix backup/2024\n    \
        hashr /data --format resp --key checksums | redis-cli --pipe"
)]
pub struct CliArgs {
    /// Directory to scan
    #[arg(value_name = "DIRECTORY")]
    pub root: PathBuf,

    /// Number of files to process simultaneously
    #[arg(short, long, default_value_t = default_threads(), value_name = "N")]
    pub threads: usize,

    /// Path prefix joined in front of every key
    #[arg(short, long, default_value = "", value_name = "P")]
    pub prefix: String,

    /// Hash key the bulk-load format writes into
    #[arg(short, long, default_value = DEFAULT_COLLECTION, value_name = "K")]
    pub key: String,

    /// Output wire format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Plain)]
    pub format: OutputFormat,

    /// Read buffer size per worker, in bytes
    #[arg(long, default_value_t = DEFAULT_BUFFER_SIZE, value_name = "BYTES")]
    pub buffer_size: usize,

    /// Jobs allowed to wait in the queue (0 = hand off directly to a worker)
    #[arg(long, default_value_t = 0, value_name = "N")]
    pub queue_depth: usize,

    /// Follow symbolic links instead of skipping them
    #[arg(long)]
    pub follow_links: bool,

    /// Show a progress spinner on stderr
    #[arg(long)]
    pub progress: bool,

    /// Write run statistics as JSON to this file
    #[arg(long, value_name = "FILE")]
    pub stats: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

/// Default worker count: one per available processing unit
fn default_threads() -> usize {
    num_cpus::get().max(1)
}

/// True when usage should be printed instead of running
///
/// That is the case with no directory argument, or when the first argument
/// mentions "help" in any form (`help`, `-help`, `--help`).
pub fn wants_usage<I, S>(args: I) -> bool
where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
{
    let mut args = args.into_iter().skip(1);
    match args.next() {
        None => true,
        Some(first) => first.into().to_string_lossy().contains("help"),
    }
}

/// Validated runtime configuration
#[derive(Debug, Clone)]
pub struct HashrConfig {
    pub root: PathBuf,
    pub threads: usize,
    pub prefix: String,
    pub collection: String,
    pub format: OutputFormat,
    pub buffer_size: usize,
    pub queue_depth: usize,
    pub follow_links: bool,
    pub show_progress: bool,
    pub stats_path: Option<PathBuf>,
    pub verbose: u8,
    pub quiet: bool,
}

impl HashrConfig {
    /// Create configuration from CLI arguments
    pub fn from_args(args: CliArgs) -> Result<Self> {
        if args.threads == 0 {
            return Err(HashrError::invalid_config("--threads must be at least 1"));
        }
        if args.threads > MAX_THREADS {
            return Err(HashrError::invalid_config(format!(
                "--threads must be at most {}",
                MAX_THREADS
            )));
        }
        if args.buffer_size == 0 {
            return Err(HashrError::invalid_config("--buffer-size must be at least 1"));
        }
        if args.key.is_empty() {
            return Err(HashrError::invalid_config("--key must not be empty"));
        }
        if !args.root.is_dir() {
            return Err(HashrError::invalid_config(format!(
                "{} is not a directory",
                args.root.display()
            )));
        }

        Ok(Self {
            root: args.root,
            threads: args.threads,
            prefix: args.prefix,
            collection: args.key,
            format: args.format,
            buffer_size: args.buffer_size,
            queue_depth: args.queue_depth,
            follow_links: args.follow_links,
            show_progress: args.progress,
            stats_path: args.stats,
            verbose: args.verbose,
            quiet: args.quiet,
        })
    }

    /// Default log filter directive for the chosen verbosity
    pub fn log_level(&self) -> &'static str {
        match (self.quiet, self.verbose) {
            (true, _) => "warn",
            (false, 0) => "info",
            (false, 1) => "debug",
            (false, _) => "trace",
        }
    }

    /// Build the scan engine this configuration describes
    pub fn scan_engine(&self) -> ScanEngine {
        ScanEngine::new(self.root.clone())
            .with_threads(self.threads)
            .with_prefix(self.prefix.clone())
            .with_collection(self.collection.clone())
            .with_format(self.format)
            .with_buffer_size(self.buffer_size)
            .with_queue_depth(self.queue_depth)
            .with_follow_links(self.follow_links)
            .with_progress(self.show_progress)
    }
}
