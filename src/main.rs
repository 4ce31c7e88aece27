//! hashr - concurrent multi-digest tree hasher
//!
//! Entry point for the CLI application. Records go to stdout, everything
//! else goes to stderr.

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use hashr::config::{self, CliArgs, HashrConfig};
use hashr::hash::ScanStats;
use humansize::{format_size, BINARY};
use std::fs::File;
use std::io::{self, BufWriter, IsTerminal, Write};
use std::path::Path;
use std::process::ExitCode;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    if config::wants_usage(std::env::args_os()) {
        print_usage();
        return ExitCode::from(2);
    }

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    // Parse CLI arguments
    let args = CliArgs::parse();

    // Validate and create config
    let config = HashrConfig::from_args(args).context("Invalid configuration")?;

    // Setup logging
    setup_logging(config.log_level())?;

    info!(
        root = %config.root.display(),
        threads = config.threads,
        format = config.format.name(),
        "Hashing directory"
    );

    let stdout = BufWriter::new(io::stdout());
    let stats = config.scan_engine().run(stdout).context("Scan failed")?;

    print_summary(&stats);

    if let Some(ref path) = config.stats_path {
        write_stats(path, &stats)?;
    }

    Ok(())
}

fn print_usage() {
    let mut command = CliArgs::command();
    eprintln!("{}", command.render_help());
}

fn setup_logging(level: &str) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(format!("hashr={},warn", level))
            .context("Invalid log filter")?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    Ok(())
}

/// Log a summary of the run
fn print_summary(stats: &ScanStats) {
    info!(
        files = stats.files_hashed,
        failed = stats.files_failed,
        "Hashed {} files ({}) in {:.2}s, {:.2} MB/s",
        stats.files_hashed,
        format_size(stats.bytes_hashed, BINARY),
        stats.duration.as_secs_f64(),
        stats.throughput_mbps(),
    );

    if stats.files_failed > 0 {
        warn!(failed = stats.files_failed, "Some files could not be hashed");
    }
}

fn write_stats(path: &Path, stats: &ScanStats) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create stats file {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, stats)
        .with_context(|| format!("Failed to write stats file {}", path.display()))?;
    writer
        .flush()
        .with_context(|| format!("Failed to flush stats file {}", path.display()))?;
    Ok(())
}
