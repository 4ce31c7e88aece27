//! Fixed-size worker pool
//!
//! Each worker:
//! - Owns one reusable read buffer for its whole lifetime
//! - Pulls jobs from the shared queue until it is closed and empty
//! - Hashes the file, emits its record, and marks the job complete
//!
//! Per-file failures are logged and counted; they never stop the worker.

use super::barrier::CompletionBarrier;
use super::digest::HashComputer;
use super::error::{HashrError, Result};
use super::job::{clean_extension, Job};
use super::output::{OutputFormat, OutputRecord, RecordSink};
use super::path_utils;
use super::scan::ScanCounters;
use crossbeam_channel::Receiver;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Everything a worker needs besides its own buffer
pub struct WorkerContext<W: Write + Send> {
    /// Scanned root, stripped from every key
    pub root: PathBuf,
    pub prefix: String,
    pub buffer_size: usize,
    pub sink: Arc<RecordSink<W>>,
    pub barrier: Arc<CompletionBarrier>,
    pub counters: Arc<ScanCounters>,
}

/// A worker thread consuming the job queue
struct Worker {
    id: usize,
    handle: Option<JoinHandle<()>>,
}

impl Worker {
    fn spawn<W>(id: usize, jobs: Receiver<Job>, context: Arc<WorkerContext<W>>) -> Result<Self>
    where
        W: Write + Send + 'static,
    {
        let handle = thread::Builder::new()
            .name(format!("hashr-worker-{}", id))
            .spawn(move || worker_loop(id, jobs, context))
            .map_err(|e| HashrError::WorkerSpawn {
                id,
                reason: e.to_string(),
            })?;

        Ok(Self {
            id,
            handle: Some(handle),
        })
    }

    fn join(mut self) -> Result<()> {
        match self.handle.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| HashrError::WorkerPanicked { id: self.id }),
            None => Ok(()),
        }
    }
}

/// The pool of hashing workers
pub struct WorkerPool {
    workers: Vec<Worker>,
}

impl WorkerPool {
    /// Start `size` workers sharing `jobs`
    ///
    /// The pool runs until every sender of the queue is dropped and the queue
    /// is empty.
    pub fn spawn<W>(size: usize, jobs: Receiver<Job>, context: Arc<WorkerContext<W>>) -> Result<Self>
    where
        W: Write + Send + 'static,
    {
        if size == 0 {
            return Err(HashrError::invalid_config("worker pool size must be at least 1"));
        }

        let mut workers = Vec::with_capacity(size);
        for id in 0..size {
            workers.push(Worker::spawn(id, jobs.clone(), Arc::clone(&context))?);
        }

        debug!(count = workers.len(), "Workers spawned");
        Ok(Self { workers })
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    /// Wait for every worker to exit, reporting the first panic
    pub fn join(self) -> Result<()> {
        let mut first_error = None;
        for worker in self.workers {
            if let Err(e) = worker.join() {
                warn!(error = %e, "Worker failed to join cleanly");
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

fn worker_loop<W: Write + Send>(id: usize, jobs: Receiver<Job>, context: Arc<WorkerContext<W>>) {
    let mut computer = HashComputer::with_buffer_size(context.buffer_size);

    for job in jobs.iter() {
        let _done = context.barrier.guard();

        match process_job(&context, &mut computer, &job) {
            Ok(bytes) => context.counters.record_hashed(bytes),
            Err(e) if e.is_per_file() => {
                warn!("Skipping {}: {}", job.path.display(), e);
                context.counters.record_failed();
            }
            Err(e) => {
                error!("Failed to process {}: {}", job.path.display(), e);
                context.counters.record_failed();
            }
        }
    }

    debug!(worker = id, "Job queue closed, worker exiting");
}

/// Hash one file and emit its record; returns the number of bytes hashed
pub fn process_job<W: Write + Send>(
    context: &WorkerContext<W>,
    computer: &mut HashComputer,
    job: &Job,
) -> Result<u64> {
    let start = Instant::now();
    let digests = computer.compute_file(&job.path)?;
    let key = path_utils::record_key(&context.root, &context.prefix, &job.path);

    let record = match context.sink.format() {
        OutputFormat::Plain => OutputRecord::plain(key, &digests),
        OutputFormat::Resp => match &job.metadata {
            Some(meta) => OutputRecord::resp(key, meta.size, &meta.extension, &digests),
            None => OutputRecord::resp(key, digests.bytes, &clean_extension(&job.path), &digests),
        },
    };

    context.sink.emit(&record)?;
    info!("Done {} in {:?}.", record.key, start.elapsed());

    Ok(digests.bytes)
}
