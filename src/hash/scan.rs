// Directory scanning module
// Drives the walk, the worker pool and the completion barrier for one run

use super::barrier::CompletionBarrier;
use super::digest::DEFAULT_BUFFER_SIZE;
use super::error::{HashrError, Result};
use super::job::Job;
use super::output::{OutputFormat, RecordSink, DEFAULT_COLLECTION};
use super::pool::{WorkerContext, WorkerPool};
use crossbeam_channel::{bounded, Sender};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use jwalk::{Parallelism, WalkDir};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Statistics collected during a directory scan
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ScanStats {
    pub files_discovered: u64,
    pub files_hashed: u64,
    pub files_failed: u64,
    pub bytes_hashed: u64,
    #[serde(serialize_with = "serialize_duration")]
    pub duration: Duration,
}

impl ScanStats {
    pub fn throughput_mbps(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs > 0.0 {
            (self.bytes_hashed as f64 / 1_048_576.0) / secs
        } else {
            0.0
        }
    }
}

// Helper function to serialize Duration as seconds
fn serialize_duration<S>(duration: &Duration, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_f64(duration.as_secs_f64())
}

/// Lock-free counters shared by the walker and the workers
#[derive(Default)]
pub struct ScanCounters {
    discovered: AtomicU64,
    hashed: AtomicU64,
    failed: AtomicU64,
    bytes: AtomicU64,
    progress: Option<ProgressBar>,
}

impl ScanCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_progress(progress: ProgressBar) -> Self {
        Self {
            progress: Some(progress),
            ..Self::default()
        }
    }

    pub fn record_discovered(&self) {
        self.discovered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_hashed(&self, bytes: u64) {
        self.hashed.fetch_add(1, Ordering::Relaxed);
        self.bytes.fetch_add(bytes, Ordering::Relaxed);
        if let Some(ref pb) = self.progress {
            pb.inc(1);
        }
    }

    pub fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
        if let Some(ref pb) = self.progress {
            pb.inc(1);
        }
    }

    pub fn snapshot(&self, duration: Duration) -> ScanStats {
        ScanStats {
            files_discovered: self.discovered.load(Ordering::Relaxed),
            files_hashed: self.hashed.load(Ordering::Relaxed),
            files_failed: self.failed.load(Ordering::Relaxed),
            bytes_hashed: self.bytes.load(Ordering::Relaxed),
            duration,
        }
    }
}

/// Engine for hashing every regular file under a root directory
pub struct ScanEngine {
    root: PathBuf,
    threads: usize,
    prefix: String,
    collection: String,
    format: OutputFormat,
    buffer_size: usize,
    queue_depth: usize,
    follow_links: bool,
    show_progress: bool,
}

impl ScanEngine {
    /// Create a ScanEngine with default settings: one worker per CPU,
    /// plain output, 2 MiB buffers and a rendezvous queue
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            threads: num_cpus::get().max(1),
            prefix: String::new(),
            collection: DEFAULT_COLLECTION.to_string(),
            format: OutputFormat::Plain,
            buffer_size: DEFAULT_BUFFER_SIZE,
            queue_depth: 0,
            follow_links: false,
            show_progress: false,
        }
    }

    /// Set the number of hashing workers (must be at least 1)
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Set the path prefix joined in front of every key
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Set the collection the bulk-load format writes into
    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    /// Set the output format
    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    /// Set the per-worker read buffer size
    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    /// Set how many jobs may wait in the queue; 0 hands each job directly to a worker
    pub fn with_queue_depth(mut self, queue_depth: usize) -> Self {
        self.queue_depth = queue_depth;
        self
    }

    /// Follow symlinks during the walk instead of skipping them
    pub fn with_follow_links(mut self, follow_links: bool) -> Self {
        self.follow_links = follow_links;
        self
    }

    /// Draw a progress spinner on stderr
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Hash the tree, writing records to `writer`
    pub fn run<W>(&self, writer: W) -> Result<ScanStats>
    where
        W: Write + Send + 'static,
    {
        let sink = Arc::new(RecordSink::new(writer, self.format, self.collection.clone()));
        self.run_into(sink)
    }

    /// Hash the tree into an existing sink
    ///
    /// A traversal failure stops discovery, but every job already handed to
    /// the pool is still drained and written before the error is returned.
    pub fn run_into<W>(&self, sink: Arc<RecordSink<W>>) -> Result<ScanStats>
    where
        W: Write + Send + 'static,
    {
        if self.buffer_size == 0 {
            return Err(HashrError::invalid_config("buffer size must be at least 1 byte"));
        }

        let start_time = Instant::now();
        let progress = self.show_progress.then(new_spinner);

        let barrier = Arc::new(CompletionBarrier::new());
        let counters = Arc::new(match progress {
            Some(ref pb) => ScanCounters::with_progress(pb.clone()),
            None => ScanCounters::new(),
        });

        let context = Arc::new(WorkerContext {
            root: self.root.clone(),
            prefix: self.prefix.clone(),
            buffer_size: self.buffer_size,
            sink: Arc::clone(&sink),
            barrier: Arc::clone(&barrier),
            counters: Arc::clone(&counters),
        });

        let (sender, receiver) = bounded::<Job>(self.queue_depth);
        let pool = WorkerPool::spawn(self.threads, receiver, context)?;
        debug!(
            root = %self.root.display(),
            workers = pool.len(),
            format = self.format.name(),
            "Scan started"
        );

        let walk_result = self.discover(&sender, &barrier, &counters);
        barrier.finish_discovery();
        if let Some(ref pb) = progress {
            pb.set_message("draining");
        }

        barrier.wait();
        drop(sender);

        let join_result = pool.join();
        let flush_result = sink.flush();

        if let Some(pb) = progress {
            pb.finish_and_clear();
        }

        walk_result?;
        join_result?;
        flush_result?;

        Ok(counters.snapshot(start_time.elapsed()))
    }

    /// Walk the tree depth-first and hand one job per regular file to the pool
    ///
    /// This is the producer side; it stops at the first traversal error.
    fn discover(
        &self,
        sender: &Sender<Job>,
        barrier: &CompletionBarrier,
        counters: &ScanCounters,
    ) -> Result<()> {
        let walker = WalkDir::new(&self.root)
            .parallelism(Parallelism::Serial)
            .sort(true)
            .skip_hidden(false)
            .follow_links(self.follow_links);

        for entry_result in walker {
            let entry = entry_result.map_err(|e| HashrError::Traversal {
                path: e.path().map(Path::to_path_buf).unwrap_or_else(|| self.root.clone()),
                reason: e.to_string(),
            })?;

            // Directories, symlinks and special files are never jobs
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let job = if self.format.needs_metadata() {
                let metadata = entry.metadata().map_err(|e| HashrError::Traversal {
                    path: path.clone(),
                    reason: e.to_string(),
                })?;
                Job::with_metadata(path, metadata.len())
            } else {
                Job::new(path)
            };

            barrier.enqueue();
            if sender.send(job).is_err() {
                barrier.complete();
                return Err(HashrError::QueueClosed);
            }
            counters.record_discovered();
        }

        Ok(())
    }
}

fn new_spinner() -> ProgressBar {
    let pb = ProgressBar::with_draw_target(None, ProgressDrawTarget::stderr());
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {pos} files hashed ({msg})")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
    );
    pb.set_message("discovering");
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
