//! Bounded producer/worker pipeline that hashes candidates and emits pairs.
//!
//! # Overview
//!
//! The calling thread acts as the producer: it pulls candidates from a
//! lazy source and pushes them into a bounded channel. When the channel is
//! full the producer blocks, so enumeration never runs far ahead of
//! hashing. A fixed pool of worker threads drains the channel; each worker
//! hashes its candidate, consults the shared [`DigestRegistry`] and, when
//! the digest was already known, hands the resulting [`DuplicatePair`] to
//! the [`DuplicateHandler`] before taking the next item.
//!
//! A run ends once the source is exhausted (or shutdown is requested), the
//! channel is closed and every worker has been joined.
//!
//! # Example
//!
//! ```no_run
//! use dupelink::duplicates::{DuplicateFinder, DuplicateHandler, DuplicatePair, FinderConfig, PairOutcome};
//! use dupelink::scanner::{CandidateSource, Hasher, WalkerConfig};
//! use std::path::PathBuf;
//! use std::sync::Arc;
//!
//! struct Print;
//! impl DuplicateHandler for Print {
//!     fn handle(&self, pair: &DuplicatePair) -> PairOutcome {
//!         println!("{} == {}", pair.duplicate.display(), pair.original.display());
//!         PairOutcome::default()
//!     }
//! }
//!
//! let finder = DuplicateFinder::new(FinderConfig::default().with_workers(4), Hasher::default());
//! let source = CandidateSource::Roots(vec![PathBuf::from(".")]);
//! let summary = finder.run_source(&source, WalkerConfig::default(), Arc::new(Print)).unwrap();
//! println!("{} duplicate pairs", summary.duplicate_pairs);
//! ```

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use bytesize::ByteSize;
use crossbeam_channel::Receiver;

use super::{same_entry, DigestRegistry, DuplicateHandler, DuplicatePair, PairOutcome};
use crate::scanner::{CandidatePath, CandidateSource, Hasher, ScanError, WalkerConfig};

/// Default capacity of the candidate queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// One fewer than the available CPUs, and never less than one.
#[must_use]
pub fn default_worker_count() -> usize {
    thread::available_parallelism()
        .map(|n| n.get().saturating_sub(1))
        .unwrap_or(1)
        .max(1)
}

/// Configuration for the hashing pipeline.
#[derive(Debug, Clone)]
pub struct FinderConfig {
    /// Number of hashing worker threads.
    pub workers: usize,
    /// Capacity of the bounded candidate queue.
    pub queue_capacity: usize,
    /// Optional shutdown flag for graceful termination.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            workers: default_worker_count(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            shutdown_flag: None,
        }
    }
}

impl FinderConfig {
    /// Set the number of worker threads (minimum 1).
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Set the queue capacity (minimum 1).
    #[must_use]
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }
}

/// Summary statistics for a completed run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanSummary {
    /// Candidates pushed into the queue
    pub dispatched: usize,
    /// Candidates hashed successfully
    pub hashed: usize,
    /// Bytes read while hashing (sizes as discovered)
    pub bytes_hashed: u64,
    /// Candidates that became the first-seen path for their digest
    pub unique: usize,
    /// Pairs handed to the resolution handler
    pub duplicate_pairs: usize,
    /// Pairs skipped because the duplicate was already hardlinked
    pub suppressed: usize,
    /// Pairs written to the report file
    pub reported: usize,
    /// Files removed
    pub deleted: usize,
    /// Candidates replaced by hardlinks
    pub relinked: usize,
    /// Enumeration failures
    pub scan_errors: usize,
    /// Hashing failures
    pub hash_errors: usize,
    /// Failed delete or link operations
    pub action_failures: usize,
    /// Wall-clock duration of the run
    pub scan_duration: Duration,
    /// Whether the run stopped early on a shutdown request
    pub interrupted: bool,
}

impl ScanSummary {
    /// Total number of per-item failures.
    #[must_use]
    pub fn total_errors(&self) -> usize {
        self.scan_errors + self.hash_errors + self.action_failures
    }

    /// Format hashed bytes as a human-readable string.
    #[must_use]
    pub fn bytes_hashed_display(&self) -> String {
        ByteSize::b(self.bytes_hashed).to_string()
    }
}

/// Errors that end a run.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// The candidate source could not be opened.
    #[error(transparent)]
    Source(#[from] ScanError),

    /// A worker thread could not be started.
    #[error("Failed to spawn hashing worker: {0}")]
    Spawn(#[source] std::io::Error),

    /// One or more worker threads panicked.
    #[error("{0} hashing worker(s) panicked")]
    WorkerPanicked(usize),
}

/// Counters shared by the producer and every worker.
#[derive(Debug, Default)]
struct Counters {
    dispatched: AtomicUsize,
    hashed: AtomicUsize,
    bytes_hashed: AtomicU64,
    unique: AtomicUsize,
    pairs: AtomicUsize,
    suppressed: AtomicUsize,
    reported: AtomicUsize,
    deleted: AtomicUsize,
    relinked: AtomicUsize,
    scan_errors: AtomicUsize,
    hash_errors: AtomicUsize,
    action_failures: AtomicUsize,
}

impl Counters {
    fn bump(counter: &AtomicUsize, by: usize) {
        counter.fetch_add(by, Ordering::Relaxed);
    }

    fn record(&self, outcome: &PairOutcome) {
        Self::bump(&self.suppressed, usize::from(outcome.suppressed));
        Self::bump(&self.reported, usize::from(outcome.reported));
        Self::bump(&self.deleted, outcome.deleted);
        Self::bump(&self.relinked, outcome.relinked);
        Self::bump(&self.action_failures, outcome.failures);
    }

    fn snapshot(&self) -> ScanSummary {
        ScanSummary {
            dispatched: self.dispatched.load(Ordering::Relaxed),
            hashed: self.hashed.load(Ordering::Relaxed),
            bytes_hashed: self.bytes_hashed.load(Ordering::Relaxed),
            unique: self.unique.load(Ordering::Relaxed),
            duplicate_pairs: self.pairs.load(Ordering::Relaxed),
            suppressed: self.suppressed.load(Ordering::Relaxed),
            reported: self.reported.load(Ordering::Relaxed),
            deleted: self.deleted.load(Ordering::Relaxed),
            relinked: self.relinked.load(Ordering::Relaxed),
            scan_errors: self.scan_errors.load(Ordering::Relaxed),
            hash_errors: self.hash_errors.load(Ordering::Relaxed),
            action_failures: self.action_failures.load(Ordering::Relaxed),
            ..ScanSummary::default()
        }
    }
}

/// Everything a worker needs, shared across the pool.
struct WorkerContext {
    hasher: Hasher,
    registry: DigestRegistry,
    handler: Arc<dyn DuplicateHandler>,
    counters: Counters,
}

impl WorkerContext {
    fn run(&self, rx: &Receiver<CandidatePath>) {
        for candidate in rx.iter() {
            self.process(candidate);
        }
    }

    fn process(&self, candidate: CandidatePath) {
        let digest = match self.hasher.full_hash(&candidate.path) {
            Ok(digest) => digest,
            Err(e) => {
                Counters::bump(&self.counters.hash_errors, 1);
                log::warn!("Skipping unreadable file: {e}");
                return;
            }
        };
        Counters::bump(&self.counters.hashed, 1);
        self.counters
            .bytes_hashed
            .fetch_add(candidate.size, Ordering::Relaxed);

        let Some(original) = self.registry.lookup_or_insert(digest, &candidate.path) else {
            Counters::bump(&self.counters.unique, 1);
            log::trace!("First seen {}: {}", digest, candidate.path.display());
            return;
        };

        if same_entry(&candidate.path, &original) {
            log::debug!(
                "Skipping {}: same directory entry as {}",
                candidate.path.display(),
                original.display()
            );
            return;
        }

        Counters::bump(&self.counters.pairs, 1);
        let pair = DuplicatePair::new(candidate.path, original);
        let outcome = self.handler.handle(&pair);
        self.counters.record(&outcome);
    }
}

/// Runs the producer/worker hashing pipeline.
///
/// Each call to [`run`](Self::run) starts from an empty registry; a finder
/// can be reused for several independent runs.
#[derive(Debug)]
pub struct DuplicateFinder {
    config: FinderConfig,
    hasher: Hasher,
}

impl DuplicateFinder {
    /// Create a new finder.
    #[must_use]
    pub fn new(config: FinderConfig, hasher: Hasher) -> Self {
        Self { config, hasher }
    }

    /// Create a finder with default configuration and XXH3 hashing.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(FinderConfig::default(), Hasher::default())
    }

    /// The finder's configuration.
    #[must_use]
    pub fn config(&self) -> &FinderConfig {
        &self.config
    }

    /// Open `source` and run the pipeline over it.
    ///
    /// # Errors
    ///
    /// Returns [`FinderError::Source`] when the source cannot be opened,
    /// otherwise see [`run`](Self::run).
    pub fn run_source(
        &self,
        source: &CandidateSource,
        walker_config: WalkerConfig,
        handler: Arc<dyn DuplicateHandler>,
    ) -> Result<ScanSummary, FinderError> {
        let candidates = source.open(walker_config)?;
        self.run(candidates, handler)
    }

    /// Hash every candidate and hand each duplicate pair to `handler`.
    ///
    /// Enumeration errors are logged and counted, never fatal. Returns once
    /// every dispatched candidate has been processed.
    ///
    /// # Errors
    ///
    /// Returns [`FinderError::Spawn`] if the pool cannot be started, or
    /// [`FinderError::WorkerPanicked`] if a worker died.
    pub fn run<I>(
        &self,
        candidates: I,
        handler: Arc<dyn DuplicateHandler>,
    ) -> Result<ScanSummary, FinderError>
    where
        I: IntoIterator<Item = Result<CandidatePath, ScanError>>,
    {
        let start_time = Instant::now();
        let workers = self.config.workers.max(1);
        let capacity = self.config.queue_capacity.max(1);

        log::info!(
            "Starting {} hashing worker(s) ({}, queue capacity {})",
            workers,
            self.hasher.algorithm(),
            capacity
        );

        let context = Arc::new(WorkerContext {
            hasher: self.hasher.clone(),
            registry: DigestRegistry::new(),
            handler,
            counters: Counters::default(),
        });
        let (tx, rx) = crossbeam_channel::bounded::<CandidatePath>(capacity);

        let mut handles = Vec::with_capacity(workers);
        for id in 0..workers {
            let rx = rx.clone();
            let context = Arc::clone(&context);
            let spawned = thread::Builder::new()
                .name(format!("dupelink-hash-{id}"))
                .spawn(move || context.run(&rx));
            match spawned {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    drop(tx);
                    for handle in handles {
                        let _ = handle.join();
                    }
                    return Err(FinderError::Spawn(e));
                }
            }
        }
        drop(rx);

        let mut interrupted = false;
        for item in candidates {
            if self.config.is_shutdown_requested() {
                log::info!("Shutdown requested, no further files will be queued");
                interrupted = true;
                break;
            }
            match item {
                Ok(candidate) => {
                    Counters::bump(&context.counters.dispatched, 1);
                    if tx.send(candidate).is_err() {
                        // Only possible if every worker is gone
                        log::error!("Hashing workers exited before the queue was drained");
                        break;
                    }
                }
                Err(e) => {
                    Counters::bump(&context.counters.scan_errors, 1);
                    log::warn!("{e}");
                }
            }
        }

        // Closing the sender lets workers drain what is queued and exit
        drop(tx);
        let panicked = handles
            .into_iter()
            .map(thread::JoinHandle::join)
            .filter(Result::is_err)
            .count();
        if panicked > 0 {
            return Err(FinderError::WorkerPanicked(panicked));
        }

        let mut summary = context.counters.snapshot();
        summary.interrupted = interrupted;
        summary.scan_duration = start_time.elapsed();

        log::info!(
            "Hashed {} of {} file(s) ({}), {} duplicate pair(s) in {:.2?}",
            summary.hashed,
            summary.dispatched,
            summary.bytes_hashed_display(),
            summary.duplicate_pairs,
            summary.scan_duration
        );

        Ok(summary)
    }
}
