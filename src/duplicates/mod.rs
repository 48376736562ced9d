//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - The shared first-seen digest registry
//! - The bounded producer/worker hashing pipeline
//! - Handing confirmed duplicate pairs to a [`DuplicateHandler`]

pub mod finder;
pub mod registry;

use std::path::{Path, PathBuf};

pub use finder::{default_worker_count, DuplicateFinder, FinderConfig, FinderError, ScanSummary};
pub use registry::DigestRegistry;

/// Two distinct paths whose content digests matched.
///
/// `original` is the first-seen path held by the registry; `duplicate` is
/// the path a worker just hashed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicatePair {
    /// Path just hashed
    pub duplicate: PathBuf,
    /// First-seen path for the same digest
    pub original: PathBuf,
}

impl DuplicatePair {
    /// Create a new pair.
    #[must_use]
    pub fn new(duplicate: PathBuf, original: PathBuf) -> Self {
        Self {
            duplicate,
            original,
        }
    }
}

/// What resolving one pair did, aggregated into the scan summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PairOutcome {
    /// Skipped because the duplicate was already hardlinked
    pub suppressed: bool,
    /// Written to the report file
    pub reported: bool,
    /// Files removed
    pub deleted: usize,
    /// Candidates replaced by a hardlink to the original
    pub relinked: usize,
    /// Delete or link operations that failed
    pub failures: usize,
}

impl PairOutcome {
    /// Outcome of a pair skipped by already-linked suppression.
    #[must_use]
    pub fn suppressed() -> Self {
        Self {
            suppressed: true,
            ..Self::default()
        }
    }
}

/// Receives every confirmed duplicate pair.
///
/// Called synchronously from hashing workers, possibly from several
/// threads at once.
pub trait DuplicateHandler: Send + Sync {
    /// Resolve one pair.
    fn handle(&self, pair: &DuplicatePair) -> PairOutcome;
}

/// Whether two path strings name the same directory entry.
///
/// Overlapping roots or a path list that repeats an entry can produce the
/// same file under two spellings; such a "pair" must never be resolved.
pub(crate) fn same_entry(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (std::fs::canonicalize(a), std::fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
