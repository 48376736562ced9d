//! Scanner module for candidate discovery and file hashing.
//!
//! This module provides functionality for:
//! - Recursive directory walking over several roots using jwalk
//! - Loading an explicit, newline-delimited list of paths
//! - Whole-file content hashing (XXH3 or BLAKE3)
//! - Hardlink count inspection
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`walker`]: Directory traversal and candidate filtering
//! - [`path_list`]: Candidates read from a path-list file
//! - [`hasher`]: Streaming whole-file digests
//! - [`hardlink`]: Link count queries
//!
//! # Example
//!
//! ```no_run
//! use dupelink::scanner::{Walker, WalkerConfig};
//! use std::path::PathBuf;
//!
//! let config = WalkerConfig {
//!     min_size: Some(4096),
//!     ..Default::default()
//! };
//!
//! let walker = Walker::new(vec![PathBuf::from(".")], config);
//! for entry in walker.walk() {
//!     match entry {
//!         Ok(file) => println!("{}: {} bytes", file.path.display(), file.size),
//!         Err(e) => eprintln!("Warning: {}", e),
//!     }
//! }
//! ```

pub mod hardlink;
pub mod hasher;
pub mod path_list;
pub mod walker;

use std::path::{Path, PathBuf};

use regex::Regex;

// Re-export main types
pub use hardlink::link_count;
pub use hasher::{ContentDigest, HashAlgorithm, Hasher};
pub use path_list::PathList;
pub use walker::Walker;

/// A regular file that survived the candidate filters.
///
/// Created by a candidate source and consumed exactly once by a hashing
/// worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidatePath {
    /// Path as discovered (not canonicalized)
    pub path: PathBuf,
    /// File size in bytes at discovery time
    pub size: u64,
}

impl CandidatePath {
    /// Create a new candidate.
    #[must_use]
    pub fn new(path: PathBuf, size: u64) -> Self {
        Self { path, size }
    }
}

/// Filters shared by every candidate source.
#[derive(Debug, Clone, Default)]
pub struct WalkerConfig {
    /// Minimum file size to include (inclusive).
    pub min_size: Option<u64>,

    /// Upper size bound (exclusive). Files of exactly this size are skipped.
    pub max_size: Option<u64>,

    /// Paths whose full string form matches this pattern are never candidates.
    pub ignore: Option<Regex>,

    /// Skip hidden files and directories (names starting with `.`).
    pub skip_hidden: bool,
}

impl WalkerConfig {
    /// Set the size bounds.
    #[must_use]
    pub fn with_size_bounds(mut self, min_size: Option<u64>, max_size: Option<u64>) -> Self {
        self.min_size = min_size;
        self.max_size = max_size;
        self
    }

    /// Set the ignore pattern.
    #[must_use]
    pub fn with_ignore(mut self, pattern: Regex) -> Self {
        self.ignore = Some(pattern);
        self
    }

    /// Whether a file of `size` bytes lies in `[min_size, max_size)`.
    #[must_use]
    pub fn passes_size_filter(&self, size: u64) -> bool {
        if self.min_size.is_some_and(|min| size < min) {
            return false;
        }
        if self.max_size.is_some_and(|max| size >= max) {
            return false;
        }
        true
    }

    /// Whether `path` matches the ignore pattern.
    #[must_use]
    pub fn is_ignored(&self, path: &Path) -> bool {
        self.ignore
            .as_ref()
            .is_some_and(|re| re.is_match(&path.to_string_lossy()))
    }
}

/// Where candidates come from for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateSource {
    /// Recursive walk over one or more roots.
    Roots(Vec<PathBuf>),
    /// Newline-delimited list of explicit paths.
    PathList(PathBuf),
}

impl CandidateSource {
    /// Open the source and return its lazy candidate sequence.
    ///
    /// Per-entry failures are yielded as `Err` items and never stop the
    /// sequence; only a path list that cannot be opened fails here.
    pub fn open(
        &self,
        config: WalkerConfig,
    ) -> Result<Box<dyn Iterator<Item = Result<CandidatePath, ScanError>>>, ScanError> {
        match self {
            Self::Roots(roots) => Ok(Box::new(Walker::new(roots.clone(), config).into_walk())),
            Self::PathList(list) => Ok(Box::new(PathList::open(list, config)?)),
        }
    }
}

/// Map a stat/open failure onto the scanner error taxonomy.
pub(crate) fn classify_io_error(path: &Path, error: std::io::Error) -> ScanError {
    match error.kind() {
        std::io::ErrorKind::PermissionDenied => ScanError::PermissionDenied(path.to_path_buf()),
        std::io::ErrorKind::NotFound => ScanError::NotFound(path.to_path_buf()),
        _ => ScanError::Io {
            path: path.to_path_buf(),
            source: error,
        },
    }
}

/// Errors that can occur while enumerating candidates.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when accessing a file or directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The specified path was not found.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// The path list file could not be opened or read.
    #[error("Cannot read path list {path}: {source}")]
    PathList {
        /// Path of the list file
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// An I/O error occurred while accessing a file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Errors that can occur during file hashing.
#[derive(thiserror::Error, Debug)]
pub enum HashError {
    /// The specified file was not found.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when reading the file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// An I/O error occurred while reading the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}
