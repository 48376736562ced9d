//! Directory walker implementation using jwalk for parallel traversal.
//!
//! # Overview
//!
//! This module provides the [`Walker`] struct which enumerates candidate
//! files under one or more roots. It uses [`jwalk`] to read directories in
//! parallel while still yielding entries as a single sorted stream, so the
//! producer can feed the bounded dispatch channel lazily.
//!
//! # Filtering
//!
//! - Only regular files are yielded; directories, symlinks and special
//!   files (devices, sockets, fifos) are skipped silently
//! - Size bounds are `[min_size, max_size)`
//! - Paths matching the ignore regex are skipped
//! - Hidden entries are skipped only when `skip_hidden` is set
//!
//! Traversal errors (permission denied, vanished entries) are yielded as
//! [`ScanError`] values and never end the walk.
//!
//! # Example
//!
//! ```no_run
//! use dupelink::scanner::{Walker, WalkerConfig};
//! use std::path::PathBuf;
//!
//! let roots = vec![PathBuf::from("/home/user/Downloads"), PathBuf::from("/tmp")];
//! let walker = Walker::new(roots, WalkerConfig::default());
//! let files: Vec<_> = walker.walk().filter_map(Result::ok).collect();
//! println!("Found {} candidates", files.len());
//! ```

use std::path::{Path, PathBuf};

use jwalk::WalkDir;

use super::{classify_io_error, CandidatePath, ScanError, WalkerConfig};

/// Recursive candidate enumerator over several roots.
#[derive(Debug, Clone)]
pub struct Walker {
    /// Roots to walk, in order
    roots: Vec<PathBuf>,
    /// Walker configuration
    config: WalkerConfig,
}

impl Walker {
    /// Create a new walker for the given roots.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use dupelink::scanner::{Walker, WalkerConfig};
    /// use std::path::PathBuf;
    ///
    /// let walker = Walker::new(vec![PathBuf::from(".")], WalkerConfig::default());
    /// ```
    #[must_use]
    pub fn new(roots: Vec<PathBuf>, config: WalkerConfig) -> Self {
        Self { roots, config }
    }

    /// Walk every root, yielding candidates.
    ///
    /// Errors are yielded as [`ScanError`] values rather than stopping
    /// iteration.
    pub fn walk(&self) -> impl Iterator<Item = Result<CandidatePath, ScanError>> {
        self.clone().into_walk()
    }

    /// Consume the walker and return an owned candidate iterator.
    pub fn into_walk(self) -> impl Iterator<Item = Result<CandidatePath, ScanError>> {
        let Self { roots, config } = self;
        roots
            .into_iter()
            .flat_map(move |root| walk_root(root, config.clone()))
    }
}

/// Walk a single root.
fn walk_root(
    root: PathBuf,
    config: WalkerConfig,
) -> impl Iterator<Item = Result<CandidatePath, ScanError>> {
    log::debug!("Walking {}", root.display());

    let walk_dir = WalkDir::new(&root)
        .follow_links(false)
        .skip_hidden(config.skip_hidden)
        .sort(true);

    walk_dir
        .into_iter()
        .filter_map(move |entry_result| match entry_result {
            Ok(entry) => {
                let file_type = entry.file_type();

                // Directories are traversed, never reported
                if file_type.is_dir() {
                    return None;
                }

                let path = entry.path();
                if file_type.is_symlink() {
                    log::trace!("Skipping symlink: {}", path.display());
                    return None;
                }

                if config.is_ignored(&path) {
                    log::trace!("Ignoring file: {}", path.display());
                    return None;
                }

                let metadata = match std::fs::symlink_metadata(&path) {
                    Ok(m) => m,
                    Err(e) => return Some(Err(handle_io_error(&path, e))),
                };

                // Devices, sockets and fifos are silently skipped
                if !metadata.is_file() {
                    log::trace!("Skipping irregular file: {}", path.display());
                    return None;
                }

                let size = metadata.len();
                if !config.passes_size_filter(size) {
                    log::trace!(
                        "Skipping file due to size filter ({}): {}",
                        size,
                        path.display()
                    );
                    return None;
                }

                Some(Ok(CandidatePath::new(path, size)))
            }
            Err(e) => {
                let path = e
                    .path()
                    .map_or_else(|| root.clone(), std::borrow::ToOwned::to_owned);
                Some(Err(handle_jwalk_error(path, e)))
            }
        })
}

/// Handle I/O errors during file access.
///
/// Errors are logged by whoever drains the walk, not here.
fn handle_io_error(path: &Path, error: std::io::Error) -> ScanError {
    log::trace!("stat failed for {}: {}", path.display(), error);
    classify_io_error(path, error)
}

/// Handle jwalk errors.
fn handle_jwalk_error(path: PathBuf, error: jwalk::Error) -> ScanError {
    match error.io_error().map(std::io::Error::kind) {
        Some(std::io::ErrorKind::PermissionDenied) => ScanError::PermissionDenied(path),
        Some(std::io::ErrorKind::NotFound) => ScanError::NotFound(path),
        _ => ScanError::Io {
            path,
            source: std::io::Error::other(error.to_string()),
        },
    }
}
