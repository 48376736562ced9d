//! Candidates loaded from a newline-delimited path list.
//!
//! Each non-empty line names one path. Lines are stat-checked lazily as the
//! iterator advances: directories, symlinks and other non-regular entries
//! are skipped, stat failures are yielded as [`ScanError`] items, and the
//! same size and ignore filters as the [`Walker`](super::Walker) apply.
//!
//! Lines are raw bytes, not text. On unix any byte sequence is a valid path;
//! elsewhere a line that is not UTF-8 is logged and skipped.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use super::{classify_io_error, CandidatePath, ScanError, WalkerConfig};

/// Lazy iterator over the paths listed in a file.
pub struct PathList {
    source: PathBuf,
    reader: BufReader<File>,
    line: Vec<u8>,
    config: WalkerConfig,
    failed: bool,
}

impl std::fmt::Debug for PathList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PathList")
            .field("source", &self.source)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(unix)]
fn path_from_bytes(bytes: &[u8]) -> Option<PathBuf> {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;
    Some(PathBuf::from(OsStr::from_bytes(bytes)))
}

#[cfg(not(unix))]
fn path_from_bytes(bytes: &[u8]) -> Option<PathBuf> {
    match std::str::from_utf8(bytes) {
        Ok(text) => Some(PathBuf::from(text)),
        Err(_) => {
            log::warn!(
                "Skipping listed path that is not valid UTF-8: {}",
                String::from_utf8_lossy(bytes)
            );
            None
        }
    }
}

impl PathList {
    /// Open a path list.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::PathList`] if the file cannot be opened. This is a
    /// setup failure; nothing has been enumerated yet.
    pub fn open(path: &Path, config: WalkerConfig) -> Result<Self, ScanError> {
        let file = File::open(path).map_err(|source| ScanError::PathList {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("Reading candidates from {}", path.display());

        Ok(Self {
            source: path.to_path_buf(),
            reader: BufReader::new(file),
            line: Vec::new(),
            config,
            failed: false,
        })
    }

    /// Stat one listed path and apply the filters.
    fn check(&self, path: PathBuf) -> Option<Result<CandidatePath, ScanError>> {
        if self.config.is_ignored(&path) {
            log::trace!("Ignoring listed file: {}", path.display());
            return None;
        }

        // The entry itself, never what a symlink points at
        let metadata = match std::fs::symlink_metadata(&path) {
            Ok(m) => m,
            Err(e) => return Some(Err(classify_io_error(&path, e))),
        };

        let file_type = metadata.file_type();
        if file_type.is_dir() {
            log::trace!("Skipping listed directory: {}", path.display());
            return None;
        }
        if file_type.is_symlink() {
            log::trace!("Skipping listed symlink: {}", path.display());
            return None;
        }
        if !file_type.is_file() {
            log::trace!("Skipping irregular listed file: {}", path.display());
            return None;
        }

        let size = metadata.len();
        if !self.config.passes_size_filter(size) {
            log::trace!(
                "Skipping listed file due to size filter ({}): {}",
                size,
                path.display()
            );
            return None;
        }

        Some(Ok(CandidatePath::new(path, size)))
    }
}

impl Iterator for PathList {
    type Item = Result<CandidatePath, ScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        loop {
            self.line.clear();
            match self.reader.read_until(b'\n', &mut self.line) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(source) => {
                    // Only a failing read of the list itself ends it
                    self.failed = true;
                    return Some(Err(ScanError::PathList {
                        path: self.source.clone(),
                        source,
                    }));
                }
            }

            let mut bytes = self.line.as_slice();
            while let Some((&(b'\n' | b'\r'), rest)) = bytes.split_last() {
                bytes = rest;
            }
            if bytes.is_empty() {
                continue;
            }

            let Some(path) = path_from_bytes(bytes) else {
                continue;
            };
            if let Some(item) = self.check(path) {
                return Some(item);
            }
        }
    }
}
