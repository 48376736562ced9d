//! Append-only duplicate report file.
//!
//! The report is plain UTF-8 text with two lines per duplicate pair, the
//! duplicate path followed by the original path. There is no header or
//! trailer:
//!
//! ```text
//! /data/photos/copy.jpg
//! /data/photos/orig.jpg
//! /data/music/b.flac
//! /data/music/a.flac
//! ```
//!
//! The file is created (truncating any previous report) before the scan
//! starts, appended to as pairs are found, and flushed once at the end.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::duplicates::DuplicatePair;

/// Errors from report file operations.
#[derive(thiserror::Error, Debug)]
pub enum ReportError {
    /// The report file could not be created.
    #[error("Cannot create report file {path}: {source}")]
    Create {
        /// Report path
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Writing to the report file failed.
    #[error("Cannot write report file {path}: {source}")]
    Write {
        /// Report path
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Reading a report back failed.
    #[error("Cannot read report file {path}: {source}")]
    Read {
        /// Report path
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A report has an odd number of lines.
    #[error("Report file {0} ends with an unpaired line")]
    Unpaired(PathBuf),
}

/// Buffered writer for the two-line-per-pair report format.
#[derive(Debug)]
pub struct ReportWriter {
    path: PathBuf,
    writer: BufWriter<File>,
    pairs: usize,
}

impl ReportWriter {
    /// Create (or truncate) the report file.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Create`] if the file cannot be created.
    pub fn create(path: &Path) -> Result<Self, ReportError> {
        let file = File::create(path).map_err(|source| ReportError::Create {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Writing duplicate report to {}", path.display());

        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
            pairs: 0,
        })
    }

    /// Path of the report file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of pairs appended so far.
    #[must_use]
    pub fn pairs_written(&self) -> usize {
        self.pairs
    }

    /// Append one pair as two lines.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Write`] if the write fails.
    pub fn append_pair(&mut self, pair: &DuplicatePair) -> Result<(), ReportError> {
        writeln!(
            self.writer,
            "{}\n{}",
            pair.duplicate.to_string_lossy(),
            pair.original.to_string_lossy()
        )
        .map_err(|source| self.write_error(source))?;
        self.pairs += 1;
        Ok(())
    }

    /// Flush buffered pairs to disk.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Write`] if the flush fails.
    pub fn flush(&mut self) -> Result<(), ReportError> {
        self.writer
            .flush()
            .map_err(|source| self.write_error(source))
    }

    fn write_error(&self, source: std::io::Error) -> ReportError {
        ReportError::Write {
            path: self.path.clone(),
            source,
        }
    }
}

/// Read a report back into pairs.
///
/// # Errors
///
/// Returns [`ReportError::Read`] on I/O failure or
/// [`ReportError::Unpaired`] if the line count is odd.
pub fn read_report(path: &Path) -> Result<Vec<DuplicatePair>, ReportError> {
    let read_error = |source| ReportError::Read {
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(path).map_err(read_error)?;

    let mut pairs = Vec::new();
    let mut lines = BufReader::new(file).lines();
    while let Some(duplicate) = lines.next() {
        let duplicate = duplicate.map_err(read_error)?;
        let original = match lines.next() {
            Some(line) => line.map_err(read_error)?,
            None => return Err(ReportError::Unpaired(path.to_path_buf())),
        };
        pairs.push(DuplicatePair::new(
            PathBuf::from(duplicate),
            PathBuf::from(original),
        ));
    }
    Ok(pairs)
}
