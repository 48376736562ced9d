//! Whole-file content hashing with streaming reads.
//!
//! # Overview
//!
//! This module provides the [`Hasher`] struct which turns a file's complete
//! byte stream into a fixed-length [`ContentDigest`]. Two algorithms are
//! available:
//!
//! - [`HashAlgorithm::Xxh3`]: 128-bit XXH3, fast and non-cryptographic (default)
//! - [`HashAlgorithm::Blake3`]: 256-bit BLAKE3, cryptographic
//!
//! Digests of different algorithms never compare equal, so a registry can
//! only ever match digests produced by the same configuration.
//!
//! # Example
//!
//! ```no_run
//! use dupelink::scanner::{HashAlgorithm, Hasher};
//! use std::path::Path;
//!
//! let hasher = Hasher::new(HashAlgorithm::Blake3);
//! let digest = hasher.full_hash(Path::new("some/file.bin")).unwrap();
//! println!("{digest}");
//! ```

use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::HashError;

/// Default read buffer size (64 KiB).
pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

/// Digest algorithm selection.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// XXH3-128, fast non-cryptographic digest
    #[default]
    Xxh3,
    /// BLAKE3-256, cryptographic digest
    Blake3,
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Xxh3 => write!(f, "xxh3"),
            Self::Blake3 => write!(f, "blake3"),
        }
    }
}

/// Fixed-length content digest, used as an opaque equality key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentDigest {
    /// 128-bit XXH3 digest
    Xxh3([u8; 16]),
    /// 256-bit BLAKE3 digest
    Blake3([u8; 32]),
}

impl ContentDigest {
    /// Raw digest bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Xxh3(bytes) => bytes,
            Self::Blake3(bytes) => bytes,
        }
    }

    /// Algorithm that produced this digest.
    #[must_use]
    pub fn algorithm(&self) -> HashAlgorithm {
        match self {
            Self::Xxh3(_) => HashAlgorithm::Xxh3,
            Self::Blake3(_) => HashAlgorithm::Blake3,
        }
    }

    /// Lowercase hex rendering.
    #[must_use]
    pub fn to_hex(&self) -> String {
        use fmt::Write;
        self.as_bytes()
            .iter()
            .fold(String::with_capacity(64), |mut out, b| {
                let _ = write!(out, "{b:02x}");
                out
            })
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm(), self.to_hex())
    }
}

/// Incremental state for one digest computation.
enum DigestState {
    Xxh3(Box<xxhash_rust::xxh3::Xxh3>),
    Blake3(Box<blake3::Hasher>),
}

impl DigestState {
    fn new(algorithm: HashAlgorithm) -> Self {
        match algorithm {
            HashAlgorithm::Xxh3 => Self::Xxh3(Box::new(xxhash_rust::xxh3::Xxh3::new())),
            HashAlgorithm::Blake3 => Self::Blake3(Box::new(blake3::Hasher::new())),
        }
    }

    fn update(&mut self, data: &[u8]) {
        match self {
            Self::Xxh3(state) => state.update(data),
            Self::Blake3(state) => {
                state.update(data);
            }
        }
    }

    fn finish(self) -> ContentDigest {
        match self {
            Self::Xxh3(state) => ContentDigest::Xxh3(state.digest128().to_be_bytes()),
            Self::Blake3(state) => ContentDigest::Blake3(*state.finalize().as_bytes()),
        }
    }
}

/// Streaming whole-file hasher.
///
/// Stateless between calls; one instance is shared by every worker.
#[derive(Debug, Clone)]
pub struct Hasher {
    algorithm: HashAlgorithm,
    buffer_size: usize,
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new(HashAlgorithm::default())
    }
}

impl Hasher {
    /// Create a hasher for the given algorithm.
    #[must_use]
    pub fn new(algorithm: HashAlgorithm) -> Self {
        Self {
            algorithm,
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }

    /// Set the read buffer size (minimum 1 byte).
    #[must_use]
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size.max(1);
        self
    }

    /// The configured algorithm.
    #[must_use]
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Digest everything `reader` yields until end of stream.
    pub fn hash_reader<R: Read>(&self, mut reader: R) -> io::Result<ContentDigest> {
        let mut state = DigestState::new(self.algorithm);
        let mut buffer = vec![0u8; self.buffer_size];

        loop {
            let n = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            state.update(&buffer[..n]);
        }

        Ok(state.finish())
    }

    /// Digest the full content of the file at `path`.
    ///
    /// # Errors
    ///
    /// Open and read failures are returned as [`HashError`]; this never panics.
    pub fn full_hash(&self, path: &Path) -> Result<ContentDigest, HashError> {
        let file = File::open(path).map_err(|e| map_io_error(path, e))?;
        self.hash_reader(file).map_err(|e| map_io_error(path, e))
    }
}

fn map_io_error(path: &Path, error: io::Error) -> HashError {
    match error.kind() {
        io::ErrorKind::NotFound => HashError::NotFound(path.to_path_buf()),
        io::ErrorKind::PermissionDenied => HashError::PermissionDenied(path.to_path_buf()),
        _ => HashError::Io {
            path: path.to_path_buf(),
            source: error,
        },
    }
}
