//! First-seen digest registry shared by all hashing workers.
//!
//! The registry maps each [`ContentDigest`] to the first path observed with
//! it. Its only entry point, [`DigestRegistry::lookup_or_insert`], runs the
//! lookup and the insert under one lock, so for any digest exactly one
//! worker wins and every other discoverer sees the winner's path.
//!
//! There is no remove or update: deleting or relinking files on disk is not
//! reflected back here, and the first-seen path stays authoritative for the
//! whole run.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use crate::scanner::ContentDigest;

/// Lock-protected map from digest to first-seen path.
#[derive(Debug, Default)]
pub struct DigestRegistry {
    entries: Mutex<HashMap<ContentDigest, PathBuf>>,
}

impl DigestRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically look up `digest`, inserting `path` if it is new.
    ///
    /// Returns `None` when `path` became the first-seen path, or the
    /// previously registered path when the digest was already known.
    pub fn lookup_or_insert(&self, digest: ContentDigest, path: &Path) -> Option<PathBuf> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        match entries.get(&digest) {
            Some(existing) => Some(existing.clone()),
            None => {
                entries.insert(digest, path.to_path_buf());
                None
            }
        }
    }

    /// Number of distinct digests registered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether no digest has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
