//! Permanent deletion and hardlink replacement.
//!
//! # Overview
//!
//! Mutations available for a resolved pair:
//! - [`remove_file`]: permanently unlink one path
//! - [`remove_duplicate`]: unlink one side of a pair, keeping the other
//! - [`relink`]: unlink the duplicate and recreate it as a hardlink to the
//!   original, so both names share one copy of the data
//!
//! # Safety
//!
//! [`remove_duplicate`] and [`relink`] refuse to touch anything unless the
//! copy that should survive still exists as a regular file. The unlink and
//! link steps of [`relink`] are not atomic: if linking fails after the
//! unlink, the duplicate's name is gone but the data survives under the
//! original.
//!
//! # Example
//!
//! ```no_run
//! use dupelink::actions::delete::relink;
//! use std::path::Path;
//!
//! match relink(Path::new("/data/copy.bin"), Path::new("/data/orig.bin")) {
//!     Ok(()) => println!("linked"),
//!     Err(e) => eprintln!("Failed: {}", e),
//! }
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Error type for delete and link operations.
#[derive(Debug, Error)]
pub enum ActionError {
    /// File was not found (may have been deleted or moved).
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    /// Permission denied when attempting to modify the file.
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// Removing the file failed for another reason.
    #[error("delete failed for {path}: {source}")]
    DeleteFailed {
        /// Path that could not be removed
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Creating the hardlink failed after the duplicate was removed.
    #[error("link {path} -> {original} failed: {source}")]
    LinkFailed {
        /// Path that should have become a link
        path: PathBuf,
        /// Link target
        original: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The copy that should survive is gone, so nothing was touched.
    #[error("surviving copy is missing or not a regular file: {0}")]
    NoSurvivingCopy(PathBuf),
}

impl ActionError {
    /// Get the path the failed operation was acting on.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound(p)
            | Self::PermissionDenied(p)
            | Self::DeleteFailed { path: p, .. }
            | Self::LinkFailed { path: p, .. }
            | Self::NoSurvivingCopy(p) => p,
        }
    }
}

fn classify(path: &Path, error: io::Error) -> ActionError {
    match error.kind() {
        io::ErrorKind::NotFound => ActionError::NotFound(path.to_path_buf()),
        io::ErrorKind::PermissionDenied => ActionError::PermissionDenied(path.to_path_buf()),
        _ => ActionError::DeleteFailed {
            path: path.to_path_buf(),
            source: error,
        },
    }
}

/// Permanently remove `path`.
///
/// # Errors
///
/// Returns an [`ActionError`] describing why the file could not be removed.
pub fn remove_file(path: &Path) -> Result<(), ActionError> {
    fs::remove_file(path).map_err(|e| classify(path, e))?;
    log::debug!("Removed {}", path.display());
    Ok(())
}

fn ensure_survivor(keep: &Path) -> Result<(), ActionError> {
    match fs::metadata(keep) {
        Ok(m) if m.is_file() => Ok(()),
        _ => Err(ActionError::NoSurvivingCopy(keep.to_path_buf())),
    }
}

/// Remove `path` only if `keep` still exists as a regular file.
///
/// # Errors
///
/// - `NoSurvivingCopy` if `keep` is gone (nothing changed)
/// - Any [`remove_file`] error
pub fn remove_duplicate(path: &Path, keep: &Path) -> Result<(), ActionError> {
    ensure_survivor(keep)?;
    remove_file(path)
}

/// Replace `path` with a hardlink to `original`.
///
/// # Errors
///
/// - `NoSurvivingCopy` if `original` is not a regular file (nothing changed)
/// - Any [`remove_file`] error (nothing changed)
/// - `LinkFailed` if the link could not be created after removal
pub fn relink(path: &Path, original: &Path) -> Result<(), ActionError> {
    ensure_survivor(original)?;
    remove_file(path)?;

    fs::hard_link(original, path).map_err(|source| ActionError::LinkFailed {
        path: path.to_path_buf(),
        original: original.to_path_buf(),
        source,
    })?;

    log::debug!("Linked {} -> {}", path.display(), original.display());
    Ok(())
}
