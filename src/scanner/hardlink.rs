//! Hardlink count inspection.
//!
//! # Overview
//!
//! Hardlinks are multiple directory entries pointing to the same inode on
//! disk. A file whose link count is 2 or more already shares its storage
//! with some other entry, which is how a previous merge run is recognised.
//!
//! # Platform Support
//!
//! - **Unix**: `st_nlink` from `lstat`
//! - **Other**: link counts are not exposed by std metadata; every file
//!   reports 1, which disables already-linked suppression
//!
//! # Example
//!
//! ```no_run
//! use dupelink::scanner::hardlink::link_count;
//! use std::path::Path;
//!
//! match link_count(Path::new("/some/file.txt")) {
//!     Ok(n) if n >= 2 => println!("already merged"),
//!     Ok(_) => println!("single entry"),
//!     Err(e) => eprintln!("{e}"),
//! }
//! ```

use std::path::Path;

use super::{classify_io_error, ScanError};

/// Number of directory entries referencing the data behind `path`.
///
/// The path itself is not followed if it is a symlink.
///
/// # Errors
///
/// Returns a [`ScanError`] if the path cannot be stat'ed.
pub fn link_count(path: &Path) -> Result<u64, ScanError> {
    let metadata = std::fs::symlink_metadata(path).map_err(|e| classify_io_error(path, e))?;
    Ok(nlink(&metadata))
}

#[cfg(unix)]
fn nlink(metadata: &std::fs::Metadata) -> u64 {
    use std::os::unix::fs::MetadataExt;
    metadata.nlink()
}

#[cfg(not(unix))]
fn nlink(_metadata: &std::fs::Metadata) -> u64 {
    1
}

/// Check if link counts are reported on this platform.
#[must_use]
pub const fn is_supported() -> bool {
    cfg!(unix)
}
