//! Output written by a scan beyond the console.
//!
//! Currently this is the plain-text duplicate report:
//! two lines per pair, duplicate path then original path.
//!
//! # Example
//!
//! ```no_run
//! use dupelink::duplicates::DuplicatePair;
//! use dupelink::output::ReportWriter;
//! use std::path::Path;
//!
//! let mut report = ReportWriter::create(Path::new("dupes.txt")).unwrap();
//! report
//!     .append_pair(&DuplicatePair::new("/d/b".into(), "/d/a".into()))
//!     .unwrap();
//! report.flush().unwrap();
//! ```

pub mod report;

pub use report::{read_report, ReportError, ReportWriter};
