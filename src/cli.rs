//! Command-line interface definitions for dupelink.
//!
//! # Example
//!
//! ```bash
//! # Report duplicates under two trees
//! dupelink ~/photos ~/backup/photos
//!
//! # Same, comma-separated
//! dupelink -p ~/photos,~/backup/photos
//!
//! # Merge duplicates into hardlinks, cryptographic hash
//! dupelink --link -k /srv/data
//!
//! # Delete whichever copy lives under /tmp
//! dupelink --rm '^/tmp/' /tmp /home/me
//!
//! # Write pairs to a file instead of acting on them
//! dupelink -o dupes.txt /srv/data
//! ```

use clap::Parser;
use std::path::PathBuf;

use crate::scanner::HashAlgorithm;

/// Find files with identical content and report, delete or hardlink them.
///
/// Files are compared by a whole-file digest (XXH3 by default, BLAKE3 with
/// -k). The first file seen with a given digest is the original; every later
/// match is reported as a duplicate of it.
#[derive(Debug, Parser)]
#[command(name = "dupelink")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase log verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Print fatal errors as JSON on stderr
    #[arg(long)]
    pub json_errors: bool,

    /// Configuration file (defaults to the platform config directory)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Named profile from the configuration file
    #[arg(long, value_name = "NAME")]
    pub profile: Option<String>,

    /// Directories (or files) to scan; defaults to the current directory
    #[arg(value_name = "PATH")]
    pub paths: Vec<PathBuf>,

    /// Comma-separated list of directories to scan
    #[arg(short = 'p', long = "path", value_name = "PATHS", value_delimiter = ',')]
    pub path_list: Vec<PathBuf>,

    /// Read candidate paths from FILE, one per line, instead of walking
    #[arg(
        short = 'l',
        long,
        value_name = "FILE",
        conflicts_with_all = ["paths", "path_list"]
    )]
    pub input_list: Option<PathBuf>,

    /// Smallest file size to consider, inclusive (default 4KiB)
    ///
    /// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB, TB, TiB
    #[arg(long, value_name = "SIZE", value_parser = parse_size)]
    pub min_size: Option<u64>,

    /// Files of this size or larger are skipped (default 650MiB, 0 = no limit)
    ///
    /// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB, TB, TiB
    #[arg(long, value_name = "SIZE", value_parser = parse_size)]
    pub max_size: Option<u64>,

    /// Skip files whose full path matches REGEX
    #[arg(long, value_name = "REGEX")]
    pub ignore: Option<String>,

    /// Delete whichever file of a pair matches REGEX (original first)
    #[arg(long = "rm", value_name = "REGEX")]
    pub select: Option<String>,

    /// Use the cryptographic BLAKE3 digest (same as --hash blake3)
    #[arg(short = 'k', long, conflicts_with = "hash")]
    pub crypto_hash: bool,

    /// Digest algorithm
    #[arg(long, value_enum, value_name = "ALGORITHM")]
    pub hash: Option<HashAlgorithm>,

    /// Replace each duplicate with a hardlink to its original
    #[arg(long)]
    pub link: bool,

    /// Also act on files that are already hardlinked
    #[arg(short = 'f', long = "force-relink")]
    pub force_link: bool,

    /// Ask which file of each pair to delete
    #[arg(short, long)]
    pub interactive: bool,

    /// Print nothing on stdout (also disables --interactive)
    #[arg(short = 'S', long)]
    pub silent: bool,

    /// Write pairs to FILE (two lines each) instead of printing or acting
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Number of hashing threads (default: CPU count - 1)
    #[arg(short = 'j', long, value_name = "N")]
    pub workers: Option<usize>,

    /// Maximum number of files waiting to be hashed
    #[arg(long, value_name = "N")]
    pub queue_capacity: Option<usize>,

    /// Skip hidden files and directories (starting with .)
    #[arg(long)]
    pub skip_hidden: bool,
}

impl Cli {
    /// Roots given positionally and with `--path`, in that order.
    #[must_use]
    pub fn roots(&self) -> Vec<PathBuf> {
        self.paths
            .iter()
            .chain(&self.path_list)
            .filter(|p| !p.as_os_str().is_empty())
            .cloned()
            .collect()
    }

    /// Digest algorithm requested on the command line, if any.
    #[must_use]
    pub fn hash_algorithm(&self) -> Option<HashAlgorithm> {
        if self.crypto_hash {
            Some(HashAlgorithm::Blake3)
        } else {
            self.hash
        }
    }
}

/// Parse a human-readable size string into bytes.
///
/// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB, TB, TiB
/// Case-insensitive. Numbers without suffix are treated as bytes.
///
/// # Examples
///
/// ```
/// use dupelink::cli::parse_size;
///
/// assert_eq!(parse_size("4096").unwrap(), 4096);
/// assert_eq!(parse_size("4KiB").unwrap(), 4096);
/// assert_eq!(parse_size("650MiB").unwrap(), 681_574_400);
/// ```
/// # Errors
///
/// Returns an error if the string is empty, contains an invalid number,
/// a negative number, or an unknown size suffix.
pub fn parse_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Size cannot be empty".to_string());
    }

    let (num_str, suffix) = match s.find(|c: char| !c.is_ascii_digit() && c != '.') {
        Some(idx) => (&s[..idx], s[idx..].trim().to_uppercase()),
        None => (s, String::new()),
    };

    let num: f64 = num_str
        .parse()
        .map_err(|_| format!("Invalid number: '{num_str}'"))?;

    if num < 0.0 {
        return Err("Size cannot be negative".to_string());
    }

    let multiplier: u64 = match suffix.as_str() {
        "" | "B" => 1,
        "KB" | "K" => 1_000,
        "KIB" => 1_024,
        "MB" | "M" => 1_000_000,
        "MIB" => 1_048_576,
        "GB" | "G" => 1_000_000_000,
        "GIB" => 1_073_741_824,
        "TB" | "T" => 1_000_000_000_000,
        "TIB" => 1_099_511_627_776,
        _ => return Err(format!("Unknown size suffix: '{suffix}'")),
    };

    Ok((num * multiplier as f64) as u64)
}
