//! Logging setup for dupelink.
//!
//! Diagnostics go through the `log` facade with an `env_logger` backend and
//! are always written to stderr. Duplicate pairs and mutation messages are
//! console output on stdout and never pass through here.
//!
//! The level is chosen by, in priority order:
//!
//! 1. the `RUST_LOG` environment variable, if set
//! 2. `--quiet` (errors only) or `-v` / `-vv` (debug / trace)
//! 3. info otherwise
//!
//! # Example
//!
//! ```rust,no_run
//! use dupelink::logging::init_logging;
//!
//! init_logging(1, false).ok();
//! log::debug!("visible with -v");
//! ```

use env_logger::{Builder, Target};
use log::{LevelFilter, SetLoggerError};
use std::env;
use std::io::Write;

/// Install the global logger.
///
/// # Arguments
///
/// * `verbose` - Verbosity count from CLI (0=info, 1=debug, 2+=trace)
/// * `quiet` - Errors only (ignored when `RUST_LOG` is set)
///
/// # Errors
///
/// Returns an error if a logger was already installed in this process.
pub fn init_logging(verbose: u8, quiet: bool) -> Result<(), SetLoggerError> {
    let from_env = env::var("RUST_LOG").ok();

    let mut builder = Builder::new();
    builder.target(Target::Stderr);

    match &from_env {
        Some(filters) => {
            builder.parse_filters(filters);
        }
        None => {
            builder.filter_level(determine_level(verbose, quiet));
        }
    }

    configure_format(&mut builder, verbose);
    builder.try_init()?;

    match from_env {
        Some(filters) => log::debug!("Logging configured from RUST_LOG={filters}"),
        None => log::debug!("Logging initialized at level: {}", current_level_name()),
    }
    Ok(())
}

/// Map CLI flags to a level filter. Quiet wins over verbose.
fn determine_level(verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::Error;
    }
    match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Debug builds prefix a timestamp (plus the module path with `-v`);
/// release builds print `LEVEL message` only.
fn configure_format(builder: &mut Builder, verbose: u8) {
    #[cfg(debug_assertions)]
    {
        builder.format(move |buf, record| {
            let timestamp = buf.timestamp_seconds();
            let level = record.level();
            let style = buf.default_level_style(level);

            if verbose >= 1 {
                writeln!(
                    buf,
                    "{timestamp} {style}{level:<5}{style:#} [{}] {}",
                    record.module_path().unwrap_or("unknown"),
                    record.args()
                )
            } else {
                writeln!(
                    buf,
                    "{timestamp} {style}{level:<5}{style:#} {}",
                    record.args()
                )
            }
        });
    }

    #[cfg(not(debug_assertions))]
    {
        let _ = verbose;
        builder.format(|buf, record| {
            let level = record.level();
            let style = buf.default_level_style(level);
            writeln!(buf, "{style}{level:<5}{style:#} {}", record.args())
        });
    }
}

/// Name of the currently active maximum level.
pub fn current_level_name() -> &'static str {
    match log::max_level() {
        LevelFilter::Off => "off",
        LevelFilter::Error => "error",
        LevelFilter::Warn => "warn",
        LevelFilter::Info => "info",
        LevelFilter::Debug => "debug",
        LevelFilter::Trace => "trace",
    }
}
