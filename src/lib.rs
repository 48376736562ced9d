//! dupelink - concurrent content-addressed duplicate finder
//!
//! Walks one or more trees (or reads an explicit path list), hashes every
//! candidate on a bounded worker pool and resolves each duplicate pair by
//! reporting it, prompting, hardlinking or deleting by pattern.
//!
//! The pieces can be used on their own:
//!
//! - [`scanner`]: candidate sources, hashing and link counts
//! - [`duplicates`]: the digest registry and the producer/worker pipeline
//! - [`actions`]: the per-pair resolution policy
//! - [`output`]: the two-line-per-pair report file

pub mod actions;
pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod scanner;
pub mod signal;

use std::sync::Arc;

use anyhow::Context;

use crate::actions::{Resolver, TerminalPrompt};
use crate::cli::Cli;
use crate::config::Config;
use crate::duplicates::{DuplicateFinder, FinderConfig};
use crate::error::ExitCode;
use crate::output::ReportWriter;
use crate::scanner::Hasher;

/// Run a complete scan as described by the command line.
///
/// # Errors
///
/// Returns an error for setup failures: unreadable explicit config file,
/// invalid pattern, conflicting options, unopenable input list or report
/// file. Per-file failures during the scan are logged and do not fail the
/// run.
pub fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet).ok();

    let mut config = Config::load(cli.config.as_deref(), cli.profile.as_deref())
        .context("Failed to load configuration")?;
    config.merge_cli(&cli);
    config.validate()?;

    let walker_config = config.walker_config()?;
    let resolve_config = config.resolve_config()?;
    let source = config.candidate_source();

    // The report file is created only once the source has opened
    let candidates = source
        .open(walker_config)
        .context("Failed to open candidate source")?;

    let shutdown = signal::install_handler()?;

    let mut resolver = Resolver::stdout(resolve_config);
    if config.interactive && !config.silent {
        resolver = resolver.with_prompt(Box::new(TerminalPrompt::stdio(config.prompt_retries)));
    }
    if let Some(path) = &config.output {
        resolver = resolver.with_report(ReportWriter::create(path)?);
    }
    let resolver = Arc::new(resolver);

    let finder = DuplicateFinder::new(
        FinderConfig::default()
            .with_workers(config.worker_count())
            .with_queue_capacity(config.queue_capacity)
            .with_shutdown_flag(shutdown.get_flag()),
        Hasher::new(config.hash),
    );

    log::debug!("Effective configuration: {config:?}");
    let summary = finder.run(candidates, resolver.clone())?;
    resolver.finish()?;

    log::info!(
        "{} unique, {} duplicate pair(s): {} suppressed, {} reported, {} deleted, {} relinked",
        summary.unique,
        summary.duplicate_pairs,
        summary.suppressed,
        summary.reported,
        summary.deleted,
        summary.relinked
    );
    if summary.total_errors() > 0 {
        log::warn!(
            "{} file(s) could not be processed ({} scan, {} hash, {} action)",
            summary.total_errors(),
            summary.scan_errors,
            summary.hash_errors,
            summary.action_failures
        );
    }

    if summary.interrupted || shutdown.is_shutdown_requested() {
        return Ok(ExitCode::Interrupted);
    }
    Ok(ExitCode::Success)
}
