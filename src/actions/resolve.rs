//! Resolution policy applied to each duplicate pair.
//!
//! # Order of checks
//!
//! For a pair `(duplicate, original)` the [`Resolver`] runs, in order:
//!
//! 1. **Already-linked suppression**: if `duplicate` has a link count of 2
//!    or more and force-relink is off, nothing else happens.
//! 2. **Report file**: when a report is configured, the pair is appended
//!    and nothing else happens.
//! 3. **Console**: unless silent, the pair is printed.
//! 4. **Interactive**: unless silent, the user picks a line to remove.
//! 5. **Link**: the duplicate is replaced by a hardlink to the original.
//! 6. **Selection pattern**: the original is removed if it matches,
//!    otherwise the duplicate is removed if it matches.
//!
//! Steps 3 to 6 run under a single mutation lock, separate from the digest
//! registry's lock, so console lines, prompts, deletes and links of
//! different pairs never interleave. The report file has its own lock.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use regex::Regex;

use super::delete::{relink, remove_duplicate};
use super::prompt::{Choice, Prompt};
use crate::duplicates::{DuplicateHandler, DuplicatePair, PairOutcome};
use crate::output::{ReportError, ReportWriter};
use crate::scanner::link_count;

/// Policy switches for the resolver.
#[derive(Debug, Clone, Default)]
pub struct ResolveConfig {
    /// Replace duplicates with hardlinks to the original
    pub link: bool,
    /// Act on duplicates even if they are already hardlinked
    pub force_link: bool,
    /// Ask which copy to remove
    pub interactive: bool,
    /// No console output (also disables interactive prompts)
    pub silent: bool,
    /// Remove whichever side of a pair matches this pattern
    pub select: Option<Regex>,
}

impl ResolveConfig {
    /// Whether resolving a pair can modify the filesystem.
    #[must_use]
    pub fn is_destructive(&self) -> bool {
        self.link || self.select.is_some() || (self.interactive && !self.silent)
    }
}

/// One thing the resolver did for a pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Already hardlinked; nothing else was done
    Suppressed,
    /// Appended to the report file
    Reported,
    /// Printed on the console
    Printed,
    /// The user chose to skip
    Skipped,
    /// A file was removed
    Deleted(PathBuf),
    /// The path was replaced by a hardlink to the original
    Relinked(PathBuf),
    /// An operation on this path failed (already logged)
    Failed(PathBuf),
}

/// Everything done for one pair, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    actions: Vec<Action>,
}

impl Resolution {
    fn push(&mut self, action: Action) {
        self.actions.push(action);
    }

    /// Actions in the order they happened.
    #[must_use]
    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    /// Whether the pair was suppressed as already linked.
    #[must_use]
    pub fn is_suppressed(&self) -> bool {
        self.actions.contains(&Action::Suppressed)
    }

    /// Counts for the scan summary.
    #[must_use]
    pub fn outcome(&self) -> PairOutcome {
        let mut outcome = PairOutcome::default();
        for action in &self.actions {
            match action {
                Action::Suppressed => outcome.suppressed = true,
                Action::Reported => outcome.reported = true,
                Action::Deleted(_) => outcome.deleted += 1,
                Action::Relinked(_) => outcome.relinked += 1,
                Action::Failed(_) => outcome.failures += 1,
                Action::Printed | Action::Skipped => {}
            }
        }
        outcome
    }
}

/// State guarded by the mutation lock.
struct Console {
    out: Box<dyn Write + Send>,
    prompt: Option<Box<dyn Prompt>>,
}

impl Console {
    fn say(&mut self, args: std::fmt::Arguments<'_>) {
        if let Err(e) = self.out.write_fmt(args).and_then(|()| self.out.flush()) {
            log::warn!("Console write failed: {e}");
        }
    }
}

/// Applies the resolution policy to duplicate pairs.
///
/// Shared by every hashing worker through an `Arc`.
pub struct Resolver {
    config: ResolveConfig,
    console: Mutex<Console>,
    report: Option<Mutex<ReportWriter>>,
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("config", &self.config)
            .field("report", &self.report.is_some())
            .finish_non_exhaustive()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Resolver {
    /// Create a resolver printing to `console`.
    pub fn new(config: ResolveConfig, console: Box<dyn Write + Send>) -> Self {
        Self {
            config,
            console: Mutex::new(Console {
                out: console,
                prompt: None,
            }),
            report: None,
        }
    }

    /// Create a resolver printing to standard output.
    #[must_use]
    pub fn stdout(config: ResolveConfig) -> Self {
        Self::new(config, Box::new(std::io::stdout()))
    }

    /// Use `prompt` for interactive decisions.
    #[must_use]
    pub fn with_prompt(self, prompt: Box<dyn Prompt>) -> Self {
        lock(&self.console).prompt = Some(prompt);
        self
    }

    /// Send every unsuppressed pair to `report` instead of acting on it.
    #[must_use]
    pub fn with_report(mut self, report: ReportWriter) -> Self {
        self.report = Some(Mutex::new(report));
        self
    }

    /// The active policy.
    #[must_use]
    pub fn config(&self) -> &ResolveConfig {
        &self.config
    }

    /// Flush the report file, if any.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Write`] if the flush fails.
    pub fn finish(&self) -> Result<(), ReportError> {
        match &self.report {
            Some(report) => {
                let mut report = lock(report);
                report.flush()?;
                log::info!(
                    "Wrote {} pair(s) to {}",
                    report.pairs_written(),
                    report.path().display()
                );
                Ok(())
            }
            None => Ok(()),
        }
    }

    /// Apply the policy to one pair.
    pub fn resolve(&self, pair: &DuplicatePair) -> Resolution {
        let mut resolution = Resolution::default();

        if !self.config.force_link && self.already_linked(&pair.duplicate) {
            log::debug!(
                "Already linked, skipping: {} ({})",
                pair.duplicate.display(),
                pair.original.display()
            );
            resolution.push(Action::Suppressed);
            return resolution;
        }

        if let Some(report) = &self.report {
            match lock(report).append_pair(pair) {
                Ok(()) => resolution.push(Action::Reported),
                Err(e) => {
                    log::error!("{e}");
                    resolution.push(Action::Failed(pair.duplicate.clone()));
                }
            }
            return resolution;
        }

        let mut console = lock(&self.console);

        if !self.config.silent {
            console.say(format_args!("┌ {:?}\n└ {:?}\n", pair.duplicate, pair.original));
            resolution.push(Action::Printed);
        }

        if self.config.interactive && !self.config.silent {
            self.ask(&mut console, pair, &mut resolution);
        }

        if self.config.link {
            self.merge(&mut console, pair, &mut resolution);
        }

        if let Some(select) = &self.config.select {
            if select.is_match(&pair.original.to_string_lossy()) {
                self.delete(&mut console, &pair.original, &pair.duplicate, &mut resolution);
            } else if select.is_match(&pair.duplicate.to_string_lossy()) {
                self.delete(&mut console, &pair.duplicate, &pair.original, &mut resolution);
            }
        }

        resolution
    }

    fn already_linked(&self, path: &Path) -> bool {
        match link_count(path) {
            Ok(count) => count >= 2,
            Err(e) => {
                log::warn!("Cannot read link count, treating as unlinked: {e}");
                false
            }
        }
    }

    fn ask(&self, console: &mut Console, pair: &DuplicatePair, resolution: &mut Resolution) {
        let Some(prompt) = console.prompt.as_mut() else {
            return;
        };
        match prompt.ask(pair) {
            Choice::DeleteDuplicate => {
                self.delete(console, &pair.duplicate, &pair.original, resolution);
            }
            Choice::DeleteOriginal => {
                self.delete(console, &pair.original, &pair.duplicate, resolution);
            }
            Choice::Skip => {
                console.say(format_args!("Skipped\n"));
                resolution.push(Action::Skipped);
            }
        }
    }

    fn delete(
        &self,
        console: &mut Console,
        path: &Path,
        keep: &Path,
        resolution: &mut Resolution,
    ) {
        match remove_duplicate(path, keep) {
            Ok(()) => {
                if !self.config.silent {
                    console.say(format_args!("--- removed {}\n", path.display()));
                }
                resolution.push(Action::Deleted(path.to_path_buf()));
            }
            Err(e) => {
                log::error!("Delete failed: {e}");
                resolution.push(Action::Failed(path.to_path_buf()));
            }
        }
    }

    fn merge(&self, console: &mut Console, pair: &DuplicatePair, resolution: &mut Resolution) {
        match relink(&pair.duplicate, &pair.original) {
            Ok(()) => {
                if !self.config.silent {
                    console.say(format_args!("« removed and linked »\n"));
                }
                resolution.push(Action::Relinked(pair.duplicate.clone()));
            }
            Err(e) => {
                log::error!("Link failed: {e}");
                resolution.push(Action::Failed(pair.duplicate.clone()));
            }
        }
    }
}

impl DuplicateHandler for Resolver {
    fn handle(&self, pair: &DuplicatePair) -> PairOutcome {
        self.resolve(pair).outcome()
    }
}
