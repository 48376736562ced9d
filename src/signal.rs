//! Ctrl+C handling.
//!
//! A single `AtomicBool` records that an interrupt arrived. The producer
//! checks it before queueing each candidate; once set, nothing new is
//! queued, workers finish what is already in the queue, the report file is
//! flushed and the process exits with [`EXIT_CODE_INTERRUPTED`].
//!
//! A worker blocked on an interactive prompt keeps waiting for its answer;
//! the interrupt only takes effect once the prompt returns.
//!
//! ```rust,no_run
//! use dupelink::duplicates::FinderConfig;
//! use dupelink::signal::install_handler;
//!
//! let handler = install_handler().expect("signal handler");
//! let config = FinderConfig::default().with_shutdown_flag(handler.get_flag());
//! ```

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// Exit code after an interrupt (128 + SIGINT).
pub const EXIT_CODE_INTERRUPTED: i32 = 130;

/// Shared shutdown flag.
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandler {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandler {
    /// Create a handler with no shutdown requested.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether an interrupt (or a manual request) has been seen.
    #[must_use]
    pub fn is_shutdown_requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Request shutdown without a signal.
    pub fn request_shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// The flag to hand to [`FinderConfig`](crate::duplicates::FinderConfig).
    #[must_use]
    pub fn get_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }

    /// Clear the flag.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// Error type for signal handler installation.
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    /// Failed to install the Ctrl+C handler.
    #[error("Failed to install signal handler: {0}")]
    InstallFailed(#[from] ctrlc::Error),
}

static GLOBAL_HANDLER: OnceLock<ShutdownHandler> = OnceLock::new();

/// Install the process-wide Ctrl+C hook and return its handler.
///
/// `ctrlc` allows one hook per process. Later calls (for example several
/// `run_app` invocations inside one test binary) get the already-installed
/// handler back with its flag cleared. If some other code owns the hook,
/// an unhooked handler is returned; it still honours
/// [`request_shutdown`](ShutdownHandler::request_shutdown).
///
/// # Errors
///
/// Currently always succeeds; the `Result` leaves room for platforms where
/// the hook cannot be registered at all.
pub fn install_handler() -> Result<ShutdownHandler, SignalError> {
    if let Some(handler) = GLOBAL_HANDLER.get() {
        handler.reset();
        return Ok(handler.clone());
    }

    let handler = ShutdownHandler::new();
    let flag = handler.get_flag();

    let hooked = ctrlc::set_handler(move || {
        flag.store(true, Ordering::SeqCst);
        let mut stderr = std::io::stderr();
        let _ = writeln!(stderr, "\nInterrupted, finishing queued files...");
        let _ = stderr.flush();
    });

    match hooked {
        Ok(()) => {
            let _ = GLOBAL_HANDLER.set(handler.clone());
            Ok(handler)
        }
        Err(e) => {
            log::debug!("Ctrl+C hook unavailable ({e}), using unhooked handler");
            let fallback = GLOBAL_HANDLER.get_or_init(ShutdownHandler::new);
            fallback.reset();
            Ok(fallback.clone())
        }
    }
}
