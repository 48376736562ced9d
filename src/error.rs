//! Process exit codes and structured error output.

use serde::Serialize;

use crate::signal::EXIT_CODE_INTERRUPTED;

/// Exit codes for dupelink.
///
/// Per-file failures during a run (unreadable files, failed deletes) are
/// logged and do not change the exit code; only setup failures and
/// interrupts do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// The run completed.
    Success,
    /// Setup failed or an unexpected error occurred.
    GeneralError,
    /// The run was stopped by Ctrl+C.
    Interrupted,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        match self {
            Self::Success => 0,
            Self::GeneralError => 1,
            Self::Interrupted => EXIT_CODE_INTERRUPTED,
        }
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "DL000",
            Self::GeneralError => "DL001",
            Self::Interrupted => "DL130",
        }
    }
}

/// Error printed as JSON with `--json-errors`.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "DL001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable message, including its causes
    pub message: String,
    /// Whether the run was interrupted
    pub interrupted: bool,
}

impl StructuredError {
    /// Build from an error and the exit code it maps to.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{err:#}"),
            interrupted: exit_code == ExitCode::Interrupted,
        }
    }

    /// Serialize as a single-line JSON object.
    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!("{{\"code\":\"{}\",\"exit_code\":{}}}", self.code, self.exit_code)
        })
    }
}
