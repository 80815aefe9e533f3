//! Error taxonomy shared by every droidpilot operation.
//!
//! Each public operation fails with exactly one [`AutomatorError`] kind so
//! callers can branch on it: retry a [`AutomatorError::Launch`], report a
//! missing element separately from a transport failure, and so on. Nothing
//! in this crate recovers from these errors internally.

use thiserror::Error;

/// Errors that can occur while driving a device.
#[derive(Error, Debug)]
pub enum AutomatorError {
    /// The bridge process could not be started or its pipes could not be read.
    #[error("Failed to launch '{program}': {source}")]
    Launch {
        /// The program that was being spawned.
        program: String,
        /// The underlying spawn or pipe error.
        #[source]
        source: std::io::Error,
    },

    /// The bridge process exited with a non-zero status.
    ///
    /// `output` holds whatever standard output was collected before exit.
    #[error("Process exited with code {}{}", .code, stderr_suffix(.stderr))]
    ProcessExit {
        /// The exit code reported by the process.
        code: i32,
        /// Standard output collected before the process exited.
        output: String,
        /// Trimmed standard error, if any.
        stderr: String,
    },

    /// The hierarchy dump was not well-formed markup.
    #[error("Failed to parse hierarchy dump: {0}")]
    Parse(#[from] roxmltree::Error),

    /// No node matched the selector.
    #[error("Element with selector {selector} not found")]
    ElementNotFound {
        /// The selector that produced no match.
        selector: String,
    },

    /// A node's `bounds` attribute was missing or not of the form `[x1,y1][x2,y2]`.
    #[error("Malformed bounds attribute: {raw:?}")]
    MalformedBounds {
        /// The raw attribute value (empty when the attribute is absent).
        raw: String,
    },

    /// The selector string could not be parsed.
    #[error("Invalid selector {selector:?}: {reason}")]
    InvalidSelector {
        /// The offending selector.
        selector: String,
        /// What went wrong and where.
        reason: String,
    },

    /// A query ran before the first successful refresh.
    #[error("Hierarchy snapshot not yet initialized; call refresh first")]
    NotInitialized,

    /// A local I/O operation failed (e.g. persisting the dump file).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A device command succeeded but its output was not what we expected.
    #[error("Unexpected command output: {0}")]
    UnexpectedOutput(String),
}

fn stderr_suffix(stderr: &str) -> String {
    if stderr.is_empty() {
        String::new()
    } else {
        format!(": {}", stderr)
    }
}

impl AutomatorError {
    /// Returns true for failures of the bridge transport itself.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Launch { .. } | Self::ProcessExit { .. })
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T, E = AutomatorError> = std::result::Result<T, E>;
