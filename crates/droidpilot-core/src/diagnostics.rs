//! Injected diagnostics sinks.
//!
//! Components never log through a module-wide logger. Each one holds an
//! `Arc<dyn DiagnosticsSink>` handed to it at construction, and records
//! events through [`DiagnosticsSink::record`]. The default [`TracingSink`]
//! forwards to `tracing`; [`MemorySink`] keeps records in memory so callers
//! (and tests) can inspect what happened.

use std::fmt;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

/// Severity of a diagnostic record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
        };
        f.write_str(s)
    }
}

/// Destination for diagnostic events emitted by droidpilot components.
pub trait DiagnosticsSink: Send + Sync {
    /// Record a single event.
    fn record(&self, level: Level, message: &str);
}

/// Forwards records to the `tracing` facade.
///
/// When `debug` is false, [`Level::Debug`] records are dropped before they
/// reach `tracing`, mirroring a non-verbose automator.
#[derive(Debug, Clone, Default)]
pub struct TracingSink {
    debug: bool,
}

impl TracingSink {
    pub fn new(debug: bool) -> Self {
        Self { debug }
    }
}

impl DiagnosticsSink for TracingSink {
    fn record(&self, level: Level, message: &str) {
        match level {
            Level::Debug if self.debug => tracing::debug!(target: "droidpilot", "{message}"),
            Level::Debug => {}
            Level::Info => tracing::info!(target: "droidpilot", "{message}"),
            Level::Warn => tracing::warn!(target: "droidpilot", "{message}"),
            Level::Error => tracing::error!(target: "droidpilot", "{message}"),
        }
    }
}

/// A single captured diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub level: Level,
    pub message: String,
}

/// Collects records in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<Record>>,
}

impl MemorySink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Returns a copy of everything recorded so far.
    pub fn records(&self) -> Vec<Record> {
        self.records
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

impl DiagnosticsSink for MemorySink {
    fn record(&self, level: Level, message: &str) {
        if let Ok(mut records) = self.records.lock() {
            records.push(Record {
                level,
                message: message.to_string(),
            });
        }
    }
}
