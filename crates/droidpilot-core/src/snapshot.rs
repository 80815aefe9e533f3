//! The queryable on-screen hierarchy.
//!
//! [`HierarchySnapshot`] fetches a uiautomator dump through a
//! [`CommandRunner`], parses it, and keeps the latest result as an
//! immutable [`SnapshotState`]. Queries run against that state until the
//! next refresh replaces it wholesale.
//!
//! # Consistency
//!
//! Refreshes on one snapshot are serialized: a second `refresh` waits for
//! the first to finish. The new state is swapped in with a single pointer
//! replacement, so a reader sees either the old dump or the new one and
//! never a mix. A query issued while a refresh is in flight still reads the
//! previous state; callers that need post-refresh data must await the
//! refresh first.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{Mutex, RwLock};

use crate::bounds::Bounds;
use crate::diagnostics::{DiagnosticsSink, Level, TracingSink};
use crate::error::{AutomatorError, Result};
use crate::hierarchy::{Hierarchy, NodeId, NodeSummary};
use crate::runner::CommandRunner;
use crate::selector::Selector;

/// Where uiautomator writes the dump on the device.
pub const DEVICE_DUMP_PATH: &str = "/data/local/tmp/automator-dump.xml";

/// Shell command that dumps the hierarchy and prints it in one round trip.
pub fn dump_command() -> String {
    format!(
        "uiautomator dump {path} > /dev/null && cat {path}",
        path = DEVICE_DUMP_PATH
    )
}

/// One parsed dump.
#[derive(Debug)]
pub struct SnapshotState {
    raw: String,
    tree: Hierarchy,
    package: Option<String>,
}

impl SnapshotState {
    /// Parse dump text into a state.
    pub fn from_dump(raw: String) -> Result<Self> {
        let tree = Hierarchy::parse(&raw)?;
        let package = tree.package().map(str::to_string);
        Ok(Self { raw, tree, package })
    }

    /// The dump text exactly as received.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn tree(&self) -> &Hierarchy {
        &self.tree
    }

    /// Package of the foreground app, from the top-level node.
    pub fn package(&self) -> Option<&str> {
        self.package.as_deref()
    }

    /// First node matching `selector` in document order.
    ///
    /// # Errors
    ///
    /// [`AutomatorError::InvalidSelector`] or [`AutomatorError::ElementNotFound`].
    pub fn find_first(&self, selector: &str) -> Result<NodeId> {
        Selector::parse(selector)?
            .first(&self.tree)
            .ok_or_else(|| AutomatorError::ElementNotFound {
                selector: selector.to_string(),
            })
    }

    /// Every node matching `selector`, in document order.
    pub fn query(&self, selector: &str) -> Result<Vec<NodeSummary>> {
        let selector = Selector::parse(selector)?;
        Ok(selector
            .select(&self.tree)
            .into_iter()
            .map(|id| NodeSummary::from_tree(&self.tree, id))
            .collect())
    }

    /// Bounds of the first node matching `selector`.
    ///
    /// # Errors
    ///
    /// - [`AutomatorError::InvalidSelector`] if the selector does not parse
    /// - [`AutomatorError::ElementNotFound`] if nothing matches
    /// - [`AutomatorError::MalformedBounds`] if the match has no usable `bounds`
    pub fn resolve_bounds(&self, selector: &str) -> Result<Bounds> {
        let id = self.find_first(selector)?;
        self.tree.node(id).bounds()
    }
}

/// Latest hierarchy snapshot for one device.
pub struct HierarchySnapshot {
    runner: Arc<dyn CommandRunner>,
    sink: Arc<dyn DiagnosticsSink>,
    dump_file_path: Option<PathBuf>,
    state: RwLock<Option<Arc<SnapshotState>>>,
    refresh_lock: Mutex<()>,
}

impl HierarchySnapshot {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            runner,
            sink: Arc::new(TracingSink::default()),
            dump_file_path: None,
            state: RwLock::new(None),
            refresh_lock: Mutex::new(()),
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticsSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Persist every refreshed dump to `path`.
    pub fn with_dump_file(mut self, path: Option<PathBuf>) -> Self {
        self.dump_file_path = path;
        self
    }

    /// Fetch a fresh dump from the device and replace the current state.
    ///
    /// # Errors
    ///
    /// - Any runner failure, unchanged
    /// - [`AutomatorError::Io`] if the dump file cannot be written
    /// - [`AutomatorError::Parse`] if the dump is not well-formed
    ///
    /// On error the previous state is kept.
    pub async fn refresh(&self) -> Result<()> {
        let _guard = self.refresh_lock.lock().await;
        let started = Instant::now();

        let command = dump_command();
        let raw = self.runner.execute(&["shell", command.as_str()]).await?;

        if let Some(path) = &self.dump_file_path {
            tokio::fs::write(path, &raw).await?;
        }

        let state = Arc::new(SnapshotState::from_dump(raw)?);
        let package = state.package().unwrap_or("unknown").to_string();
        *self.state.write().await = Some(state);

        self.sink.record(
            Level::Debug,
            &format!(
                "Hierarchy refreshed in {}ms (package: {})",
                started.elapsed().as_millis(),
                package
            ),
        );
        Ok(())
    }

    /// The current state.
    ///
    /// # Errors
    ///
    /// [`AutomatorError::NotInitialized`] before the first successful refresh.
    pub async fn current(&self) -> Result<Arc<SnapshotState>> {
        self.state
            .read()
            .await
            .clone()
            .ok_or(AutomatorError::NotInitialized)
    }

    pub async fn is_initialized(&self) -> bool {
        self.state.read().await.is_some()
    }

    pub async fn package(&self) -> Result<Option<String>> {
        Ok(self.current().await?.package().map(str::to_string))
    }

    pub async fn raw_dump(&self) -> Result<String> {
        Ok(self.current().await?.raw().to_string())
    }

    /// See [`SnapshotState::resolve_bounds`].
    pub async fn resolve_bounds(&self, selector: &str) -> Result<Bounds> {
        self.current().await?.resolve_bounds(selector)
    }

    /// See [`SnapshotState::query`].
    pub async fn query(&self, selector: &str) -> Result<Vec<NodeSummary>> {
        self.current().await?.query(selector)
    }
}
