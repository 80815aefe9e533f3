//! # droidpilot-core
//!
//! Core library for Android UI automation over `adb`.
//!
//! This crate captures the on-screen UI hierarchy with `uiautomator`,
//! queries it with CSS-style selectors, and turns matches into input events.
//!
//! ## Modules
//!
//! - [`runner`] - Executes bridge commands (`adb ...`) as async processes
//! - [`hierarchy`] - Arena tree parsed from a uiautomator XML dump
//! - [`selector`] - Selector language evaluated against the tree
//! - [`bounds`] - Decoding of `[x1,y1][x2,y2]` element bounds
//! - [`snapshot`] - Latest parsed dump with refresh and query operations
//! - [`input`] - `input` shell commands and tap strategies
//! - [`automator`] - Device session tying the above together
//! - [`config`] - Session configuration and persisted defaults
//! - [`diagnostics`] - Injected diagnostics sinks
//! - [`error`] - The shared error type
//!
//! ## External Dependencies
//!
//! The Android platform tools (`adb`) must be installed and a device or
//! emulator must be reachable.
//!
//! ## Example
//!
//! ```no_run
//! use droidpilot_core::automator::Automator;
//! use droidpilot_core::config::AutomatorConfig;
//!
//! # async fn demo() -> droidpilot_core::error::Result<()> {
//! let device = Automator::new(AutomatorConfig::load());
//! device.refresh().await?;
//!
//! let bounds = device.snapshot().resolve_bounds(r#"node[text="Settings"]"#).await?;
//! let (x, y) = bounds.center();
//! device.tap(x, y).await?;
//! # Ok(())
//! # }
//! ```

pub mod automator;
pub mod bounds;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod hierarchy;
pub mod input;
pub mod runner;
pub mod selector;
pub mod snapshot;
