//! Device session: one runner, one snapshot, and the convenience actions.
//!
//! [`Automator`] is the entry point most callers want. It owns the
//! [`CommandRunner`] for its device and the [`HierarchySnapshot`] fed by
//! it, and layers input injection on top: taps by coordinate or selector,
//! swipes, key events, text entry, and a battery probe.
//!
//! # Example
//!
//! ```no_run
//! use droidpilot_core::automator::Automator;
//! use droidpilot_core::config::AutomatorConfig;
//! use droidpilot_core::input::TapStrategy;
//!
//! # async fn demo() -> droidpilot_core::error::Result<()> {
//! let config = AutomatorConfig::default().with_serial(Some("emulator-5554".to_string()));
//! let device = Automator::new(config);
//!
//! println!("battery: {}%", device.battery_level().await?);
//!
//! device.refresh().await?;
//! device.swipe(300, 1000, 300, 200, None).await?;
//! device.tap_by_selector(r#"node[text="Settings"]"#, TapStrategy::Center).await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use crate::config::AutomatorConfig;
use crate::diagnostics::{DiagnosticsSink, Level, TracingSink};
use crate::error::{AutomatorError, Result};
use crate::input::{tap_point, InputCommand, InputEvent, TapStrategy};
use crate::runner::{AdbRunner, CommandRunner};
use crate::snapshot::HierarchySnapshot;

/// A session bound to one device.
pub struct Automator {
    config: AutomatorConfig,
    runner: Arc<dyn CommandRunner>,
    snapshot: HierarchySnapshot,
    sink: Arc<dyn DiagnosticsSink>,
}

impl Automator {
    /// Build an automator that runs `config.adb_path` and logs via `tracing`.
    pub fn new(config: AutomatorConfig) -> Self {
        let sink: Arc<dyn DiagnosticsSink> = Arc::new(TracingSink::new(config.debug));
        let runner = AdbRunner::new(config.adb_path.clone(), config.serial.clone())
            .with_sink(sink.clone());
        Self::with_runner(config, Arc::new(runner), sink)
    }

    /// Build an automator over an arbitrary runner and sink.
    pub fn with_runner(
        config: AutomatorConfig,
        runner: Arc<dyn CommandRunner>,
        sink: Arc<dyn DiagnosticsSink>,
    ) -> Self {
        let snapshot = HierarchySnapshot::new(runner.clone())
            .with_sink(sink.clone())
            .with_dump_file(config.dump_file_path.clone());
        Self {
            config,
            runner,
            snapshot,
            sink,
        }
    }

    pub fn config(&self) -> &AutomatorConfig {
        &self.config
    }

    pub fn snapshot(&self) -> &HierarchySnapshot {
        &self.snapshot
    }

    /// Run a raw bridge command (without the `adb` program name).
    pub async fn execute(&self, args: &[&str]) -> Result<String> {
        self.runner.execute(args).await
    }

    /// Refresh the hierarchy snapshot.
    pub async fn refresh(&self) -> Result<()> {
        self.snapshot.refresh().await
    }

    /// Inject an input event, optionally refreshing the snapshot afterwards.
    pub async fn send_input(&self, command: impl Into<InputCommand>, refresh: bool) -> Result<()> {
        let line = command.into().to_string();
        self.runner.execute(&["shell", line.as_str()]).await?;
        if refresh {
            self.refresh().await?;
        }
        Ok(())
    }

    /// Tap at screen coordinates and refresh.
    pub async fn tap(&self, x: i32, y: i32) -> Result<()> {
        self.send_input(InputEvent::Tap { x, y }, true).await
    }

    pub async fn swipe(
        &self,
        start_x: i32,
        start_y: i32,
        end_x: i32,
        end_y: i32,
        duration_ms: Option<u32>,
    ) -> Result<()> {
        let event = InputEvent::Swipe {
            start_x,
            start_y,
            end_x,
            end_y,
            duration_ms,
        };
        self.send_input(event, true).await
    }

    pub async fn key_event(&self, code: &str) -> Result<()> {
        self.send_input(InputEvent::KeyEvent { code: code.to_string() }, true)
            .await
    }

    pub async fn input_text(&self, text: &str) -> Result<()> {
        self.send_input(InputEvent::Text { text: text.to_string() }, true)
            .await
    }

    /// Tap the first element matching `selector` in the current snapshot.
    ///
    /// Returns the point that was tapped. The snapshot is not refreshed
    /// before resolving; it is refreshed after the tap.
    pub async fn tap_by_selector(&self, selector: &str, strategy: TapStrategy) -> Result<(i32, i32)> {
        let bounds = self.snapshot.resolve_bounds(selector).await?;
        let (x, y) = tap_point(&bounds, strategy, &mut rand::thread_rng());
        self.sink.record(
            Level::Debug,
            &format!("Tapping selector \"{}\" at {} x {}", selector, x, y),
        );
        self.tap(x, y).await?;
        Ok((x, y))
    }

    /// Current battery level in percent, from `dumpsys battery`.
    pub async fn battery_level(&self) -> Result<u8> {
        let raw = self.runner.execute(&["shell", "dumpsys", "battery"]).await?;
        parse_battery_level(&raw)
    }
}

/// Extract the `level:` value from `dumpsys battery` output.
///
/// The first line is the section header and is skipped.
pub fn parse_battery_level(raw: &str) -> Result<u8> {
    let value = raw
        .lines()
        .skip(1)
        .map(str::trim)
        .find_map(|line| line.strip_prefix("level:"))
        .ok_or_else(|| AutomatorError::UnexpectedOutput("no battery level line".to_string()))?;
    value
        .trim()
        .parse()
        .map_err(|_| AutomatorError::UnexpectedOutput(format!("invalid battery level '{}'", value.trim())))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DUMPSYS_BATTERY: &str = "Current Battery Service state:
  AC powered: true
  USB powered: false
  Wireless powered: false
  Max charging current: 0
  status: 2
  health: 2
  present: true
  level: 87
  scale: 100
  voltage: 5000
  temperature: 250
  technology: Li-ion
";

    #[test]
    fn test_parse_battery_level() {
        assert_eq!(parse_battery_level(DUMPSYS_BATTERY).unwrap(), 87);
    }

    #[test]
    fn test_parse_battery_level_crlf() {
        let raw = DUMPSYS_BATTERY.replace('\n', "\r\n");
        assert_eq!(parse_battery_level(&raw).unwrap(), 87);
    }

    #[test]
    fn test_parse_battery_level_missing() {
        assert!(matches!(
            parse_battery_level("Current Battery Service state:\n  scale: 100\n"),
            Err(AutomatorError::UnexpectedOutput(_))
        ));
        // The header line is never treated as data.
        assert!(parse_battery_level("level: 50").is_err());
    }

    #[test]
    fn test_parse_battery_level_garbage() {
        assert!(matches!(
            parse_battery_level("header\n  level: lots\n"),
            Err(AutomatorError::UnexpectedOutput(_))
        ));
    }
}
