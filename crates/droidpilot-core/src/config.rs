//! Automator configuration.
//!
//! [`AutomatorConfig`] describes one device session: which `adb` binary to
//! run, which device to target, and where (if anywhere) to persist each
//! hierarchy dump. Defaults can be stored in `~/.droidpilot/config.json`;
//! command-line flags and environment variables layer on top.
//!
//! # Example
//!
//! ```no_run
//! use droidpilot_core::config::AutomatorConfig;
//!
//! // Load (returns defaults if file doesn't exist)
//! let config = AutomatorConfig::load().with_serial(Some("emulator-5554".to_string()));
//! println!("using {}", config.adb_path);
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

const CONFIG_FILENAME: &str = "config.json";
const DEFAULT_ADB: &str = "adb";

/// Returns the droidpilot state directory (`~/.droidpilot/`).
///
/// Falls back to the current directory when no home directory is known.
pub fn droidpilot_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".droidpilot")
}

fn default_adb_path() -> String {
    DEFAULT_ADB.to_string()
}

/// Configuration for one automator instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutomatorConfig {
    /// Device serial passed as `adb -s <serial>`. `None` lets adb pick the
    /// only connected device.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial: Option<String>,

    /// Path or name of the adb binary.
    #[serde(default = "default_adb_path")]
    pub adb_path: String,

    /// When set, every refresh writes the raw dump here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dump_file_path: Option<PathBuf>,

    /// Emit debug-level diagnostics.
    #[serde(default)]
    pub debug: bool,
}

impl Default for AutomatorConfig {
    fn default() -> Self {
        Self {
            serial: None,
            adb_path: default_adb_path(),
            dump_file_path: None,
            debug: false,
        }
    }
}

impl AutomatorConfig {
    /// Load config from `~/.droidpilot/config.json`.
    ///
    /// Returns [`Default`] if the file does not exist or cannot be parsed.
    pub fn load() -> Self {
        Self::load_from(&droidpilot_dir().join(CONFIG_FILENAME))
    }

    pub fn load_from(path: &std::path::Path) -> Self {
        std::fs::read_to_string(path)
            .ok()
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default()
    }

    /// Save config to `~/.droidpilot/config.json`.
    pub fn save(&self) -> std::io::Result<()> {
        let dir = droidpilot_dir();
        std::fs::create_dir_all(&dir)?;
        self.save_to(&dir.join(CONFIG_FILENAME))
    }

    pub fn save_to(&self, path: &std::path::Path) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        std::fs::write(path, json)
    }

    /// Override the serial when `serial` is `Some`.
    pub fn with_serial(mut self, serial: Option<String>) -> Self {
        if serial.is_some() {
            self.serial = serial;
        }
        self
    }

    /// Override the adb binary when `adb_path` is `Some`.
    pub fn with_adb_path(mut self, adb_path: Option<String>) -> Self {
        if let Some(path) = adb_path {
            self.adb_path = path;
        }
        self
    }

    /// Override the dump path when `path` is `Some`.
    pub fn with_dump_file(mut self, path: Option<PathBuf>) -> Self {
        if path.is_some() {
            self.dump_file_path = path;
        }
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = self.debug || debug;
        self
    }
}
