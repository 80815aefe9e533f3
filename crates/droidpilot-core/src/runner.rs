//! Execution of bridge commands.
//!
//! [`CommandRunner`] is the seam between droidpilot and the outside world:
//! the snapshot and the automator only ever ask a runner to execute an
//! argument list and hand back standard output. [`AdbRunner`] is the
//! process-backed implementation that spawns `adb` (or any configured
//! program) through `tokio::process`.
//!
//! # Example
//!
//! ```no_run
//! use droidpilot_core::runner::{AdbRunner, CommandRunner};
//!
//! # async fn demo() -> droidpilot_core::error::Result<()> {
//! let runner = AdbRunner::new("adb", Some("emulator-5554".to_string()));
//! let out = runner.execute(&["shell", "getprop", "ro.build.version.sdk"]).await?;
//! println!("sdk: {}", out.trim());
//! # Ok(())
//! # }
//! ```

use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;

use crate::diagnostics::{DiagnosticsSink, Level, TracingSink};
use crate::error::{AutomatorError, Result};

/// Executes one bridge command and returns its standard output.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run the command with the given arguments.
    ///
    /// Implementations spawn exactly one process per call and must not
    /// share mutable state between overlapping calls.
    async fn execute(&self, args: &[&str]) -> Result<String>;
}

/// Process-backed [`CommandRunner`].
///
/// When a device serial is configured, `-s <serial>` is prepended to every
/// argument list. The caller's arguments are never modified.
pub struct AdbRunner {
    program: String,
    serial: Option<String>,
    sink: Arc<dyn DiagnosticsSink>,
}

impl AdbRunner {
    pub fn new(program: impl Into<String>, serial: Option<String>) -> Self {
        Self {
            program: program.into(),
            serial,
            sink: Arc::new(TracingSink::default()),
        }
    }

    /// Replace the diagnostics sink.
    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticsSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn serial(&self) -> Option<&str> {
        self.serial.as_deref()
    }

    /// Builds the full argument vector for one call.
    pub fn command_args(&self, args: &[&str]) -> Vec<String> {
        let mut full = Vec::with_capacity(args.len() + 2);
        if let Some(serial) = &self.serial {
            full.push("-s".to_string());
            full.push(serial.clone());
        }
        full.extend(args.iter().map(|a| a.to_string()));
        full
    }

    /// Spawning, waiting on or reading from the bridge process failed.
    fn launch_error(&self, source: std::io::Error) -> AutomatorError {
        AutomatorError::Launch {
            program: self.program.clone(),
            source,
        }
    }
}

#[async_trait]
impl CommandRunner for AdbRunner {
    async fn execute(&self, args: &[&str]) -> Result<String> {
        let argv = self.command_args(args);
        self.sink.record(
            Level::Debug,
            &format!("exec {} {}", self.program, argv.join(" ")),
        );

        let mut child = Command::new(&self.program)
            .args(&argv)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| self.launch_error(source))?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        // Output is complete only once both pipes have closed and the exit
        // status is known.
        let (stdout, stderr, status) = tokio::join!(
            read_stream(stdout),
            read_stream(stderr),
            child.wait()
        );
        let status = status.map_err(|source| self.launch_error(source))?;
        let stdout = stdout.map_err(|source| self.launch_error(source))?;
        let output = String::from_utf8_lossy(&stdout).into_owned();

        match status.code() {
            Some(code) if code != 0 => {
                let stderr = String::from_utf8_lossy(&stderr.unwrap_or_default())
                    .trim()
                    .to_string();
                self.sink.record(
                    Level::Warn,
                    &format!("{} exited with code {}", self.program, code),
                );
                Err(AutomatorError::ProcessExit {
                    code,
                    output,
                    stderr,
                })
            }
            // Zero, or terminated by a signal without an exit code.
            _ => Ok(output),
        }
    }
}

/// Drains a child pipe, appending chunks in arrival order.
async fn read_stream<R: AsyncRead + Unpin>(stream: Option<R>) -> std::io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    if let Some(mut stream) = stream {
        let mut chunk = [0u8; 8192];
        loop {
            let n = stream.read(&mut chunk).await?;
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
        }
    }
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_args_without_serial() {
        let runner = AdbRunner::new("adb", None);
        assert_eq!(runner.command_args(&["devices"]), vec!["devices"]);
    }

    #[test]
    fn test_command_args_prepends_serial_once_per_call() {
        let runner = AdbRunner::new("adb", Some("emulator-5554".to_string()));
        let args = ["shell", "echo", "hi"];

        let first = runner.command_args(&args);
        let second = runner.command_args(&args);

        assert_eq!(first, vec!["-s", "emulator-5554", "shell", "echo", "hi"]);
        assert_eq!(first, second);
        assert_eq!(args, ["shell", "echo", "hi"]);
    }

    #[test]
    fn test_process_io_failure_is_transport() {
        let runner = AdbRunner::new("adb", None);
        let err = runner.launch_error(std::io::Error::new(
            std::io::ErrorKind::BrokenPipe,
            "pipe closed",
        ));
        assert!(err.is_transport());
        match err {
            AutomatorError::Launch { program, source } => {
                assert_eq!(program, "adb");
                assert_eq!(source.kind(), std::io::ErrorKind::BrokenPipe);
            }
            other => panic!("expected Launch, got {:?}", other),
        }
    }

    #[test]
    fn test_accessors() {
        let runner = AdbRunner::new("/opt/platform-tools/adb", Some("abc".into()));
        assert_eq!(runner.program(), "/opt/platform-tools/adb");
        assert_eq!(runner.serial(), Some("abc"));
    }
}
