//! Command-line front-end for Android UI automation over adb.
//!
//! Each invocation opens a device session, refreshes the hierarchy when the
//! command needs it, and performs one action.
//!
//! # Usage
//!
//! ```bash
//! # Print the raw hierarchy dump
//! droidpilot dump
//!
//! # List nodes matching a selector
//! droidpilot find 'node[class$=Button]'
//!
//! # Print bounds of the first match
//! droidpilot bounds 'node[text="Settings"]'
//!
//! # Tap an element (with human-like jitter)
//! droidpilot tap 'node[text="Settings"]' --strategy simulate
//!
//! # Tap at coordinates, swipe, send keys
//! droidpilot tap-location 540 1200
//! droidpilot swipe 300 1000 300 200 --duration 250
//! droidpilot key KEYCODE_HOME
//! droidpilot text "hello world"
//!
//! # Target a specific device and keep a copy of each dump
//! droidpilot -s emulator-5554 --dump-file window.xml battery
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use droidpilot_core::automator::Automator;
use droidpilot_core::config::AutomatorConfig;
use droidpilot_core::error::AutomatorError;
use droidpilot_core::input::TapStrategy;
use tracing_subscriber::EnvFilter;

/// Android UI automation over adb.
#[derive(Parser)]
#[command(name = "droidpilot")]
#[command(about = "Inspect and drive an Android device's UI over adb")]
#[command(version)]
struct Cli {
    /// Device serial (as listed by `adb devices`)
    #[arg(short, long, env = "DROIDPILOT_SERIAL")]
    serial: Option<String>,

    /// Path to the adb binary
    #[arg(long, env = "DROIDPILOT_ADB")]
    adb: Option<String>,

    /// Write each hierarchy dump to this file
    #[arg(long)]
    dump_file: Option<PathBuf>,

    /// Enable debug diagnostics
    #[arg(short, long)]
    debug: bool,

    /// Output format: text or json
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Print the raw UI hierarchy dump
    Dump,

    /// Print the foreground app package
    Package,

    /// List nodes matching a selector
    Find {
        /// Selector, e.g. node[text="Settings"]
        selector: String,
    },

    /// Print the bounds of the first node matching a selector
    Bounds {
        /// Selector, e.g. node[text="Settings"]
        selector: String,
    },

    /// Tap the first node matching a selector
    Tap {
        /// Selector, e.g. node[text="Settings"]
        selector: String,
        /// Where to tap inside the element: center or simulate
        #[arg(long, default_value = "center")]
        strategy: TapStrategy,
    },

    /// Tap at screen coordinates
    TapLocation {
        /// X coordinate
        x: i32,
        /// Y coordinate
        y: i32,
    },

    /// Swipe from one point to another
    Swipe {
        start_x: i32,
        start_y: i32,
        end_x: i32,
        end_y: i32,
        /// Gesture duration in milliseconds
        #[arg(long)]
        duration: Option<u32>,
    },

    /// Send a key event (name or code, e.g. KEYCODE_HOME or 3)
    Key {
        code: String,
    },

    /// Type text into the focused field
    Text {
        text: String,
    },

    /// Print the battery level
    Battery,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.debug { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(exit_code(&e))
        }
    }
}

/// Process exit status for a failed command.
///
/// 1: the UI did not contain what was asked for; 2: the transport failed;
/// 3: anything else.
fn exit_code(err: &AutomatorError) -> u8 {
    match err {
        _ if err.is_transport() => 2,
        AutomatorError::ElementNotFound { .. } | AutomatorError::MalformedBounds { .. } => 1,
        _ => 3,
    }
}

fn build_config(cli: &Cli) -> AutomatorConfig {
    let serial = cli
        .serial
        .clone()
        .or_else(|| std::env::var("ANDROID_SERIAL").ok());
    AutomatorConfig::load()
        .with_serial(serial)
        .with_adb_path(cli.adb.clone())
        .with_dump_file(cli.dump_file.clone())
        .with_debug(cli.debug)
}

async fn run(cli: Cli) -> Result<(), AutomatorError> {
    let device = Automator::new(build_config(&cli));
    let json = cli.format == OutputFormat::Json;

    match cli.command {
        Command::Dump => {
            device.refresh().await?;
            print!("{}", device.snapshot().raw_dump().await?);
        }
        Command::Package => {
            device.refresh().await?;
            let package = device.snapshot().package().await?;
            if json {
                println!("{}", serde_json::json!({ "package": package }));
            } else {
                println!("{}", package.unwrap_or_default());
            }
        }
        Command::Find { ref selector } => {
            device.refresh().await?;
            let nodes = device.snapshot().query(selector).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&nodes).unwrap_or_default());
            } else if nodes.is_empty() {
                eprintln!("No nodes match {}", selector);
            } else {
                for node in &nodes {
                    println!(
                        "{}{} text={:?} id={:?} bounds={}",
                        "  ".repeat(node.depth.saturating_sub(1)),
                        node.attr("class").unwrap_or(&node.tag),
                        node.attr("text").unwrap_or(""),
                        node.attr("resource-id").unwrap_or(""),
                        node.attr("bounds").unwrap_or("-"),
                    );
                }
            }
        }
        Command::Bounds { ref selector } => {
            device.refresh().await?;
            let bounds = device.snapshot().resolve_bounds(selector).await?;
            if json {
                println!("{}", serde_json::to_string(&bounds).unwrap_or_default());
            } else {
                println!("{} {} {} {}", bounds.x, bounds.y, bounds.width, bounds.height);
            }
        }
        Command::Tap { ref selector, strategy } => {
            device.refresh().await?;
            let (x, y) = device.tap_by_selector(selector, strategy).await?;
            if json {
                println!("{}", serde_json::json!({ "success": true, "x": x, "y": y }));
            } else {
                eprintln!("Tapped {} at {} x {}", selector, x, y);
            }
        }
        Command::TapLocation { x, y } => {
            device.tap(x, y).await?;
            report_success(json);
        }
        Command::Swipe { start_x, start_y, end_x, end_y, duration } => {
            device.swipe(start_x, start_y, end_x, end_y, duration).await?;
            report_success(json);
        }
        Command::Key { ref code } => {
            device.key_event(code).await?;
            report_success(json);
        }
        Command::Text { ref text } => {
            device.input_text(text).await?;
            report_success(json);
        }
        Command::Battery => {
            let level = device.battery_level().await?;
            if json {
                println!("{}", serde_json::json!({ "level": level }));
            } else {
                println!("{}%", level);
            }
        }
    }
    Ok(())
}

fn report_success(json: bool) {
    if json {
        println!("{}", serde_json::json!({ "success": true }));
    }
}
