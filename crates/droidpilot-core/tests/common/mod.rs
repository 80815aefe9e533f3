//! Shared test helpers for droidpilot-core integration tests.
//!
//! Provides a scripted [`CommandRunner`] that replays canned outputs and
//! records every argument list it was asked to run.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use droidpilot_core::error::{AutomatorError, Result};
use droidpilot_core::runner::CommandRunner;

/// What the fake runner does for one call.
pub enum Reply {
    /// Succeed with this stdout.
    Output(String),
    /// Succeed after a delay.
    Delayed(Duration, String),
    /// Fail with a non-zero exit.
    Exit(i32),
    /// Fail as if the binary were missing.
    Launch,
}

/// A runner that replays [`Reply`]s in order.
///
/// Once the script is exhausted, every further call succeeds with an empty
/// string.
#[derive(Default)]
pub struct ScriptedRunner {
    replies: Mutex<VecDeque<Reply>>,
    calls: Mutex<Vec<Vec<String>>>,
}

impl ScriptedRunner {
    pub fn new(replies: Vec<Reply>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            calls: Mutex::new(Vec::new()),
        })
    }

    /// Every argument list received so far.
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn execute(&self, args: &[&str]) -> Result<String> {
        self.calls
            .lock()
            .unwrap()
            .push(args.iter().map(|a| a.to_string()).collect());

        let reply = self.replies.lock().unwrap().pop_front();
        match reply {
            None => Ok(String::new()),
            Some(Reply::Output(out)) => Ok(out),
            Some(Reply::Delayed(delay, out)) => {
                tokio::time::sleep(delay).await;
                Ok(out)
            }
            Some(Reply::Exit(code)) => Err(AutomatorError::ProcessExit {
                code,
                output: String::new(),
                stderr: "error: no devices/emulators found".to_string(),
            }),
            Some(Reply::Launch) => Err(AutomatorError::Launch {
                program: "adb".to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "No such file or directory"),
            }),
        }
    }
}

/// The scenario dump used across tests.
pub const SETTINGS_DUMP: &str = r#"<hierarchy><node package="com.app"><node text="Settings" bounds="[300,1000][500,1100]"/></node></hierarchy>"#;

/// A realistic launcher dump with duplicate labels.
pub const LAUNCHER_DUMP: &str = r#"<?xml version='1.0' encoding='UTF-8' standalone='yes' ?>
<hierarchy rotation="0">
  <node index="0" text="" resource-id="" class="android.widget.FrameLayout" package="com.android.launcher3" content-desc="" bounds="[0,0][1080,2280]">
    <node index="0" text="" resource-id="com.android.launcher3:id/workspace" class="android.widget.ScrollView" package="com.android.launcher3" content-desc="" bounds="[0,0][1080,2280]">
      <node index="0" text="Settings" resource-id="" class="android.widget.TextView" package="com.android.launcher3" content-desc="Settings" bounds="[40,1500][280,1760]" />
      <node index="1" text="Chrome" resource-id="" class="android.widget.TextView" package="com.android.launcher3" content-desc="Chrome" bounds="[300,1500][540,1760]" />
    </node>
    <node index="1" text="Settings" resource-id="com.android.launcher3:id/hotseat_settings" class="android.widget.TextView" package="com.android.launcher3" content-desc="" bounds="[820,2000][1040,2200]" />
    <node index="2" text="Broken" resource-id="" class="android.widget.TextView" package="com.android.launcher3" content-desc="" bounds="[10,20]" />
  </node>
</hierarchy>"#;
