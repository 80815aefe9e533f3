//! Input events injected with the device's `input` shell tool.
//!
//! An [`InputCommand`] renders to the command line run on the device, e.g.
//! `input touchscreen -d 0 tap 400 1050`.

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::bounds::Bounds;

/// Input device class passed as the first argument to `input`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputSource {
    Dpad,
    Keyboard,
    Mouse,
    Touchpad,
    Gamepad,
    TouchNavigation,
    Joystick,
    Touchscreen,
    Stylus,
    Trackball,
}

impl InputSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            InputSource::Dpad => "dpad",
            InputSource::Keyboard => "keyboard",
            InputSource::Mouse => "mouse",
            InputSource::Touchpad => "touchpad",
            InputSource::Gamepad => "gamepad",
            InputSource::TouchNavigation => "touchnavigation",
            InputSource::Joystick => "joystick",
            InputSource::Touchscreen => "touchscreen",
            InputSource::Stylus => "stylus",
            InputSource::Trackball => "trackball",
        }
    }
}

impl FromStr for InputSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let source = match s.to_ascii_lowercase().as_str() {
            "dpad" => InputSource::Dpad,
            "keyboard" => InputSource::Keyboard,
            "mouse" => InputSource::Mouse,
            "touchpad" => InputSource::Touchpad,
            "gamepad" => InputSource::Gamepad,
            "touchnavigation" => InputSource::TouchNavigation,
            "joystick" => InputSource::Joystick,
            "touchscreen" => InputSource::Touchscreen,
            "stylus" => InputSource::Stylus,
            "trackball" => InputSource::Trackball,
            other => return Err(format!("unknown input source '{}'", other)),
        };
        Ok(source)
    }
}

/// A single input action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputEvent {
    Tap {
        x: i32,
        y: i32,
    },
    Swipe {
        start_x: i32,
        start_y: i32,
        end_x: i32,
        end_y: i32,
        /// Gesture duration in milliseconds.
        duration_ms: Option<u32>,
    },
    /// A key code name (`KEYCODE_HOME`) or number (`3`).
    KeyEvent {
        code: String,
    },
    Text {
        text: String,
    },
}

impl InputEvent {
    /// The `input` verb and its arguments.
    fn render(&self) -> String {
        match self {
            InputEvent::Tap { x, y } => format!("tap {} {}", x, y),
            InputEvent::Swipe { start_x, start_y, end_x, end_y, duration_ms } => {
                let mut s = format!("swipe {} {} {} {}", start_x, start_y, end_x, end_y);
                if let Some(ms) = duration_ms {
                    s.push_str(&format!(" {}", ms));
                }
                s
            }
            InputEvent::KeyEvent { code } => format!("keyevent {}", code),
            InputEvent::Text { text } => format!("text {}", quote_text(text)),
        }
    }
}

/// `input text` treats `%s` as a space; the whole argument is single-quoted
/// for the device shell.
fn quote_text(text: &str) -> String {
    let encoded = text.replace(' ', "%s").replace('\'', r"'\''");
    format!("'{}'", encoded)
}

/// An [`InputEvent`] plus the optional source and display selectors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputCommand {
    pub event: InputEvent,
    pub source: Option<InputSource>,
    pub display_id: Option<u32>,
}

impl InputCommand {
    pub fn new(event: InputEvent) -> Self {
        Self { event, source: None, display_id: None }
    }

    pub fn with_source(mut self, source: InputSource) -> Self {
        self.source = Some(source);
        self
    }

    pub fn on_display(mut self, display_id: u32) -> Self {
        self.display_id = Some(display_id);
        self
    }
}

impl From<InputEvent> for InputCommand {
    fn from(event: InputEvent) -> Self {
        Self::new(event)
    }
}

impl fmt::Display for InputCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("input")?;
        if let Some(source) = self.source {
            write!(f, " {}", source.as_str())?;
        }
        if let Some(display) = self.display_id {
            write!(f, " -d {}", display)?;
        }
        write!(f, " {}", self.event.render())
    }
}

/// Where within an element a selector tap lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TapStrategy {
    /// The exact center of the element.
    #[default]
    Center,
    /// The center plus random jitter, staying inside the element.
    Simulate,
}

impl FromStr for TapStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "center" => Ok(TapStrategy::Center),
            "simulate" => Ok(TapStrategy::Simulate),
            other => Err(format!("unknown tap strategy '{}'", other)),
        }
    }
}

/// Pick the tap point for `bounds` under `strategy`.
pub fn tap_point<R: Rng>(bounds: &Bounds, strategy: TapStrategy, rng: &mut R) -> (i32, i32) {
    let (cx, cy) = bounds.center();
    match strategy {
        TapStrategy::Center => (cx, cy),
        TapStrategy::Simulate => {
            let x = cx + jitter(bounds.width, rng);
            let y = cy + jitter(bounds.height, rng);
            (
                clamp_inside(x, bounds.x, bounds.width),
                clamp_inside(y, bounds.y, bounds.height),
            )
        }
    }
}

fn jitter<R: Rng>(extent: i32, rng: &mut R) -> i32 {
    let half = extent / 2;
    if half == 0 {
        0
    } else {
        rng.gen_range(-half..half)
    }
}

fn clamp_inside(value: i32, start: i32, extent: i32) -> i32 {
    value.clamp(start, start + (extent - 1).max(0))
}
