//! Element geometry decoded from uiautomator `bounds` attributes.
//!
//! uiautomator encodes an element's rectangle as two bracketed corner
//! pairs with no separator: `[x1,y1][x2,y2]`. [`Bounds::parse`] turns that
//! into origin + size and rejects anything else with
//! [`AutomatorError::MalformedBounds`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AutomatorError, Result};

/// An axis-aligned rectangle in device pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Bounds {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Bounds {
    /// Decode a `[x1,y1][x2,y2]` attribute value.
    ///
    /// # Errors
    ///
    /// [`AutomatorError::MalformedBounds`] if the value is empty, does not
    /// contain exactly two integer pairs, or the second corner lies above or
    /// to the left of the first.
    pub fn parse(raw: &str) -> Result<Self> {
        let malformed = || AutomatorError::MalformedBounds { raw: raw.to_string() };

        let inner = raw
            .trim()
            .strip_prefix('[')
            .and_then(|s| s.strip_suffix(']'))
            .ok_or_else(malformed)?;

        let mut corners = inner.split("][");
        let (first, second) = match (corners.next(), corners.next(), corners.next()) {
            (Some(a), Some(b), None) => (a, b),
            _ => return Err(malformed()),
        };

        let (x1, y1) = parse_pair(first).ok_or_else(malformed)?;
        let (x2, y2) = parse_pair(second).ok_or_else(malformed)?;
        if x2 < x1 || y2 < y1 {
            return Err(malformed());
        }

        // A span wider than i32::MAX does not fit in width/height.
        let width = x2.checked_sub(x1).ok_or_else(malformed)?;
        let height = y2.checked_sub(y1).ok_or_else(malformed)?;

        Ok(Self { x: x1, y: y1, width, height })
    }

    /// Decode an optional `bounds` attribute value.
    ///
    /// # Errors
    ///
    /// [`AutomatorError::MalformedBounds`] with an empty `raw` when the
    /// attribute is absent, otherwise as [`Bounds::parse`].
    pub fn from_attr(raw: Option<&str>) -> Result<Self> {
        match raw {
            Some(raw) => Self::parse(raw),
            None => Err(AutomatorError::MalformedBounds { raw: String::new() }),
        }
    }

    /// The center point, rounded down.
    pub fn center(&self) -> (i32, i32) {
        (self.x + self.width / 2, self.y + self.height / 2)
    }

    /// Bottom-right corner.
    pub fn end(&self) -> (i32, i32) {
        (self.x + self.width, self.y + self.height)
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        let (x2, y2) = self.end();
        x >= self.x && x < x2 && y >= self.y && y < y2
    }
}

fn parse_pair(pair: &str) -> Option<(i32, i32)> {
    let (a, b) = pair.split_once(',')?;
    Some((a.trim().parse().ok()?, b.trim().parse().ok()?))
}

impl FromStr for Bounds {
    type Err = AutomatorError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Bounds {
    /// Formats back into the uiautomator encoding.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (x2, y2) = self.end();
        write!(f, "[{},{}][{},{}]", self.x, self.y, x2, y2)
    }
}
