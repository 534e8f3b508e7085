//! Door position sensing.
//!
//! The door switch is a reed/limit switch wired between the GPIO and
//! ground with the internal pull-up enabled, so the line reads low when
//! the door is closed.

pub mod door;

use core::fmt;

use serde::Serialize;

/// Door position as reported to the remote store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SensorState {
    Open,
    Closed,
}

impl SensorState {
    /// Map a raw level to a position. Only valid for the pull-up +
    /// grounded-switch wiring.
    pub const fn from_level(is_high: bool) -> Self {
        if is_high { Self::Open } else { Self::Closed }
    }

    /// Wire representation written under the `status` field.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::Closed => "CLOSED",
        }
    }
}

impl fmt::Display for SensorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
