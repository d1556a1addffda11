//! Traffic History
//!
//! Records every command sent to and every line received from the device.

mod format;
mod recorder;

pub use format::{format_line, NUL_PLACEHOLDER};
pub use recorder::{HistoryRecorder, LogSink};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which way a line travelled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Command sent by the client
    ToDevice,
    /// Line received from the device
    FromDevice,
}

impl Direction {
    /// Label used in the log file
    pub fn label(&self) -> &'static str {
        match self {
            Direction::ToDevice => "to device",
            Direction::FromDevice => "from device",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single recorded line with timestamp and direction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Local wall-clock time of recording
    pub timestamp: DateTime<Local>,
    /// Which way the line travelled
    pub direction: Direction,
    /// Line text exactly as sent or received (NUL bytes intact)
    pub payload: String,
}

impl HistoryEntry {
    /// Create a new entry stamped with the current time
    pub fn now(direction: Direction, payload: impl Into<String>) -> Self {
        Self {
            timestamp: Local::now(),
            direction,
            payload: payload.into(),
        }
    }
}
