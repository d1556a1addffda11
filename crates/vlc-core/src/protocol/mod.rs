//! Serial Protocol Communication
//!
//! Implements the transceiver's line-oriented text protocol: one ASCII
//! command or response per newline-terminated line.

pub mod catalog;
pub mod commands;
mod error;
pub mod responses;
pub mod serial;
pub mod stream;
#[cfg(test)]
pub(crate) mod testing;

pub use commands::{Command, ConfigureRequest};
pub use error::{ProtocolError, ReadError};
pub use responses::{Description, Event};
pub use serial::{open_port, PortSettings};
pub use stream::{Channel, LineReader, SerialChannel, Transport, MAX_LINE_LEN};

/// Default baud rate for the transceiver
pub const DEFAULT_BAUD_RATE: u32 = 115200;

/// Default bound on a single blocking read, in milliseconds
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 1000;

/// Time the firmware needs after the port opens before it accepts commands
pub const STARTUP_DELAY_MS: u64 = 2000;
