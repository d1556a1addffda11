//! Protocol errors

use std::io;

use thiserror::Error;

/// Errors surfaced to callers of the client
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// The OS or driver refused to open the port
    #[error("Failed to open serial port '{port}': {message}")]
    OpenFailed {
        /// Port name as configured
        port: String,
        /// Driver error text
        message: String,
    },

    /// Writing or flushing a command failed
    #[error("Write to device failed: {0}")]
    WriteFailed(#[source] io::Error),

    /// The client or transport has been closed
    #[error("Client is closed")]
    Closed,

    /// Operator input is not an integer literal
    #[error("{field} must be an integer, got '{input}'")]
    InvalidNumericInput {
        /// Which of group, parameter or value was rejected
        field: &'static str,
        /// The rejected text
        input: String,
    },

    /// The read loop thread could not be started
    #[error("Failed to start read loop: {0}")]
    ReaderSpawn(#[source] io::Error),

    /// Invalid or unreadable client settings
    #[error("Configuration error: {0}")]
    Config(String),

    /// Any other I/O failure
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
}

/// Failures of a single line read, as seen by the read loop
#[derive(Error, Debug)]
pub enum ReadError {
    /// The driver hiccuped; the next read may succeed
    #[error("Transient read failure: {0}")]
    Transient(#[source] io::Error),

    /// The device is gone; no further reads will succeed
    #[error("Fatal read failure: {0}")]
    Fatal(#[source] io::Error),
}

impl ReadError {
    /// Sort an I/O error into transient or fatal
    pub fn classify(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::BrokenPipe
            | io::ErrorKind::NotConnected
            | io::ErrorKind::UnexpectedEof
            | io::ErrorKind::PermissionDenied
            | io::ErrorKind::NotFound => ReadError::Fatal(err),
            _ => ReadError::Transient(err),
        }
    }

    /// Whether the read loop should stop
    pub fn is_fatal(&self) -> bool {
        matches!(self, ReadError::Fatal(_))
    }
}
