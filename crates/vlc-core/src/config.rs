//! Client configuration
//!
//! Settings for opening the port and timing the client, loadable from JSON.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::client::{ClientOptions, DEFAULT_CLOSE_GRACE_MS};
use crate::protocol::{
    PortSettings, ProtocolError, DEFAULT_BAUD_RATE, DEFAULT_READ_TIMEOUT_MS, STARTUP_DELAY_MS,
};

/// Default history log file, relative to the working directory
pub const DEFAULT_LOG_FILE: &str = "log.txt";

/// Client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Serial port name
    pub port_name: String,
    /// Baud rate
    pub baud_rate: u32,
    /// Read timeout in milliseconds
    pub read_timeout_ms: u64,
    /// Firmware boot time after port open in milliseconds
    pub startup_delay_ms: u64,
    /// Bound on waiting for the read loop during close, in milliseconds
    pub close_grace_ms: u64,
    /// History log file; `None` keeps history in memory listeners only
    pub log_path: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            port_name: String::new(),
            baud_rate: DEFAULT_BAUD_RATE,
            read_timeout_ms: DEFAULT_READ_TIMEOUT_MS,
            startup_delay_ms: STARTUP_DELAY_MS,
            close_grace_ms: DEFAULT_CLOSE_GRACE_MS,
            log_path: Some(PathBuf::from(DEFAULT_LOG_FILE)),
        }
    }
}

impl ClientConfig {
    /// Defaults for `port_name`
    pub fn new(port_name: impl Into<String>) -> Self {
        Self {
            port_name: port_name.into(),
            ..Self::default()
        }
    }

    /// Load from a JSON file; missing fields take their defaults
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ProtocolError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| ProtocolError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&content)
            .map_err(|e| ProtocolError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Parse from JSON text
    pub fn from_json(content: &str) -> Result<Self, ProtocolError> {
        let config: Self =
            serde_json::from_str(content).map_err(|e| ProtocolError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ProtocolError> {
        if self.baud_rate == 0 {
            return Err(ProtocolError::Config("baud_rate must be non-zero".to_string()));
        }
        if self.read_timeout_ms == 0 {
            return Err(ProtocolError::Config(
                "read_timeout_ms must be non-zero".to_string(),
            ));
        }
        if self.close_grace_ms <= self.read_timeout_ms {
            return Err(ProtocolError::Config(format!(
                "close_grace_ms ({}) must exceed read_timeout_ms ({})",
                self.close_grace_ms, self.read_timeout_ms
            )));
        }
        Ok(())
    }

    /// Settings for opening the serial port
    pub fn port_settings(&self) -> PortSettings {
        PortSettings {
            name: self.port_name.clone(),
            baud_rate: self.baud_rate,
            read_timeout: Duration::from_millis(self.read_timeout_ms),
        }
    }

    /// Runtime timing for [`crate::client::Client::new`]
    pub fn options(&self) -> ClientOptions {
        ClientOptions {
            read_timeout: Duration::from_millis(self.read_timeout_ms),
            startup_delay: Duration::from_millis(self.startup_delay_ms),
            close_grace: Duration::from_millis(self.close_grace_ms),
        }
    }
}
