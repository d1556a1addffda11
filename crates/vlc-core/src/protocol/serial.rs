//! Serial port handling
//!
//! Opens the transceiver's serial port.

use serialport::{DataBits, FlowControl, Parity, StopBits};
use std::time::Duration;

use super::{stream::SerialChannel, Channel, ProtocolError};

/// Serial link settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortSettings {
    /// Port name (e.g., "/dev/tty.usbmodem101" or "COM3")
    pub name: String,
    /// Line speed
    pub baud_rate: u32,
    /// Upper bound on a single blocking read
    pub read_timeout: Duration,
}

/// Open the port 8N1 without flow control
pub fn open_port(settings: &PortSettings) -> Result<Box<dyn Channel>, ProtocolError> {
    let port = serialport::new(&settings.name, settings.baud_rate)
        .data_bits(DataBits::Eight)
        .parity(Parity::None)
        .stop_bits(StopBits::One)
        .flow_control(FlowControl::None)
        .timeout(settings.read_timeout)
        .open()
        .map_err(|e| ProtocolError::OpenFailed {
            port: settings.name.clone(),
            message: e.to_string(),
        })?;

    tracing::info!(
        port = %settings.name,
        baud = settings.baud_rate,
        "opened serial port"
    );

    Ok(Box::new(SerialChannel::new(port)))
}
