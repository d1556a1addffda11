//! Protocol commands
//!
//! Defines the commands understood by the transceiver firmware and their
//! line encoding.

use serde::{Deserialize, Serialize};

use super::ProtocolError;

/// Frame terminator appended to every outbound command
pub const LINE_TERMINATOR: u8 = b'\n';

/// Separator between the message body and the destination of a send
pub const MESSAGE_SEPARATOR: char = '\0';

/// Commands for transceiver communication
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    /// Reset the device ('r')
    Reset,

    /// Query firmware version ('p')
    RequestVersion,

    /// Query the device's own address ('a')
    RequestAddress,

    /// Assign the device address ('a[addr]')
    SetAddress(String),

    /// Send a text message to a peer ('m[msg\0,dest]')
    SendText {
        /// Message body
        message: String,
        /// Peer address
        destination: String,
    },

    /// Set a configuration parameter ('c[group,param,value]')
    Configure(ConfigureRequest),
}

impl Command {
    /// Command text as recorded in history, without the terminator
    pub fn encode(&self) -> String {
        match self {
            Command::Reset => "r".to_string(),
            Command::RequestVersion => "p".to_string(),
            Command::RequestAddress => "a".to_string(),
            Command::SetAddress(address) => format!("a[{}]", field_text(address)),
            Command::SendText {
                message,
                destination,
            } => format!(
                "m[{}{},{}]",
                field_text(message),
                MESSAGE_SEPARATOR,
                field_text(destination)
            ),
            Command::Configure(req) => {
                format!("c[{},{},{}]", req.group, req.parameter, req.value)
            }
        }
    }

    /// Wire bytes: ASCII command text plus a single newline
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes: Vec<u8> = self
            .encode()
            .chars()
            .map(|c| if c.is_ascii() { c as u8 } else { b'?' })
            .collect();
        bytes.push(LINE_TERMINATOR);
        bytes
    }
}

/// Line breaks or a NUL inside a field would corrupt the frame on the wire
fn field_text(field: &str) -> String {
    field.replace(['\r', '\n', MESSAGE_SEPARATOR], " ")
}

/// Configuration write parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigureRequest {
    /// Parameter group (0: PHY, 1: MAC, 2: LOG)
    pub group: i64,
    /// Parameter index within the group
    pub parameter: i64,
    /// New value
    pub value: i64,
}

impl ConfigureRequest {
    /// Request with already-validated values
    pub fn new(group: i64, parameter: i64, value: i64) -> Self {
        Self {
            group,
            parameter,
            value,
        }
    }

    /// Build a request from operator-entered text.
    ///
    /// Empty fields count as `0`. Non-empty fields accept decimal or
    /// `0x`/`0o`/`0b` prefixed literals.
    pub fn parse(group: &str, parameter: &str, value: &str) -> Result<Self, ProtocolError> {
        Ok(Self {
            group: parse_field("group", group)?,
            parameter: parse_field("parameter", parameter)?,
            value: parse_field("value", value)?,
        })
    }
}

fn parse_field(field: &'static str, input: &str) -> Result<i64, ProtocolError> {
    if input.trim().is_empty() {
        return Ok(0);
    }
    parse_int_literal(input).ok_or_else(|| ProtocolError::InvalidNumericInput {
        field,
        input: input.to_string(),
    })
}

/// Parse an integer literal with optional sign and radix prefix.
///
/// Accepts `42`, `-7`, `0x1F`, `0o17`, `0b101` and `1_000`. Decimal
/// literals may not carry leading zeros unless the value is zero.
pub fn parse_int_literal(text: &str) -> Option<i64> {
    let s = text.trim();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let (radix, digits) = match rest.get(..2) {
        Some("0x") | Some("0X") => (16, &rest[2..]),
        Some("0o") | Some("0O") => (8, &rest[2..]),
        Some("0b") | Some("0B") => (2, &rest[2..]),
        _ => (10, rest),
    };
    // A prefixed literal may put one underscore right after the prefix
    let digits = if radix == 10 {
        digits
    } else {
        digits.strip_prefix('_').unwrap_or(digits)
    };

    if digits.is_empty()
        || digits.starts_with('_')
        || digits.ends_with('_')
        || digits.contains("__")
    {
        return None;
    }

    let cleaned: String = digits.chars().filter(|c| *c != '_').collect();
    if !cleaned.chars().all(|c| c.is_digit(radix)) {
        return None;
    }
    if radix == 10 && cleaned.starts_with('0') && cleaned.chars().any(|c| c != '0') {
        return None;
    }

    if negative {
        i64::from_str_radix(&format!("-{cleaned}"), radix).ok()
    } else {
        i64::from_str_radix(&cleaned, radix).ok()
    }
}
