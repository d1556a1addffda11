//! # VLC Core Library
//!
//! Protocol client for visible-light-communication transceivers attached
//! over a serial link.

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//!
//! This library provides:
//! - Command encoding for the transceiver's line protocol
//! - Classification of device responses into typed events
//! - A background read loop with cooperative cancellation
//! - Event and traffic-history fan-out to listeners
//! - A durable, append-only traffic log
//!
//! ## Example
//!
//! ```rust,ignore
//! use vlc_core::{client::Client, config::ClientConfig, protocol::Event};
//!
//! let client = Client::open(&ClientConfig::new("/dev/tty.usbmodem101"))?;
//! client.subscribe(|event: &Event| {
//!     if let Some(description) = event.describe() {
//!         println!("{}", description.text);
//!     }
//! });
//! client.request_version()?;
//! client.send_text("hello", "FF")?;
//! client.close();
//! ```

pub mod client;
pub mod config;
pub mod events;
pub mod history;
pub mod protocol;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::client::{Client, ClientOptions};
    pub use crate::config::ClientConfig;
    pub use crate::history::{Direction, HistoryEntry, HistoryRecorder};
    pub use crate::protocol::{Command, ConfigureRequest, Event, ProtocolError};
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
