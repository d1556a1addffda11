//! Transceiver client
//!
//! Owns the serial link for its whole lifetime: sends commands, runs the
//! background read loop and fans traffic out to listeners.

mod reader;

pub use reader::{CancelToken, LoopExit, ReadLoop};

use std::io;
use std::sync::{mpsc, Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::config::ClientConfig;
use crate::events::EventBus;
use crate::history::{Direction, HistoryEntry, HistoryRecorder};
use crate::protocol::{
    open_port, Channel, Command, ConfigureRequest, Event, ProtocolError, Transport,
    DEFAULT_READ_TIMEOUT_MS, STARTUP_DELAY_MS,
};

/// Default time `close` waits for the read loop, in milliseconds.
///
/// An idle loop notices cancellation only when its current read times out,
/// so this must exceed the read timeout.
pub const DEFAULT_CLOSE_GRACE_MS: u64 = DEFAULT_READ_TIMEOUT_MS + 500;

/// Runtime timing for a client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientOptions {
    /// Upper bound on one blocking read; also the cancellation latency
    pub read_timeout: Duration,
    /// Quiet period after the port opens before the first command goes out
    pub startup_delay: Duration,
    /// How long `close` waits for the read loop before giving up on it
    pub close_grace: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            read_timeout: Duration::from_millis(DEFAULT_READ_TIMEOUT_MS),
            startup_delay: Duration::from_millis(STARTUP_DELAY_MS),
            close_grace: Duration::from_millis(DEFAULT_CLOSE_GRACE_MS),
        }
    }
}

struct ReaderHandle {
    thread: JoinHandle<()>,
    done: mpsc::Receiver<LoopExit>,
}

/// Protocol client for one transceiver
pub struct Client {
    transport: Mutex<Transport>,
    history: Arc<HistoryRecorder>,
    events: Arc<EventBus>,
    token: CancelToken,
    reader: Mutex<Option<ReaderHandle>>,
    /// Commands wait until the firmware has booted
    ready_at: Instant,
    close_grace: Duration,
    log_error: Option<String>,
}

impl Client {
    /// Open the configured port and start the client.
    ///
    /// A history log that cannot be opened does not fail the client; the
    /// reason is available from [`Client::history_log_error`].
    pub fn open(config: &ClientConfig) -> Result<Self, ProtocolError> {
        let channel = open_port(&config.port_settings())?;

        let mut log_error = None;
        let history = match &config.log_path {
            Some(path) => match HistoryRecorder::open_file(path) {
                Ok(recorder) => recorder,
                Err(e) => {
                    let recorder = HistoryRecorder::without_sink();
                    recorder.report_error(&e);
                    log_error = Some(format!("{}: {}", path.display(), e));
                    recorder
                }
            },
            None => HistoryRecorder::without_sink(),
        };

        let mut client = Self::new(channel, history, config.options())?;
        client.log_error = log_error;
        Ok(client)
    }

    /// Start a client on an already-open channel
    pub fn new(
        channel: Box<dyn Channel>,
        history: HistoryRecorder,
        options: ClientOptions,
    ) -> Result<Self, ProtocolError> {
        let (transport, line_reader) = Transport::split(channel, options.read_timeout)?;

        let history = Arc::new(history);
        let events = Arc::new(EventBus::new());
        let token = CancelToken::new();

        let (done_tx, done_rx) = mpsc::channel();
        let thread = ReadLoop::new(line_reader, token.clone(), history.clone(), events.clone())
            .spawn(done_tx)
            .map_err(ProtocolError::ReaderSpawn)?;

        tracing::debug!(
            startup_delay_ms = options.startup_delay.as_millis() as u64,
            "client started"
        );

        Ok(Self {
            transport: Mutex::new(transport),
            history,
            events,
            token,
            reader: Mutex::new(Some(ReaderHandle {
                thread,
                done: done_rx,
            })),
            ready_at: Instant::now() + options.startup_delay,
            close_grace: options.close_grace,
            log_error: None,
        })
    }

    /// Register a listener for classified device events.
    ///
    /// Listeners run on the read thread and must return quickly.
    pub fn subscribe<F>(&self, listener: F)
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.events.subscribe(listener);
    }

    /// Register a listener for every line sent or received
    pub fn subscribe_history<F>(&self, listener: F)
    where
        F: Fn(&HistoryEntry) + Send + Sync + 'static,
    {
        self.history.subscribe(listener);
    }

    /// Register a listener for history log write failures
    pub fn subscribe_log_errors<F>(&self, listener: F)
    where
        F: Fn(&io::Error) + Send + Sync + 'static,
    {
        self.history.subscribe_errors(listener);
    }

    /// Why the history log file could not be opened, if it could not
    pub fn history_log_error(&self) -> Option<&str> {
        self.log_error.as_deref()
    }

    /// Record and transmit `command`
    pub fn send(&self, command: &Command) -> Result<(), ProtocolError> {
        if self.is_closed() {
            return Err(ProtocolError::Closed);
        }
        self.wait_until_ready();

        let text = command.encode();
        self.history.record(Direction::ToDevice, &text);
        self.lock_transport().write(&command.to_bytes())
    }

    /// Ask the device to reset
    pub fn reset(&self) -> Result<(), ProtocolError> {
        self.send(&Command::Reset)
    }

    /// Ask for the firmware version
    pub fn request_version(&self) -> Result<(), ProtocolError> {
        self.send(&Command::RequestVersion)
    }

    /// Ask for the device's own address
    pub fn request_address(&self) -> Result<(), ProtocolError> {
        self.send(&Command::RequestAddress)
    }

    /// Assign the device address
    pub fn set_address(&self, address: &str) -> Result<(), ProtocolError> {
        self.send(&Command::SetAddress(address.to_string()))
    }

    /// Send `message` to the peer at `destination`
    pub fn send_text(&self, message: &str, destination: &str) -> Result<(), ProtocolError> {
        self.send(&Command::SendText {
            message: message.to_string(),
            destination: destination.to_string(),
        })
    }

    /// Set `parameter` of `group` to `value`
    pub fn configure(&self, group: i64, parameter: i64, value: i64) -> Result<(), ProtocolError> {
        self.send(&Command::Configure(ConfigureRequest::new(
            group, parameter, value,
        )))
    }

    /// Validate operator-entered fields, then configure.
    ///
    /// Nothing is sent if any field is not an integer.
    pub fn configure_from_text(
        &self,
        group: &str,
        parameter: &str,
        value: &str,
    ) -> Result<(), ProtocolError> {
        let request = ConfigureRequest::parse(group, parameter, value)?;
        self.send(&Command::Configure(request))
    }

    /// Whether `close` has been called
    pub fn is_closed(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Stop the read loop and release the port.
    ///
    /// Waits at most the close grace period for the loop; the port is closed
    /// either way. Calling this again does nothing.
    pub fn close(&self) {
        self.token.cancel();

        let handle = self
            .reader
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(handle) = handle {
            // Closed from a listener: the loop exits once this call returns
            if handle.thread.thread().id() == thread::current().id() {
                tracing::debug!("close called from the read loop");
            } else {
                Self::await_reader(handle, self.close_grace);
            }
        }

        if self.lock_transport().close() {
            tracing::info!("transport closed");
        }
    }

    fn await_reader(handle: ReaderHandle, grace: Duration) {
        match handle.done.recv_timeout(grace) {
            Ok(exit) => {
                tracing::debug!(?exit, "read loop finished");
                let _ = handle.thread.join();
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                // The loop thread died without reporting, e.g. a listener panicked
                if handle.thread.join().is_err() {
                    tracing::warn!("read loop terminated abnormally");
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {
                tracing::warn!(
                    grace_ms = grace.as_millis() as u64,
                    "read loop still busy after close grace period, detaching"
                );
            }
        }
    }

    fn wait_until_ready(&self) {
        let remaining = self.ready_at.saturating_duration_since(Instant::now());
        if !remaining.is_zero() {
            tracing::debug!(
                wait_ms = remaining.as_millis() as u64,
                "waiting for device startup"
            );
            thread::sleep(remaining);
        }
    }

    fn lock_transport(&self) -> MutexGuard<'_, Transport> {
        self.transport
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        self.close();
    }
}
