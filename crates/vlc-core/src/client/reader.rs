//! Background read loop
//!
//! Drives LineReader → history → classifier → event bus on a dedicated
//! thread until cancelled or the device goes away.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::events::EventBus;
use crate::history::{Direction, HistoryRecorder};
use crate::protocol::{Event, LineReader, ReadError};

/// Pause before retrying after a transient read failure
const TRANSIENT_RETRY_DELAY: Duration = Duration::from_millis(10);

/// Cooperative stop request shared between the client and its read loop
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// A token that has not been cancelled
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a stop; the loop sees it within one read timeout
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether a stop has been requested
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Why the read loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// Cancellation was observed
    Cancelled,
    /// The link failed in a way retrying cannot fix
    Fatal,
}

/// Reads lines from the device until cancelled or the link fails
pub struct ReadLoop {
    reader: LineReader,
    token: CancelToken,
    history: Arc<HistoryRecorder>,
    events: Arc<EventBus>,
}

impl ReadLoop {
    /// Loop over `reader`, recording into `history` and publishing on `events`
    pub fn new(
        reader: LineReader,
        token: CancelToken,
        history: Arc<HistoryRecorder>,
        events: Arc<EventBus>,
    ) -> Self {
        Self {
            reader,
            token,
            history,
            events,
        }
    }

    /// Run on a new thread; the exit reason is sent on `done`
    pub fn spawn(self, done: mpsc::Sender<LoopExit>) -> io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name("vlc-reader".to_string())
            .spawn(move || {
                let exit = self.run();
                let _ = done.send(exit);
            })
    }

    /// Loop until cancelled. Cancellation is checked once per read timeout.
    pub fn run(mut self) -> LoopExit {
        tracing::debug!("read loop started");
        while !self.token.is_cancelled() {
            match self.reader.read_line() {
                Ok(None) => continue,
                Ok(Some(bytes)) => self.handle_line(&bytes),
                Err(ReadError::Transient(e)) => {
                    if self.token.is_cancelled() {
                        break;
                    }
                    tracing::debug!("transient read failure, retrying: {}", e);
                    thread::sleep(TRANSIENT_RETRY_DELAY);
                }
                Err(ReadError::Fatal(e)) => {
                    tracing::warn!("read loop stopped, link failed: {}", e);
                    return LoopExit::Fatal;
                }
            }
        }
        tracing::debug!("read loop cancelled");
        LoopExit::Cancelled
    }

    fn handle_line(&self, bytes: &[u8]) {
        // Lossy UTF-8: invalid bytes become U+FFFD, valid multibyte text passes through
        let decoded = String::from_utf8_lossy(bytes);
        let line = decoded.trim();
        if line.is_empty() {
            return;
        }

        self.history.record(Direction::FromDevice, line);

        let event = Event::classify(line);
        if event.is_unknown() {
            tracing::trace!("ignoring unrecognised line {:?}", line);
            return;
        }
        self.events.dispatch(&event);
    }
}
