//! History recorder
//!
//! Appends traffic to a durable log and notifies history listeners.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Mutex;

use super::{format::format_line, Direction, HistoryEntry};
use crate::events::Registry;

/// Append-only destination for log lines
pub type LogSink = Box<dyn Write + Send>;

/// Timestamps traffic, writes it to the log sink and fans it out.
///
/// Sink failures never reach the protocol path; they go to tracing and to
/// log-error listeners instead.
pub struct HistoryRecorder {
    sink: Mutex<Option<LogSink>>,
    listeners: Registry<HistoryEntry>,
    error_listeners: Registry<io::Error>,
}

impl HistoryRecorder {
    /// Create a recorder writing to `sink`
    pub fn new(sink: LogSink) -> Self {
        Self::with_sink(Some(sink))
    }

    /// Create a recorder that only notifies listeners
    pub fn without_sink() -> Self {
        Self::with_sink(None)
    }

    /// Open (or create) `path` in append mode
    pub fn open_file<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path.as_ref())?;
        tracing::debug!(path = %path.as_ref().display(), "history log opened");
        Ok(Self::new(Box::new(file)))
    }

    fn with_sink(sink: Option<LogSink>) -> Self {
        Self {
            sink: Mutex::new(sink),
            listeners: Registry::new(),
            error_listeners: Registry::new(),
        }
    }

    /// Whether lines are being persisted
    pub fn has_sink(&self) -> bool {
        self.lock_sink().is_some()
    }

    /// Register a listener for every recorded entry
    pub fn subscribe<F>(&self, listener: F)
    where
        F: Fn(&HistoryEntry) + Send + Sync + 'static,
    {
        self.listeners.subscribe(listener);
    }

    /// Register a listener for log write failures
    pub fn subscribe_errors<F>(&self, listener: F)
    where
        F: Fn(&io::Error) + Send + Sync + 'static,
    {
        self.error_listeners.subscribe(listener);
    }

    /// Report a log failure that happened outside `record`
    pub fn report_error(&self, err: &io::Error) {
        tracing::warn!("history log unavailable: {}", err);
        self.error_listeners.dispatch(err);
    }

    /// Record one line of traffic.
    ///
    /// The entry is stamped and written under the sink lock, so the log
    /// order matches the order of `record` calls.
    pub fn record(&self, direction: Direction, payload: &str) -> HistoryEntry {
        let (entry, write_result) = {
            let mut sink = self.lock_sink();
            let entry = HistoryEntry::now(direction, payload);
            let result = match sink.as_mut() {
                Some(writer) => {
                    writeln!(writer, "{}", format_line(&entry)).and_then(|_| writer.flush())
                }
                None => Ok(()),
            };
            (entry, result)
        };

        if let Err(e) = write_result {
            self.report_error(&e);
        }

        self.listeners.dispatch(&entry);
        entry
    }

    fn lock_sink(&self) -> std::sync::MutexGuard<'_, Option<LogSink>> {
        self.sink
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
