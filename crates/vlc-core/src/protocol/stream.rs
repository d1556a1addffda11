//! Byte channels and line framing
//!
//! A [`Channel`] is the raw serial handle. The client splits it into a write
//! half kept by the caller-facing side and a [`LineReader`] owned by the
//! read loop.

use serialport::SerialPort;
use std::io::{self, Read, Write};
use std::time::{Duration, Instant};

use super::{commands::LINE_TERMINATOR, ProtocolError, ReadError};

/// Abstraction over the device link
pub trait Channel: Read + Write + Send {
    /// Set timeout for blocking reads
    fn set_timeout(&mut self, timeout: Duration) -> io::Result<()>;

    /// Open a second handle onto the same link
    fn try_clone(&self) -> io::Result<Box<dyn Channel>>;
}

/// Serial port wrapper implementing Channel
pub struct SerialChannel {
    port: Box<dyn SerialPort>,
}

impl SerialChannel {
    /// Wrap an open serial port
    pub fn new(port: Box<dyn SerialPort>) -> Self {
        Self { port }
    }
}

impl Read for SerialChannel {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.port.read(buf)
    }
}

impl Write for SerialChannel {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.port.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.port.flush()
    }
}

impl Channel for SerialChannel {
    fn set_timeout(&mut self, timeout: Duration) -> io::Result<()> {
        self.port.set_timeout(timeout).map_err(io::Error::other)
    }

    fn try_clone(&self) -> io::Result<Box<dyn Channel>> {
        let port_clone = self.port.try_clone().map_err(io::Error::other)?;
        Ok(Box::new(SerialChannel::new(port_clone)))
    }
}

/// Write half of the device link
pub struct Transport {
    writer: Option<Box<dyn Channel>>,
}

impl Transport {
    /// Write half over `channel`
    pub fn new(channel: Box<dyn Channel>) -> Self {
        Self {
            writer: Some(channel),
        }
    }

    /// Split `channel` into a write half and a line reader with `read_timeout`
    pub fn split(
        channel: Box<dyn Channel>,
        read_timeout: Duration,
    ) -> io::Result<(Transport, LineReader)> {
        let read_half = channel.try_clone()?;
        Ok((Transport::new(channel), LineReader::new(read_half, read_timeout)?))
    }

    /// Write all of `bytes` and flush
    pub fn write(&mut self, bytes: &[u8]) -> Result<(), ProtocolError> {
        let channel = self.writer.as_mut().ok_or(ProtocolError::Closed)?;
        channel
            .write_all(bytes)
            .and_then(|_| channel.flush())
            .map_err(ProtocolError::WriteFailed)
    }

    /// Whether the handle has not been released yet
    pub fn is_open(&self) -> bool {
        self.writer.is_some()
    }

    /// Release the handle. Returns false if it was already released.
    pub fn close(&mut self) -> bool {
        self.writer.take().is_some()
    }
}

/// Longest line kept before the rest of it is discarded
pub const MAX_LINE_LEN: usize = 4096;

/// Splits a channel's byte stream into newline-terminated lines.
///
/// Each call returns within roughly the read timeout, even while bytes keep
/// arriving. Bytes that arrive without a terminator are held until the rest
/// of the line shows up. Once more than [`MAX_LINE_LEN`] unterminated bytes
/// pile up, they are dropped along with the rest of that line.
pub struct LineReader {
    channel: Box<dyn Channel>,
    timeout: Duration,
    pending: Vec<u8>,
    /// Inside an oversize line; bytes are dropped until the next terminator
    discarding: bool,
}

impl LineReader {
    /// Wrap `channel`, setting its read timeout
    pub fn new(mut channel: Box<dyn Channel>, timeout: Duration) -> io::Result<Self> {
        channel.set_timeout(timeout)?;
        Ok(Self {
            channel,
            timeout,
            pending: Vec::new(),
            discarding: false,
        })
    }

    /// Read one line, without its terminator.
    ///
    /// Returns `Ok(None)` when the timeout elapses before a full line arrives.
    pub fn read_line(&mut self) -> Result<Option<Vec<u8>>, ReadError> {
        if let Some(line) = self.take_line() {
            return Ok(Some(line));
        }

        let deadline = Instant::now() + self.timeout;
        let mut buffer = [0u8; 256];
        loop {
            match self.channel.read(&mut buffer) {
                // Serial drivers report "nothing yet" as a zero-length read
                Ok(0) => return Ok(None),
                Ok(n) => {
                    self.accept(&buffer[..n]);
                    if let Some(line) = self.take_line() {
                        return Ok(Some(line));
                    }
                    if Instant::now() >= deadline {
                        return Ok(None);
                    }
                }
                Err(ref e)
                    if e.kind() == io::ErrorKind::TimedOut
                        || e.kind() == io::ErrorKind::WouldBlock =>
                {
                    return Ok(None);
                }
                Err(e) => return Err(ReadError::classify(e)),
            }
        }
    }

    /// Bytes held for a line that has not been terminated yet
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    fn accept(&mut self, bytes: &[u8]) {
        let mut bytes = bytes;
        if self.discarding {
            match bytes.iter().position(|b| *b == LINE_TERMINATOR) {
                Some(end) => {
                    self.discarding = false;
                    bytes = &bytes[end + 1..];
                }
                None => return,
            }
        }
        self.pending.extend_from_slice(bytes);

        let unterminated = match self.pending.iter().rposition(|b| *b == LINE_TERMINATOR) {
            Some(last) => self.pending.len() - last - 1,
            None => self.pending.len(),
        };
        if unterminated > MAX_LINE_LEN {
            tracing::warn!(
                max = MAX_LINE_LEN,
                "dropping unterminated line longer than the frame limit"
            );
            self.pending.truncate(self.pending.len() - unterminated);
            self.discarding = true;
        }
    }

    fn take_line(&mut self) -> Option<Vec<u8>> {
        let end = self.pending.iter().position(|b| *b == LINE_TERMINATOR)?;
        let mut line: Vec<u8> = self.pending.drain(..=end).collect();
        line.pop();
        Some(line)
    }
}
