//! Scripted channel shared by the unit tests

use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::thread;
use std::time::Duration;

use super::Channel;

/// Replays scripted read results, then either times out or keeps streaming
pub(crate) struct ScriptedChannel {
    reads: VecDeque<io::Result<Vec<u8>>>,
    /// Sleep before reporting a timeout once the script runs dry
    idle_delay: Duration,
    /// Bytes returned on every read once the script runs dry
    stream: Option<(Vec<u8>, Duration)>,
}

impl ScriptedChannel {
    pub(crate) fn new(reads: Vec<io::Result<Vec<u8>>>) -> Self {
        Self {
            reads: reads.into(),
            idle_delay: Duration::ZERO,
            stream: None,
        }
    }

    pub(crate) fn idle_delay(mut self, delay: Duration) -> Self {
        self.idle_delay = delay;
        self
    }

    /// Deliver `bytes` every `interval` forever after the script
    pub(crate) fn streaming(mut self, bytes: &[u8], interval: Duration) -> Self {
        self.stream = Some((bytes.to_vec(), interval));
        self
    }

    pub(crate) fn boxed(self) -> Box<dyn Channel> {
        Box::new(self)
    }
}

impl Read for ScriptedChannel {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.reads.pop_front() {
            Some(Ok(bytes)) => {
                buf[..bytes.len()].copy_from_slice(&bytes);
                Ok(bytes.len())
            }
            Some(Err(e)) => Err(e),
            None => match &self.stream {
                Some((bytes, interval)) => {
                    thread::sleep(*interval);
                    buf[..bytes.len()].copy_from_slice(bytes);
                    Ok(bytes.len())
                }
                None => {
                    thread::sleep(self.idle_delay);
                    Err(io::Error::new(io::ErrorKind::TimedOut, "timed out"))
                }
            },
        }
    }
}

impl Write for ScriptedChannel {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Channel for ScriptedChannel {
    fn set_timeout(&mut self, _timeout: Duration) -> io::Result<()> {
        Ok(())
    }

    fn try_clone(&self) -> io::Result<Box<dyn Channel>> {
        Err(io::Error::new(io::ErrorKind::Unsupported, "scripted"))
    }
}
