//! In-memory transceiver used by the integration tests

use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use vlc_core::protocol::Channel;

#[derive(Default)]
struct DeviceState {
    written: Vec<u8>,
    inbound: VecDeque<io::Result<Vec<u8>>>,
    fail_writes: bool,
    read_timeout: Duration,
    open_handles: usize,
    /// Sent every millisecond once the inbound queue is empty
    stream: Option<Vec<u8>>,
}

/// Handle for scripting the device and inspecting what the client wrote
#[derive(Clone, Default)]
pub struct MockDevice {
    state: Arc<Mutex<DeviceState>>,
}

#[allow(dead_code)]
impl MockDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// A channel onto this device, as the client would get from the port
    pub fn channel(&self) -> Box<dyn Channel> {
        Box::new(MockChannel::open(self.state.clone()))
    }

    /// Queue bytes for the client to read
    pub fn push_bytes(&self, bytes: &[u8]) {
        self.state.lock().unwrap().inbound.push_back(Ok(bytes.to_vec()));
    }

    /// Queue a read failure
    pub fn push_error(&self, kind: io::ErrorKind) {
        self.state
            .lock()
            .unwrap()
            .inbound
            .push_back(Err(io::Error::new(kind, "mock failure")));
    }

    /// Keep sending `bytes` for as long as nothing else is queued
    pub fn stream_forever(&self, bytes: &[u8]) {
        self.state.lock().unwrap().stream = Some(bytes.to_vec());
    }

    pub fn fail_writes(&self, fail: bool) {
        self.state.lock().unwrap().fail_writes = fail;
    }

    pub fn written(&self) -> Vec<u8> {
        self.state.lock().unwrap().written.clone()
    }

    /// Channels onto this device that have not been dropped yet
    pub fn open_handles(&self) -> usize {
        self.state.lock().unwrap().open_handles
    }
}

struct MockChannel {
    state: Arc<Mutex<DeviceState>>,
}

impl MockChannel {
    fn open(state: Arc<Mutex<DeviceState>>) -> Self {
        state.lock().unwrap().open_handles += 1;
        Self { state }
    }
}

impl Drop for MockChannel {
    fn drop(&mut self) {
        if let Ok(mut state) = self.state.lock() {
            state.open_handles -= 1;
        }
    }
}

impl Read for MockChannel {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let (next, streamed, timeout) = {
            let mut state = self.state.lock().unwrap();
            match state.inbound.pop_front() {
                Some(queued) => (Some(queued), false, state.read_timeout),
                None => (state.stream.clone().map(Ok), true, state.read_timeout),
            }
        };
        match next {
            Some(Ok(bytes)) => {
                if streamed {
                    std::thread::sleep(Duration::from_millis(1));
                }
                let n = bytes.len().min(buf.len());
                buf[..n].copy_from_slice(&bytes[..n]);
                if n < bytes.len() {
                    self.state
                        .lock()
                        .unwrap()
                        .inbound
                        .push_front(Ok(bytes[n..].to_vec()));
                }
                Ok(n)
            }
            Some(Err(e)) => Err(e),
            None => {
                std::thread::sleep(timeout);
                Err(io::Error::new(io::ErrorKind::TimedOut, "timed out"))
            }
        }
    }
}

impl Write for MockChannel {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self.state.lock().unwrap();
        if state.fail_writes {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "device unplugged"));
        }
        state.written.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Channel for MockChannel {
    fn set_timeout(&mut self, timeout: Duration) -> io::Result<()> {
        self.state.lock().unwrap().read_timeout = timeout;
        Ok(())
    }

    fn try_clone(&self) -> io::Result<Box<dyn Channel>> {
        Ok(Box::new(MockChannel::open(self.state.clone())))
    }
}

/// Poll `condition` until it holds or `timeout` passes
#[allow(dead_code)]
pub fn wait_for(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = std::time::Instant::now() + timeout;
    while std::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    condition()
}
