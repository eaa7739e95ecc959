#![allow(dead_code)]

use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time;

use parking_lot::{Mutex, MutexGuard};

use cc_validator::{crc, frame, Connector, Error, Result};

static INIT: AtomicBool = AtomicBool::new(false);
static LOCK: Mutex<()> = Mutex::new(());

fn is_init() -> bool {
    INIT.load(Ordering::Relaxed)
}

fn set_init(val: bool) {
    INIT.store(val, Ordering::SeqCst);
}

pub fn init() -> Result<MutexGuard<'static, ()>> {
    if !is_init() {
        set_init(true);
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug"))
            .format_timestamp(Some(env_logger::fmt::TimestampPrecision::Millis))
            .is_test(true)
            .try_init()
            .ok();
    }

    LOCK.try_lock_for(time::Duration::from_secs(5))
        .ok_or(Error::Timeout("locking test mutex".into()))
}

/// Builds a device response frame around `body` (command echo and payload, or a control byte).
pub fn device_frame(body: &[u8]) -> Vec<u8> {
    let mut buf = vec![
        frame::START_CODE,
        frame::PERIPHERAL_ADDRESS,
        (frame::HEADER_LEN + body.len() + frame::CRC_LEN) as u8,
    ];
    buf.extend_from_slice(body);
    let crc = crc::crc16(&buf);
    buf.extend_from_slice(&crc.to_le_bytes());
    buf
}

/// Produces the response body for a request, or `None` to stay silent.
pub type Handler = Box<dyn FnMut(u8, &[u8]) -> Option<Vec<u8>> + Send>;

struct DeviceState {
    rx: Vec<u8>,
    tx: VecDeque<u8>,
    requests: Vec<(u8, Vec<u8>)>,
    handler: Handler,
    chunk: usize,
    reads: usize,
    connects: usize,
    fail_ack: bool,
}

impl DeviceState {
    fn process(&mut self) {
        while self.rx.len() >= frame::MIN_FRAME_LEN
            && self.rx.len() >= self.rx[frame::LEN_INDEX] as usize
        {
            let len = self.rx[frame::LEN_INDEX] as usize;
            let request: Vec<u8> = self.rx.drain(..len).collect();

            assert_eq!(request[0], frame::START_CODE);
            assert_eq!(request[1], frame::PERIPHERAL_ADDRESS);
            assert!(crc::verify(&request).is_ok(), "bad request CRC: {request:02x?}");

            let command = request[frame::COMMAND_INDEX];
            let payload = request[frame::COMMAND_INDEX + 1..len - frame::CRC_LEN].to_vec();

            if command != frame::control::ACK {
                if let Some(body) = (self.handler)(command, &payload) {
                    self.tx.extend(device_frame(&body));
                }
            }

            self.requests.push((command, payload));
        }
    }
}

/// Scripted stand-in for a validator on the other end of the serial line.
#[derive(Clone)]
pub struct MockDevice {
    state: Arc<Mutex<DeviceState>>,
}

impl MockDevice {
    pub fn new<F>(handler: F) -> Self
    where
        F: FnMut(u8, &[u8]) -> Option<Vec<u8>> + Send + 'static,
    {
        Self {
            state: Arc::new(Mutex::new(DeviceState {
                rx: Vec::new(),
                tx: VecDeque::new(),
                requests: Vec::new(),
                handler: Box::new(handler),
                chunk: usize::MAX,
                reads: 0,
                connects: 0,
                fail_ack: false,
            })),
        }
    }

    /// Limits how many bytes a single read returns.
    pub fn with_chunk(self, chunk: usize) -> Self {
        self.state.lock().chunk = chunk;
        self
    }

    /// Makes every write of a host ACK frame fail with a broken pipe.
    pub fn fail_ack_writes(self) -> Self {
        self.state.lock().fail_ack = true;
        self
    }

    /// Every request received so far, as `(command, payload)`.
    pub fn requests(&self) -> Vec<(u8, Vec<u8>)> {
        self.state.lock().requests.clone()
    }

    /// Command codes received so far.
    pub fn commands(&self) -> Vec<u8> {
        self.requests().into_iter().map(|(cmd, _)| cmd).collect()
    }

    pub fn reads(&self) -> usize {
        self.state.lock().reads
    }

    pub fn connects(&self) -> usize {
        self.state.lock().connects
    }

    pub fn connector(&self) -> MockConnector {
        MockConnector {
            device: self.clone(),
        }
    }
}

pub struct MockConnector {
    device: MockDevice,
}

impl Connector for MockConnector {
    type Transport = MockTransport;

    fn connect(&mut self) -> Result<MockTransport> {
        self.device.state.lock().connects += 1;

        Ok(MockTransport {
            state: Arc::clone(&self.device.state),
        })
    }

    fn name(&self) -> &str {
        "mock"
    }
}

pub struct MockTransport {
    state: Arc<Mutex<DeviceState>>,
}

impl io::Read for MockTransport {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut state = self.state.lock();
        state.reads += 1;

        if state.tx.is_empty() {
            return Err(io::Error::new(io::ErrorKind::TimedOut, "mock device silent"));
        }

        let len = buf.len().min(state.chunk).min(state.tx.len());
        for (dst, src) in buf.iter_mut().zip(state.tx.drain(..len)) {
            *dst = src;
        }

        Ok(len)
    }
}

impl io::Write for MockTransport {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self.state.lock();

        if state.fail_ack && buf.get(frame::COMMAND_INDEX) == Some(&frame::control::ACK) {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "mock ACK write failed"));
        }

        state.rx.extend_from_slice(buf);
        state.process();

        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
