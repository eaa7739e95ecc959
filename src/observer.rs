//! Raw frame diagnostics.

use std::fmt;

/// Direction of a frame on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Host to device.
    Outgoing,
    /// Device to host.
    Incoming,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Outgoing => write!(f, "->"),
            Self::Incoming => write!(f, "<-"),
        }
    }
}

/// Receives every raw frame written to, or read from, the device.
pub trait FrameObserver: Send + Sync {
    fn on_frame(&self, direction: Direction, frame: &[u8]);
}

/// Observer that ignores all frames.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopObserver;

impl FrameObserver for NoopObserver {
    fn on_frame(&self, _direction: Direction, _frame: &[u8]) {}
}

/// Observer that traces frames through the `log` facade.
#[derive(Clone, Debug)]
pub struct LogObserver {
    name: String,
}

impl LogObserver {
    /// Creates a new [LogObserver] tagging frames with `name`, usually the serial path.
    pub fn new(name: &str) -> Self {
        Self { name: name.into() }
    }
}

impl FrameObserver for LogObserver {
    fn on_frame(&self, direction: Direction, frame: &[u8]) {
        log::trace!("validator[{}]: {direction} {frame:02X?}", self.name);
    }
}

impl<F> FrameObserver for F
where
    F: Fn(Direction, &[u8]) + Send + Sync,
{
    fn on_frame(&self, direction: Direction, frame: &[u8]) {
        self(direction, frame)
    }
}
