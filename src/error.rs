//! Error types for bill validator communication.

use std::io;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by the protocol engine and the [DeviceHandle](crate::DeviceHandle).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O failure on the physical link.
    #[error("transport error: {0}")]
    Transport(String),
    /// Response frame is malformed (bad start code/address, or too short).
    #[error("invalid frame format: {0}")]
    FrameFormat(String),
    /// Trailing checksum does not match the computed one.
    #[error("checksum mismatch: expected {expected:#06x}, received {received:#06x}")]
    ChecksumMismatch { expected: u16, received: u16 },
    /// Response frame was not completed within the read attempt budget.
    #[error("read attempts exhausted after {0} tries")]
    RetryExhausted(usize),
    /// Device explicitly rejected the request.
    #[error("device replied with NACK")]
    DeviceNack,
    /// Device reports the command code as unsupported.
    #[error("device reported illegal command")]
    IllegalCommand,
    /// Bill-type index outside of `[0, 23]`.
    #[error("invalid bill type index: {0}")]
    InvalidIndex(u8),
    /// Operation not permitted in the current connection state.
    #[error("connection state error: {0}")]
    ConnectionState(String),
    /// A lock or response deadline expired.
    #[error("timed out {0}")]
    Timeout(String),
    /// Invalid configuration value.
    #[error("configuration error: {0}")]
    Config(String),
    /// Failure serializing a decoded result.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Self::Transport(format!("{err}"))
    }
}

impl From<serialport::Error> for Error {
    fn from(err: serialport::Error) -> Self {
        Self::Transport(format!("{err}"))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(format!("{err}"))
    }
}
