//! Byte-stream transports and the connectors that open them.

use std::io::{Read, Write};

use crate::{Result, SerialConfig};

/// Blocking byte stream to the validator.
///
/// Reads are expected to return within a bounded timeout, either with data or
/// with an [io::ErrorKind::TimedOut](std::io::ErrorKind::TimedOut) error.
pub trait Transport: Read + Write + Send {}

impl<T: Read + Write + Send> Transport for T {}

/// Opens transports for a [DeviceHandle](crate::DeviceHandle).
///
/// Called once on creation, and again on every reopen after a close.
pub trait Connector: Send {
    type Transport: Transport;

    fn connect(&mut self) -> Result<Self::Transport>;

    /// Name used to tag diagnostics, e.g. the serial path.
    fn name(&self) -> &str {
        "validator"
    }
}

/// Opens the validator's serial port.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SerialConnector {
    config: SerialConfig,
}

impl SerialConnector {
    /// Creates a new [SerialConnector] from a validated `config`.
    pub fn new(config: SerialConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SerialConfig {
        &self.config
    }
}

impl Connector for SerialConnector {
    type Transport = Box<dyn serialport::SerialPort>;

    fn connect(&mut self) -> Result<Self::Transport> {
        let config = &self.config;

        log::debug!(
            "Opening serial port {} at {} BAUD",
            config.path(),
            config.baud()
        );

        let port = serialport::new(config.path(), config.baud().into())
            // disable flow control serial lines
            .flow_control(serialport::FlowControl::None)
            // eight-bit data size
            .data_bits(serialport::DataBits::Eight)
            // no control bit parity
            .parity(serialport::Parity::None)
            // one bit stop
            .stop_bits(serialport::StopBits::One)
            // bound every read so a silent device cannot block forever
            .timeout(config.timeout())
            .open()?;

        Ok(port)
    }

    fn name(&self) -> &str {
        self.config.path()
    }
}
