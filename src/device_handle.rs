use std::io::Write;
use std::time;

use parking_lot::{Mutex, MutexGuard};

use crate::bitset::BillTypeSet;
use crate::observer::{FrameObserver, NoopObserver};
use crate::reader::ResponseReader;
use crate::transport::{Connector, SerialConnector};
use crate::{
    BillStatus, BillTable, Command, DeviceStatus, Error, Identification, Result, SerialConfig,
};

mod inner;

/// Timeout for waiting for lock on the connection mutex (milliseconds).
pub const LOCK_TIMEOUT_MS: u64 = 5_000;

/// Connector plus the transport it opened, if the connection is open.
pub(crate) struct Link<C: Connector> {
    connector: C,
    transport: Option<C::Transport>,
}

/// Handle for communicating with a bill validator over a byte-stream transport.
///
/// Every command is a synchronous request/response exchange. The transport is
/// held behind a mutex, so concurrent callers are serialized instead of
/// interleaving bytes on the wire.
///
/// ```no_run
/// # fn main() -> cc_validator::Result<()> {
/// let handle = cc_validator::DeviceHandle::new("/dev/ttyUSB0")?;
///
/// let status = handle.poll()?;
/// log::info!("Validator status: {status}");
/// # Ok(())
/// # }
/// ```
pub struct DeviceHandle<C: Connector = SerialConnector> {
    link: Mutex<Link<C>>,
    reader: ResponseReader,
    observer: Box<dyn FrameObserver>,
}

impl DeviceHandle<SerialConnector> {
    /// Creates a new [DeviceHandle] with a serial connection over the supplied serial device,
    /// using default parameters.
    pub fn new(serial_path: &str) -> Result<Self> {
        Self::from_config(SerialConfig::new(serial_path))
    }

    /// Creates a new [DeviceHandle] with a serial connection described by `config`.
    pub fn from_config(config: SerialConfig) -> Result<Self> {
        let reader = ResponseReader::new(config.read_attempts())
            .with_deadline(config.response_timeout());

        Self::with_connector(SerialConnector::new(config)?, reader)
    }
}

impl<C: Connector> DeviceHandle<C> {
    /// Creates a new [DeviceHandle] from a [Connector], opening the connection immediately.
    pub fn with_connector(connector: C, reader: ResponseReader) -> Result<Self> {
        let handle = Self::new_closed(connector, reader);
        handle.open()?;
        Ok(handle)
    }

    /// Creates a new [DeviceHandle] in the closed state. Call [open](Self::open) before
    /// sending commands.
    pub fn new_closed(connector: C, reader: ResponseReader) -> Self {
        Self {
            link: Mutex::new(Link {
                connector,
                transport: None,
            }),
            reader,
            observer: Box::new(NoopObserver),
        }
    }

    /// Sets the observer receiving every raw frame on the wire.
    pub fn set_observer<O: FrameObserver + 'static>(&mut self, observer: O) {
        self.observer = Box::new(observer);
    }

    /// Builder-style variant of [set_observer](Self::set_observer).
    pub fn with_observer<O: FrameObserver + 'static>(mut self, observer: O) -> Self {
        self.set_observer(observer);
        self
    }

    /// Gets the read settings used for every response.
    pub fn reader(&self) -> &ResponseReader {
        &self.reader
    }

    /// Opens the transport.
    ///
    /// Returns an `Err(_)` if the connection is already open.
    pub fn open(&self) -> Result<()> {
        let mut link = self.link()?;

        if link.transport.is_some() {
            return Err(Error::ConnectionState("connection already open".into()));
        }

        let transport = link.connector.connect()?;
        link.transport = Some(transport);

        log::debug!("Opened connection to {}", link.connector.name());

        Ok(())
    }

    /// Closes the transport, releasing the underlying device.
    ///
    /// Returns an `Err(_)` if the connection is not open.
    pub fn close(&self) -> Result<()> {
        let mut link = self.link()?;

        let mut transport = link
            .transport
            .take()
            .ok_or(Error::ConnectionState("connection not open".into()))?;

        let res = transport.flush();

        log::debug!("Closed connection to {}", link.connector.name());

        res.map_err(Error::from)
    }

    /// Whether the transport is open.
    pub fn is_open(&self) -> Result<bool> {
        Ok(self.link()?.transport.is_some())
    }

    pub(crate) fn link(&self) -> Result<MutexGuard<'_, Link<C>>> {
        self.link
            .try_lock_for(time::Duration::from_millis(LOCK_TIMEOUT_MS))
            .ok_or(Error::Timeout("locking validator connection".into()))
    }

    /// Send a [Reset](Command::Reset) command to the device.
    ///
    /// The caller should poll until the device reports it has finished initializing.
    pub fn reset(&self) -> Result<()> {
        self.exchange(Command::Reset).map(|_| ())
    }

    /// Send a [GetStatus](Command::GetStatus) command, returning the enabled and
    /// security bill types.
    pub fn get_status(&self) -> Result<BillStatus> {
        let payload = self.exchange(Command::GetStatus)?;
        BillStatus::from_payload(&payload)
    }

    /// Send a [SetSecurity](Command::SetSecurity) command, setting high security for the
    /// `security` bill types.
    ///
    /// Returns an `Err(_)` if any bill type is outside `0..=23`.
    pub fn set_security(&self, security: &[u8]) -> Result<()> {
        let security = BillTypeSet::from_indices(security)?;
        self.exchange(Command::SetSecurity(security)).map(|_| ())
    }

    /// Send a [Poll](Command::Poll) command to the device.
    pub fn poll(&self) -> Result<DeviceStatus> {
        let payload = self.exchange(Command::Poll)?;

        DeviceStatus::from_payload(&payload)
            .ok_or(Error::FrameFormat("empty poll response".into()))
    }

    /// Send an [EnableBillTypes](Command::EnableBillTypes) command.
    ///
    /// - `enabled`: bill types the device should accept
    /// - `escrow`: bill types the device should hold in escrow
    ///
    /// Returns an `Err(_)` if any bill type is outside `0..=23`.
    pub fn enable_bill_types(&self, enabled: &[u8], escrow: &[u8]) -> Result<()> {
        let command = Command::EnableBillTypes {
            enabled: BillTypeSet::from_indices(enabled)?,
            escrow: BillTypeSet::from_indices(escrow)?,
        };

        self.exchange(command).map(|_| ())
    }

    /// Disables every bill type, so the device stops accepting bills.
    pub fn disable_bill_types(&self) -> Result<()> {
        self.enable_bill_types(&[], &[])
    }

    /// Send a [Stack](Command::Stack) command to stack the bill held in escrow.
    pub fn stack(&self) -> Result<()> {
        self.exchange(Command::Stack).map(|_| ())
    }

    /// Send a [Return](Command::Return) command to return the bill held in escrow.
    pub fn return_bill(&self) -> Result<()> {
        self.exchange(Command::Return).map(|_| ())
    }

    /// Send an [Identification](Command::Identification) command.
    pub fn identification(&self) -> Result<Identification> {
        let payload = self.exchange(Command::Identification)?;
        Identification::from_payload(&payload)
    }

    /// Send a [Hold](Command::Hold) command, extending the escrow hold time.
    pub fn hold(&self) -> Result<()> {
        self.exchange(Command::Hold).map(|_| ())
    }

    /// Send a [SetBarcodeParameters](Command::SetBarcodeParameters) command.
    pub fn set_barcode_parameters(&self, format: u8, characters: u8) -> Result<()> {
        self.exchange(Command::SetBarcodeParameters { format, characters })
            .map(|_| ())
    }

    /// Send an [ExtractBarcodeData](Command::ExtractBarcodeData) command, returning the raw
    /// barcode bytes.
    pub fn extract_barcode_data(&self) -> Result<Vec<u8>> {
        self.exchange(Command::ExtractBarcodeData)
    }

    /// Send a [GetBillTable](Command::GetBillTable) command.
    pub fn get_bill_table(&self) -> Result<BillTable> {
        let payload = self.exchange(Command::GetBillTable)?;
        BillTable::from_payload(&payload)
    }

    /// Send a [GetCrc32](Command::GetCrc32) command, returning the raw firmware checksum bytes.
    pub fn get_crc32(&self) -> Result<Vec<u8>> {
        self.exchange(Command::GetCrc32)
    }

    /// Send an [Ack](Command::Ack) frame to the device.
    ///
    /// Substantive responses are already acknowledged automatically.
    pub fn ack(&self) -> Result<()> {
        let mut link = self.link()?;
        self.handshake(&mut link)
    }

    /// Send a [Nack](Command::Nack) frame, asking the device to repeat its last response.
    pub fn nack(&self) -> Result<()> {
        self.exchange(Command::Nack).map(|_| ())
    }

    fn exchange(&self, command: Command) -> Result<Vec<u8>> {
        let mut link = self.link()?;
        Ok(self.poll_message(&mut link, command)?.into_payload())
    }
}
