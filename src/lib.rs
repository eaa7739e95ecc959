//! Driver for CCNET-style bill validators on a point-to-point serial link.
//!
//! The [DeviceHandle] issues one command at a time: it builds a request
//! [frame], writes it to the transport, accumulates the response with a
//! bounded [ResponseReader], validates it, acknowledges it, and decodes the
//! payload into a typed result.

#[macro_use]
mod macros;

pub mod bill_table;
pub mod bitset;
pub mod command;
pub mod config;
pub mod crc;
pub mod device_handle;
mod error;
pub mod frame;
pub mod identification;
pub mod observer;
pub mod reader;
pub mod status;
pub mod transport;

pub use bill_table::{BillTable, BillTableEntry};
pub use bitset::BillTypeSet;
pub use command::{BillStatus, Command};
pub use config::{Baud, SerialConfig};
pub use device_handle::DeviceHandle;
pub use error::{Error, Result};
pub use frame::Reply;
pub use identification::Identification;
pub use observer::{Direction, FrameObserver, LogObserver, NoopObserver};
pub use reader::ResponseReader;
pub use status::{DeviceStatus, FailureCode, RejectReason, Status};
pub use transport::{Connector, SerialConnector, Transport};
