//! Command table: wire codes, request payload encoding, and shared response types.

use std::fmt;

use serde::Serialize;

use crate::bitset::{BillTypeSet, MASK_LEN};
use crate::frame;
use crate::{Error, Result};

/// Command codes.
pub mod code {
    pub const ACK: u8 = 0x00;
    pub const RESET: u8 = 0x30;
    pub const GET_STATUS: u8 = 0x31;
    pub const SET_SECURITY: u8 = 0x32;
    pub const POLL: u8 = 0x33;
    pub const ENABLE_BILL_TYPES: u8 = 0x34;
    pub const STACK: u8 = 0x35;
    pub const RETURN: u8 = 0x36;
    pub const IDENTIFICATION: u8 = 0x37;
    pub const HOLD: u8 = 0x38;
    pub const BARCODE: u8 = 0x3a;
    pub const GET_BILL_TABLE: u8 = 0x41;
    pub const GET_CRC32: u8 = 0x51;
    pub const NACK: u8 = 0xff;
}

/// A request to the validator, with its parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Reset,
    GetStatus,
    SetSecurity(BillTypeSet),
    Poll,
    EnableBillTypes {
        enabled: BillTypeSet,
        escrow: BillTypeSet,
    },
    Stack,
    Return,
    Identification,
    Hold,
    SetBarcodeParameters {
        format: u8,
        characters: u8,
    },
    ExtractBarcodeData,
    GetBillTable,
    GetCrc32,
    Ack,
    Nack,
}

impl Command {
    /// Gets the wire command code.
    pub const fn code(&self) -> u8 {
        match self {
            Self::Reset => code::RESET,
            Self::GetStatus => code::GET_STATUS,
            Self::SetSecurity(_) => code::SET_SECURITY,
            Self::Poll => code::POLL,
            Self::EnableBillTypes { .. } => code::ENABLE_BILL_TYPES,
            Self::Stack => code::STACK,
            Self::Return => code::RETURN,
            Self::Identification => code::IDENTIFICATION,
            Self::Hold => code::HOLD,
            Self::SetBarcodeParameters { .. } | Self::ExtractBarcodeData => code::BARCODE,
            Self::GetBillTable => code::GET_BILL_TABLE,
            Self::GetCrc32 => code::GET_CRC32,
            Self::Ack => code::ACK,
            Self::Nack => code::NACK,
        }
    }

    /// Encodes the request payload.
    pub fn payload(&self) -> Vec<u8> {
        match self {
            Self::SetSecurity(security) => security.to_mask().to_vec(),
            Self::EnableBillTypes { enabled, escrow } => {
                let mut buf = Vec::with_capacity(2 * MASK_LEN);
                buf.extend_from_slice(&enabled.to_mask());
                buf.extend_from_slice(&escrow.to_mask());
                buf
            }
            Self::SetBarcodeParameters { format, characters } => vec![*format, *characters],
            _ => Vec::new(),
        }
    }

    /// Builds the complete request frame.
    pub fn to_frame(&self) -> Result<Vec<u8>> {
        frame::build_request(self.code(), &self.payload())
    }

    /// Whether the device answers this command.
    ///
    /// ACK and NACK are host replies that complete an exchange; the device sends nothing back.
    pub const fn expects_reply(&self) -> bool {
        !matches!(self, Self::Ack | Self::Nack)
    }

    pub const fn to_str(&self) -> &'static str {
        match self {
            Self::Reset => "reset",
            Self::GetStatus => "get status",
            Self::SetSecurity(_) => "set security",
            Self::Poll => "poll",
            Self::EnableBillTypes { .. } => "enable bill types",
            Self::Stack => "stack",
            Self::Return => "return",
            Self::Identification => "identification",
            Self::Hold => "hold",
            Self::SetBarcodeParameters { .. } => "set barcode parameters",
            Self::ExtractBarcodeData => "extract barcode data",
            Self::GetBillTable => "get bill table",
            Self::GetCrc32 => "get crc32",
            Self::Ack => "ack",
            Self::Nack => "nack",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0x{:02x})", self.to_str(), self.code())
    }
}

/// Bill types reported by GET STATUS.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct BillStatus {
    enabled: BillTypeSet,
    security: BillTypeSet,
}

/// Offset of the security mask in a GET STATUS payload; byte 3 is not part of either mask.
const SECURITY_OFFSET: usize = MASK_LEN + 1;

impl BillStatus {
    pub const fn new(enabled: BillTypeSet, security: BillTypeSet) -> Self {
        Self { enabled, security }
    }

    /// Decodes a GET STATUS payload.
    pub fn from_payload(payload: &[u8]) -> Result<Self> {
        if payload.len() < MASK_LEN {
            return Err(Error::FrameFormat(format!(
                "status payload too short: {} bytes, expected at least {MASK_LEN}",
                payload.len()
            )));
        }

        let security = payload.get(SECURITY_OFFSET..).unwrap_or_default();

        Ok(Self {
            enabled: BillTypeSet::from_mask(&payload[..MASK_LEN]),
            security: BillTypeSet::from_mask(security),
        })
    }

    /// Bill types the validator currently accepts.
    pub const fn enabled(&self) -> BillTypeSet {
        self.enabled
    }

    /// Bill types validated with high security.
    pub const fn security(&self) -> BillTypeSet {
        self.security
    }
}

impl fmt::Display for BillStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "enabled: {}, security: {}", self.enabled, self.security)
    }
}
