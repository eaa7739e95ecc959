//! Identification data returned by the IDENTIFICATION command.

use std::fmt;
use std::ops::Range;

use serde::Serialize;

use crate::{Error, Result};

/// Part number field.
pub const PART_NUMBER: Range<usize> = 0..15;
/// Serial number field.
pub const SERIAL_NUMBER: Range<usize> = 16..27;
/// Asset number field.
pub const ASSET_NUMBER: Range<usize> = 28..34;
/// Minimum payload length covering every field.
pub const IDENTIFICATION_LEN: usize = ASSET_NUMBER.end;

/// Validator part, serial and asset numbers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Identification {
    part_number: String,
    serial_number: String,
    asset_number: Vec<u8>,
}

impl Identification {
    /// Decodes an IDENTIFICATION payload.
    ///
    /// Fails with [Error::FrameFormat] if the payload is shorter than [IDENTIFICATION_LEN].
    pub fn from_payload(payload: &[u8]) -> Result<Self> {
        if payload.len() < IDENTIFICATION_LEN {
            return Err(Error::FrameFormat(format!(
                "identification payload too short: {} bytes, expected {IDENTIFICATION_LEN}",
                payload.len()
            )));
        }

        Ok(Self {
            part_number: text_field(&payload[PART_NUMBER]),
            serial_number: text_field(&payload[SERIAL_NUMBER]),
            asset_number: payload[ASSET_NUMBER].to_vec(),
        })
    }

    pub fn part_number(&self) -> &str {
        self.part_number.as_str()
    }

    pub fn serial_number(&self) -> &str {
        self.serial_number.as_str()
    }

    /// Raw asset number bytes.
    pub fn asset_number(&self) -> &[u8] {
        self.asset_number.as_ref()
    }
}

// ASCII fields are padded with spaces or NULs.
fn text_field(buf: &[u8]) -> String {
    String::from_utf8_lossy(buf)
        .trim_end_matches(['\0', ' '])
        .to_owned()
}

impl fmt::Display for Identification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "part number: {}, serial number: {}, asset number: {:02x?}",
            self.part_number, self.serial_number, self.asset_number
        )
    }
}
