//! Bill table returned by the GET BILL TABLE command.

use std::fmt;

use serde::Serialize;

use crate::bitset::BILL_TYPES;
use crate::{Error, Result};

/// Encoded length of one bill table entry.
pub const ENTRY_LEN: usize = 5;
/// Encoded length of the full bill table.
pub const TABLE_LEN: usize = ENTRY_LEN * BILL_TYPES as usize;

const COUNTRY_CODE: std::ops::Range<usize> = 1..4;
const EXPONENT_INDEX: usize = 4;
const NEGATIVE_EXPONENT: u8 = 0x80;

/// One bill type slot: `value * 10^exponent` in the currency named by `country_code`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BillTableEntry {
    denomination: f64,
    country_code: String,
    #[serde(skip)]
    value: u8,
    #[serde(skip)]
    exponent: i16,
}

impl BillTableEntry {
    /// Decodes an entry from its 5-byte encoding.
    ///
    /// The exponent byte is biased: values above `0x80` are negative exponents.
    pub fn from_bytes(buf: &[u8; ENTRY_LEN]) -> Self {
        let value = buf[0];
        let exponent = match buf[EXPONENT_INDEX] {
            b if b > NEGATIVE_EXPONENT => -((b - NEGATIVE_EXPONENT) as i16),
            b => b as i16,
        };

        let country_code = String::from_utf8_lossy(&buf[COUNTRY_CODE])
            .trim_end_matches(['\0', ' '])
            .to_owned();

        Self {
            denomination: Self::scale(value, exponent),
            country_code,
            value,
            exponent,
        }
    }

    // Dividing by the positive power keeps results like 5e-2 exact.
    fn scale(value: u8, exponent: i16) -> f64 {
        let magnitude = 10f64.powi(exponent.unsigned_abs() as i32);
        if exponent < 0 {
            value as f64 / magnitude
        } else {
            value as f64 * magnitude
        }
    }

    pub fn denomination(&self) -> f64 {
        self.denomination
    }

    /// Three-letter country code, with padding removed.
    pub fn country_code(&self) -> &str {
        self.country_code.as_str()
    }

    /// Raw first byte of the entry.
    pub const fn value(&self) -> u8 {
        self.value
    }

    /// Decoded power-of-ten exponent.
    pub const fn exponent(&self) -> i16 {
        self.exponent
    }

    /// Whether the slot is unassigned.
    pub fn is_empty(&self) -> bool {
        self.value == 0
    }
}

impl fmt::Display for BillTableEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.denomination, self.country_code)
    }
}

/// The 24 bill type slots of the validator, indexed by bill type.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(transparent)]
pub struct BillTable(Vec<BillTableEntry>);

impl BillTable {
    /// Decodes the bill table from a GET BILL TABLE payload.
    ///
    /// Fails with [Error::FrameFormat] if fewer than [TABLE_LEN] bytes are present.
    pub fn from_payload(payload: &[u8]) -> Result<Self> {
        if payload.len() < TABLE_LEN {
            return Err(Error::FrameFormat(format!(
                "bill table payload too short: {} bytes, expected {TABLE_LEN}",
                payload.len()
            )));
        }

        let entries = payload[..TABLE_LEN]
            .chunks_exact(ENTRY_LEN)
            .map(|chunk| {
                let mut buf = [0u8; ENTRY_LEN];
                buf.copy_from_slice(chunk);
                BillTableEntry::from_bytes(&buf)
            })
            .collect();

        Ok(Self(entries))
    }

    /// Gets the entry for `bill_type`.
    pub fn get(&self, bill_type: u8) -> Option<&BillTableEntry> {
        self.0.get(bill_type as usize)
    }

    pub fn entries(&self) -> &[BillTableEntry] {
        self.0.as_ref()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BillTableEntry> {
        self.0.iter()
    }

    /// Assigned slots, paired with their bill type.
    pub fn denominations(&self) -> impl Iterator<Item = (u8, &BillTableEntry)> {
        self.0
            .iter()
            .enumerate()
            .filter(|(_, entry)| !entry.is_empty())
            .map(|(idx, entry)| (idx as u8, entry))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
