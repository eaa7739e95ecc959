//! Bill-type bitmask codec.
//!
//! Bill types are indexed `0..=23`. On the wire a set of bill types is packed
//! into three bytes in reverse order: index 23 is the most-significant bit of
//! byte 0, index 0 the least-significant bit of byte 2.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::{Error, Result};

/// Number of bill-type slots supported by the validator.
pub const BILL_TYPES: u8 = 24;
/// Length of an encoded bill-type mask.
pub const MASK_LEN: usize = 3;

/// Packs bill-type `indices` into a 3-byte mask.
///
/// Fails with [Error::InvalidIndex] if any index is outside `0..=23`.
pub fn encode(indices: &[u8]) -> Result<[u8; MASK_LEN]> {
    let mut mask = [0u8; MASK_LEN];

    for &index in indices {
        if index >= BILL_TYPES {
            return Err(Error::InvalidIndex(index));
        }

        let pos = (BILL_TYPES - 1 - index) as usize;
        mask[pos / 8] |= 1 << (7 - pos % 8);
    }

    Ok(mask)
}

/// Unpacks a mask into bill-type indices, in wire order: byte 0 (types 16-23) first,
/// and from the least-significant bit within each byte.
///
/// Only the first three bytes of `mask` carry bill types; anything after is ignored.
pub fn decode(mask: &[u8]) -> Vec<u8> {
    let mut indices = Vec::new();

    for (b, &byte) in mask.iter().take(MASK_LEN).enumerate() {
        let base = 16 - 8 * b as u8;
        for i in 0..8u8 {
            if byte & (1 << i) != 0 {
                indices.push(base + i);
            }
        }
    }

    indices
}

/// Set of bill-type indices in `0..=23`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct BillTypeSet(u32);

impl BillTypeSet {
    /// Creates an empty [BillTypeSet].
    pub const fn new() -> Self {
        Self(0)
    }

    /// Creates a [BillTypeSet] with every bill type enabled.
    pub const fn all() -> Self {
        Self((1 << BILL_TYPES) - 1)
    }

    /// Creates a [BillTypeSet] from a list of indices.
    pub fn from_indices(indices: &[u8]) -> Result<Self> {
        let mut set = Self::new();
        for &index in indices {
            set.insert(index)?;
        }
        Ok(set)
    }

    /// Decodes a [BillTypeSet] from a wire mask.
    pub fn from_mask(mask: &[u8]) -> Self {
        Self(decode(mask).into_iter().fold(0, |acc, idx| acc | 1 << idx))
    }

    /// Encodes the set into its 3-byte wire mask.
    pub fn to_mask(&self) -> [u8; MASK_LEN] {
        let bytes = self.0.to_be_bytes();
        [bytes[1], bytes[2], bytes[3]]
    }

    /// Adds a bill type to the set.
    pub fn insert(&mut self, index: u8) -> Result<()> {
        if index >= BILL_TYPES {
            Err(Error::InvalidIndex(index))
        } else {
            self.0 |= 1 << index;
            Ok(())
        }
    }

    /// Removes a bill type from the set, returning whether it was present.
    pub fn remove(&mut self, index: u8) -> bool {
        let present = self.contains(index);
        if index < BILL_TYPES {
            self.0 &= !(1 << index);
        }
        present
    }

    pub fn contains(&self, index: u8) -> bool {
        index < BILL_TYPES && self.0 & (1 << index) != 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Iterates over the bill types in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        (0..BILL_TYPES).filter(move |&idx| self.contains(idx))
    }

    /// Collects the bill types into an ascending list.
    pub fn to_vec(&self) -> Vec<u8> {
        self.iter().collect()
    }
}

impl fmt::Display for BillTypeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.to_vec())
    }
}

impl Serialize for BillTypeSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}
