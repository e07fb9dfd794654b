//! Addressing of single configuration bits.

use serde::{Deserialize, Serialize};

/// Index of a zone within its [`DeviceGeometry`](crate::DeviceGeometry).
///
/// Zone ids are positions in the geometry's zone table, so they are only
/// meaningful together with the geometry that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ZoneId(u32);

impl ZoneId {
    /// Creates a zone id from a raw table index.
    pub fn from_raw(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw table index.
    pub fn as_raw(self) -> u32 {
        self.0
    }

    /// Returns the table index as a `usize` for slice indexing.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A single configuration bit: `(zone, word offset, bit index)`.
///
/// Ordering is zone, then word, then bit, which is also the order in which
/// the bits appear inside one zone of an encoded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BitAddress {
    /// The zone holding the bit.
    pub zone: ZoneId,
    /// Word offset within the zone.
    pub word: u32,
    /// Bit index within the word (0 = least significant).
    pub bit: u8,
}

impl BitAddress {
    /// Creates a new bit address.
    pub fn new(zone: ZoneId, word: u32, bit: u8) -> Self {
        Self { zone, word, bit }
    }
}
