//! Device geometry: the table of configuration memory zones.
//!
//! A zone is a block of word-addressed configuration memory (one tile
//! column, one shift-chain region, ...). The geometry fixes each zone's word
//! count and word width, which determines the total image size, and a
//! serialization order used by every binary layout.
//!
//! # Format
//!
//! ```json
//! { "zones": [
//!     { "name": "r0", "words": 128, "word_width": 32, "order": 0 },
//!     { "name": "r1", "words": 64, "word_width": 32, "order": 1 }
//! ] }
//! ```

use crate::addr::{BitAddress, ZoneId};
use crate::error::{AddressError, DatabaseError};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Maximum supported word width in bits.
pub const MAX_WORD_WIDTH: u32 = 64;

/// One zone of configuration memory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    /// Zone identifier, unique within the device.
    pub name: String,
    /// Number of addressable words.
    pub words: u32,
    /// Bits per word (1..=64).
    pub word_width: u32,
    /// Position of this zone in the serialized image.
    pub order: u32,
}

/// Serialized form of a geometry, validated on conversion.
#[derive(Clone, Serialize, Deserialize)]
struct GeometryDef {
    zones: Vec<Zone>,
}

/// The validated zone table of one device.
///
/// Immutable once constructed. Zone ids handed out by [`zone_id`](Self::zone_id)
/// are stable for the lifetime of the geometry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "GeometryDef", into = "GeometryDef")]
pub struct DeviceGeometry {
    zones: Vec<Zone>,
    by_name: HashMap<String, ZoneId>,
    serial: Vec<ZoneId>,
}

impl DeviceGeometry {
    /// Validates a zone table and builds the geometry.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::InvalidGeometry`] if the table is empty, a
    /// zone name is empty or repeated, a zone has no words, a word width is
    /// outside 1..=64, or two zones share a serialization order.
    pub fn new(zones: Vec<Zone>) -> Result<Self, DatabaseError> {
        if zones.is_empty() {
            return Err(DatabaseError::InvalidGeometry(
                "at least one zone is required".to_string(),
            ));
        }

        let mut by_name = HashMap::with_capacity(zones.len());
        let mut orders = HashSet::with_capacity(zones.len());
        for (i, zone) in zones.iter().enumerate() {
            if zone.name.is_empty()
                || zone
                    .name
                    .chars()
                    .any(|c| c == ':' || c.is_whitespace())
            {
                return Err(DatabaseError::InvalidGeometry(format!(
                    "invalid zone name '{}'",
                    zone.name
                )));
            }
            if zone.words == 0 {
                return Err(DatabaseError::InvalidGeometry(format!(
                    "zone '{}' has no words",
                    zone.name
                )));
            }
            if zone.word_width == 0 || zone.word_width > MAX_WORD_WIDTH {
                return Err(DatabaseError::InvalidGeometry(format!(
                    "zone '{}' word width {} is outside 1..={MAX_WORD_WIDTH}",
                    zone.name, zone.word_width
                )));
            }
            if by_name
                .insert(zone.name.clone(), ZoneId::from_raw(i as u32))
                .is_some()
            {
                return Err(DatabaseError::InvalidGeometry(format!(
                    "duplicate zone '{}'",
                    zone.name
                )));
            }
            if !orders.insert(zone.order) {
                return Err(DatabaseError::InvalidGeometry(format!(
                    "zone '{}' repeats serialization order {}",
                    zone.name, zone.order
                )));
            }
        }

        let mut serial: Vec<ZoneId> = (0..zones.len() as u32).map(ZoneId::from_raw).collect();
        serial.sort_by_key(|id| zones[id.index()].order);

        Ok(Self {
            zones,
            by_name,
            serial,
        })
    }

    /// Returns the zones in table order.
    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    /// Returns the zone with the given id.
    pub fn zone(&self, id: ZoneId) -> Option<&Zone> {
        self.zones.get(id.index())
    }

    /// Looks up a zone id by name.
    pub fn zone_id(&self, name: &str) -> Option<ZoneId> {
        self.by_name.get(name).copied()
    }

    /// Returns zone ids sorted by serialization order.
    pub fn serialization_order(&self) -> &[ZoneId] {
        &self.serial
    }

    /// Returns the total number of words across all zones.
    pub fn total_words(&self) -> u64 {
        self.zones.iter().map(|z| u64::from(z.words)).sum()
    }

    /// Returns the total number of configuration bits in the device.
    pub fn total_bits(&self) -> u64 {
        self.zones
            .iter()
            .map(|z| u64::from(z.words) * u64::from(z.word_width))
            .sum()
    }

    /// Returns whether the address names an existing bit.
    pub fn contains(&self, addr: BitAddress) -> bool {
        self.zone(addr.zone)
            .is_some_and(|z| addr.word < z.words && u32::from(addr.bit) < z.word_width)
    }

    /// Formats an address as `zone:word:bit`.
    ///
    /// Unknown zone ids are printed as `#<index>`.
    pub fn format_address(&self, addr: BitAddress) -> String {
        match self.zone(addr.zone) {
            Some(z) => format!("{}:{}:{}", z.name, addr.word, addr.bit),
            None => format!("#{}:{}:{}", addr.zone.as_raw(), addr.word, addr.bit),
        }
    }

    /// Parses a `zone:word:bit` address and checks it against the geometry.
    ///
    /// # Errors
    ///
    /// Returns an [`AddressError`] if the text is malformed, the zone is
    /// unknown, or the word/bit lies outside the zone.
    pub fn parse_address(&self, text: &str) -> Result<BitAddress, AddressError> {
        let mut parts = text.split(':');
        let (Some(zone), Some(word), Some(bit), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(AddressError::Malformed {
                text: text.to_string(),
            });
        };

        let zone_id = self.zone_id(zone).ok_or_else(|| AddressError::UnknownZone {
            zone: zone.to_string(),
            text: text.to_string(),
        })?;
        let word = word.parse::<u32>().map_err(|source| AddressError::InvalidWord {
            text: text.to_string(),
            source,
        })?;
        let bit = bit.parse::<u8>().map_err(|source| AddressError::InvalidBit {
            text: text.to_string(),
            source,
        })?;

        let addr = BitAddress::new(zone_id, word, bit);
        if !self.contains(addr) {
            return Err(AddressError::OutOfZone {
                zone: zone.to_string(),
                text: text.to_string(),
            });
        }
        Ok(addr)
    }
}

impl TryFrom<GeometryDef> for DeviceGeometry {
    type Error = DatabaseError;

    fn try_from(def: GeometryDef) -> Result<Self, Self::Error> {
        DeviceGeometry::new(def.zones)
    }
}

impl From<DeviceGeometry> for GeometryDef {
    fn from(geometry: DeviceGeometry) -> Self {
        GeometryDef {
            zones: geometry.zones,
        }
    }
}
