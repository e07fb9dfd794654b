//! In-memory bitstream images.

use crate::error::EncodingError;
use qlf_db::{BitAddress, DeviceGeometry, ZoneId};

/// The full configuration memory of one device.
///
/// Words are stored per zone in a `u64` each, masked to the zone's word
/// width. A new image is all zero. An image belongs to a single conversion
/// and is never shared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitstreamImage {
    geometry: DeviceGeometry,
    /// `words[zone][word]`, indexed by zone id.
    words: Vec<Vec<u64>>,
}

fn mask(width: u32) -> u64 {
    if width >= 64 {
        u64::MAX
    } else {
        (1u64 << width) - 1
    }
}

impl BitstreamImage {
    /// Creates an all-zero image sized for the geometry.
    pub fn new(geometry: &DeviceGeometry) -> Self {
        let words = geometry
            .zones()
            .iter()
            .map(|z| vec![0u64; z.words as usize])
            .collect();
        Self {
            geometry: geometry.clone(),
            words,
        }
    }

    /// Returns the geometry the image was sized for.
    pub fn geometry(&self) -> &DeviceGeometry {
        &self.geometry
    }

    /// Reads one bit. Addresses outside the geometry read as 0.
    pub fn get(&self, addr: BitAddress) -> bool {
        self.word(addr.zone, addr.word)
            .is_some_and(|w| u32::from(addr.bit) < 64 && (w >> addr.bit) & 1 == 1)
    }

    /// Writes one bit.
    ///
    /// # Errors
    ///
    /// Returns [`EncodingError::AddressOutOfRange`] if the address lies
    /// outside the geometry.
    pub fn set(&mut self, addr: BitAddress, value: bool) -> Result<(), EncodingError> {
        if !self.geometry.contains(addr) {
            return Err(EncodingError::AddressOutOfRange(
                self.geometry.format_address(addr),
            ));
        }
        let word = &mut self.words[addr.zone.index()][addr.word as usize];
        if value {
            *word |= 1 << addr.bit;
        } else {
            *word &= !(1 << addr.bit);
        }
        Ok(())
    }

    /// Returns a word, or `None` if it lies outside the geometry.
    pub fn word(&self, zone: ZoneId, word: u32) -> Option<u64> {
        self.words.get(zone.index())?.get(word as usize).copied()
    }

    /// Writes a whole word.
    ///
    /// # Errors
    ///
    /// Returns [`EncodingError::AddressOutOfRange`] for a word outside the
    /// geometry and [`EncodingError::WordOverflow`] if `value` has bits set
    /// above the zone's word width.
    pub fn set_word(&mut self, zone: ZoneId, word: u32, value: u64) -> Result<(), EncodingError> {
        let Some(z) = self.geometry.zone(zone) else {
            return Err(EncodingError::AddressOutOfRange(format!(
                "#{}:{word}",
                zone.as_raw()
            )));
        };
        if word >= z.words {
            return Err(EncodingError::AddressOutOfRange(format!("{}:{word}", z.name)));
        }
        if value & !mask(z.word_width) != 0 {
            return Err(EncodingError::WordOverflow {
                zone: z.name.clone(),
                word,
                width: z.word_width,
            });
        }
        self.words[zone.index()][word as usize] = value;
        Ok(())
    }

    /// Returns the words of one zone.
    pub fn zone_words(&self, zone: ZoneId) -> &[u64] {
        self.words.get(zone.index()).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Iterates `(zone, word offset, value)` in serialization order.
    pub fn serial_words(&self) -> impl Iterator<Item = (ZoneId, u32, u64)> + '_ {
        self.geometry
            .serialization_order()
            .iter()
            .flat_map(move |&zone| {
                self.zone_words(zone)
                    .iter()
                    .enumerate()
                    .map(move |(w, &value)| (zone, w as u32, value))
            })
    }

    /// Iterates the addresses of all set bits, in zone id, word and bit order.
    pub fn set_bits(&self) -> impl Iterator<Item = BitAddress> + '_ {
        self.words.iter().enumerate().flat_map(|(z, words)| {
            words.iter().enumerate().flat_map(move |(w, &value)| {
                (0..64u8)
                    .filter(move |b| (value >> b) & 1 == 1)
                    .map(move |b| BitAddress::new(ZoneId::from_raw(z as u32), w as u32, b))
            })
        })
    }

    /// Returns the number of set bits.
    pub fn count_ones(&self) -> u64 {
        self.words
            .iter()
            .flatten()
            .map(|w| u64::from(w.count_ones()))
            .sum()
    }
}
