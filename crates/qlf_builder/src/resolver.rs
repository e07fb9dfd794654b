//! Chain position to bit address resolution.
//!
//! How a configuration chain position lands on a physical word and bit is
//! device-specific. The builder only talks to the [`AddressResolver`] trait;
//! [`ChainTable`] is the table-driven implementation built from the
//! description's `chains`.

use crate::description::{BitOrder, ChainDef};
use qlf_db::{BitAddress, DatabaseError, DeviceGeometry, ZoneId};
use std::collections::HashMap;

/// Maps `(chain, position)` to a bit address.
pub trait AddressResolver {
    /// Resolves one chain position.
    ///
    /// # Errors
    ///
    /// Returns a description of the problem if the chain is unknown or the
    /// position lies past its end.
    fn resolve(&self, chain: &str, position: u64) -> Result<BitAddress, String>;
}

#[derive(Debug, Clone)]
struct Segment {
    zone: ZoneId,
    start_word: u32,
    words: u32,
    word_width: u32,
}

impl Segment {
    fn capacity(&self) -> u64 {
        u64::from(self.words) * u64::from(self.word_width)
    }
}

#[derive(Debug, Clone)]
struct Chain {
    bit_order: BitOrder,
    segments: Vec<Segment>,
}

/// Resolution table laying each chain across its zone segments in order.
///
/// Within a segment, position `p` maps to word `start_word + p / word_width`
/// and bit `p % word_width` (`lsb_first`) or `word_width - 1 - p % word_width`
/// (`msb_first`). Positions past a segment's capacity continue in the next.
#[derive(Debug, Clone, Default)]
pub struct ChainTable {
    chains: HashMap<String, Chain>,
}

impl ChainTable {
    /// Builds the table, checking every segment against the geometry.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::Description`] for repeated chain names,
    /// chains without segments, unknown zones and segments that do not fit
    /// inside their zone.
    pub fn new(defs: &[ChainDef], geometry: &DeviceGeometry) -> Result<Self, DatabaseError> {
        let mut chains = HashMap::with_capacity(defs.len());
        for def in defs {
            if def.segments.is_empty() {
                return Err(DatabaseError::Description(format!(
                    "chain '{}' has no segments",
                    def.name
                )));
            }
            let mut segments = Vec::with_capacity(def.segments.len());
            for (i, seg) in def.segments.iter().enumerate() {
                let (zone, z) = geometry
                    .zone_id(&seg.zone)
                    .and_then(|id| geometry.zone(id).map(|z| (id, z)))
                    .ok_or_else(|| {
                        DatabaseError::Description(format!(
                            "chain '{}' segment {i} references unknown zone '{}'",
                            def.name, seg.zone
                        ))
                    })?;
                let words = seg.words.unwrap_or(z.words.saturating_sub(seg.start_word));
                if words == 0 || u64::from(seg.start_word) + u64::from(words) > u64::from(z.words) {
                    return Err(DatabaseError::Description(format!(
                        "chain '{}' segment {i} does not fit zone '{}' ({} words)",
                        def.name, seg.zone, z.words
                    )));
                }
                segments.push(Segment {
                    zone,
                    start_word: seg.start_word,
                    words,
                    word_width: z.word_width,
                });
            }
            let chain = Chain {
                bit_order: def.bit_order,
                segments,
            };
            if chains.insert(def.name.clone(), chain).is_some() {
                return Err(DatabaseError::Description(format!(
                    "duplicate chain '{}'",
                    def.name
                )));
            }
        }
        Ok(Self { chains })
    }

    /// Returns the number of positions on a chain.
    pub fn capacity(&self, chain: &str) -> Option<u64> {
        self.chains
            .get(chain)
            .map(|c| c.segments.iter().map(Segment::capacity).sum())
    }
}

impl AddressResolver for ChainTable {
    fn resolve(&self, chain: &str, position: u64) -> Result<BitAddress, String> {
        let c = self
            .chains
            .get(chain)
            .ok_or_else(|| format!("unknown chain '{chain}'"))?;

        let mut p = position;
        for seg in &c.segments {
            if p < seg.capacity() {
                let width = u64::from(seg.word_width);
                let word = seg.start_word + (p / width) as u32;
                let within = (p % width) as u8;
                let bit = match c.bit_order {
                    BitOrder::LsbFirst => within,
                    BitOrder::MsbFirst => (seg.word_width - 1) as u8 - within,
                };
                return Ok(BitAddress::new(seg.zone, word, bit));
            }
            p -= seg.capacity();
        }

        let total: u64 = c.segments.iter().map(Segment::capacity).sum();
        Err(format!(
            "position {position} is past the end of chain '{chain}' ({total} bits)"
        ))
    }
}
