//! The bitstream-definition description read by the builder.
//!
//! A description names the device, its zone geometry, the configuration
//! chains that map chain positions onto zone words, and a tree of scopes
//! whose cells are the individual configuration bits.
//!
//! ```json
//! {
//!   "device": "qlf_k4n8",
//!   "geometry": { "zones": [ { "name": "r0", "words": 8, "word_width": 32, "order": 0 } ] },
//!   "chains": [ { "name": "cfg", "segments": [ { "zone": "r0" } ] } ],
//!   "top": {
//!     "name": "fpga_top", "chain": "cfg",
//!     "children": [
//!       { "name": "grid_clb_{}_", "repeat": 2, "stride": 16,
//!         "cells": [ { "name": "LUT_INIT[0]", "bit": 0 } ] }
//!     ]
//!   }
//! }
//! ```

use qlf_db::{DatabaseError, DefaultImage, DeviceGeometry};
use serde::Deserialize;
use std::fmt;
use std::path::Path;

/// A complete bitstream-definition description.
#[derive(Debug, Clone, Deserialize)]
pub struct Description {
    /// Device name; also the database directory name.
    pub device: String,
    /// Zone table of the device.
    pub geometry: DeviceGeometry,
    /// Configuration chains available to scopes.
    #[serde(default)]
    pub chains: Vec<ChainDef>,
    /// Optional base image recorded in the database manifest.
    #[serde(default)]
    pub default_image: Option<DefaultImage>,
    /// Root of the scope tree.
    pub top: ScopeDef,
}

/// Order in which chain positions fill the bits of a word.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BitOrder {
    /// Position 0 of a word is bit 0.
    #[default]
    LsbFirst,
    /// Position 0 of a word is the most significant bit.
    MsbFirst,
}

/// A named configuration chain laid across zone words.
#[derive(Debug, Clone, Deserialize)]
pub struct ChainDef {
    /// Chain name referenced by scopes.
    pub name: String,
    /// Bit order within each word.
    #[serde(default)]
    pub bit_order: BitOrder,
    /// Zone ranges the chain occupies, in chain order.
    pub segments: Vec<SegmentDef>,
}

/// A run of consecutive words in one zone.
#[derive(Debug, Clone, Deserialize)]
pub struct SegmentDef {
    /// Zone name.
    pub zone: String,
    /// First word of the run.
    #[serde(default)]
    pub start_word: u32,
    /// Number of words; the rest of the zone when absent.
    #[serde(default)]
    pub words: Option<u32>,
}

/// One level of the naming hierarchy.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ScopeDef {
    /// Name segment; `{}` is replaced by the instance label. Empty adds no segment.
    pub name: String,
    /// Chain for cells in this subtree; inherited when absent.
    pub chain: Option<String>,
    /// Chain position added to the parent's base.
    pub offset: u64,
    /// Number of instances laid out at a fixed stride.
    pub repeat: Option<u32>,
    /// Chain positions between consecutive repeated instances.
    pub stride: u64,
    /// Label of the first repeated instance.
    pub index_base: u64,
    /// Explicit instances, as an alternative to `repeat`.
    pub instances: Vec<InstanceDef>,
    /// Nested scopes.
    pub children: Vec<ScopeDef>,
    /// Configuration bits of this scope.
    pub cells: Vec<CellDef>,
}

/// An explicitly placed scope instance.
#[derive(Debug, Clone, Deserialize)]
pub struct InstanceDef {
    /// Label substituted for `{}` in the scope name.
    pub index: InstanceLabel,
    /// Chain position of the instance relative to the scope base.
    #[serde(default)]
    pub offset: u64,
}

/// An instance label, written as a number or a string (`"1__4"`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum InstanceLabel {
    /// Numeric label.
    Number(u64),
    /// Free-form label.
    Text(String),
}

impl fmt::Display for InstanceLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstanceLabel::Number(n) => write!(f, "{n}"),
            InstanceLabel::Text(s) => f.write_str(s),
        }
    }
}

/// One configuration bit.
#[derive(Debug, Clone, Deserialize)]
pub struct CellDef {
    /// Terminal name segment, optionally with a trailing `[n]` bus index.
    pub name: String,
    /// Chain position relative to the enclosing scope base.
    #[serde(default)]
    pub bit: Option<u64>,
    /// Direct address, bypassing the chain.
    #[serde(default)]
    pub address: Option<AddressDef>,
}

/// A direct `zone:word:bit` address.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AddressDef {
    /// Zone name.
    pub zone: String,
    /// Word offset.
    pub word: u32,
    /// Bit index.
    pub bit: u8,
}

impl Description {
    /// Parses a description from JSON text. `path` is used in errors only.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::Json`] for malformed JSON, a schema mismatch
    /// or an invalid geometry.
    pub fn from_json(text: &str, path: &Path) -> Result<Self, DatabaseError> {
        serde_json::from_str(text).map_err(|e| DatabaseError::Json {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Reads and parses a description file.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::Io`] if the file cannot be read, otherwise as
    /// [`from_json`](Self::from_json).
    pub fn load(path: &Path) -> Result<Self, DatabaseError> {
        let text = std::fs::read_to_string(path).map_err(|e| DatabaseError::io(path, e))?;
        Self::from_json(&text, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_description() {
        let text = r#"{
            "device": "dev",
            "geometry": { "zones": [ { "name": "r0", "words": 8, "word_width": 32, "order": 0 } ] },
            "chains": [ { "name": "cfg", "bit_order": "msb_first",
                          "segments": [ { "zone": "r0", "start_word": 2, "words": 4 } ] } ],
            "default_image": { "file": "default.hex", "layout": "text-hex" },
            "top": {
                "name": "fpga_top", "chain": "cfg",
                "children": [
                    { "name": "clb_{}_", "instances": [ { "index": "1__4", "offset": 8 }, { "index": 2 } ],
                      "cells": [ { "name": "FF_EN", "address": { "zone": "r0", "word": 7, "bit": 3 } } ] }
                ]
            }
        }"#;
        let d = Description::from_json(text, Path::new("d.json")).unwrap();
        assert_eq!(d.device, "dev");
        assert_eq!(d.chains[0].bit_order, BitOrder::MsbFirst);
        assert_eq!(d.chains[0].segments[0].words, Some(4));
        assert_eq!(d.default_image.unwrap().layout, "text-hex");

        let clb = &d.top.children[0];
        assert_eq!(clb.instances[0].index.to_string(), "1__4");
        assert_eq!(clb.instances[1].index, InstanceLabel::Number(2));
        assert_eq!(clb.instances[1].offset, 0);
        assert_eq!(clb.cells[0].address.as_ref().unwrap().word, 7);
    }

    #[test]
    fn defaults_for_optional_fields() {
        let text = r#"{
            "device": "dev",
            "geometry": { "zones": [ { "name": "r0", "words": 1, "word_width": 8, "order": 0 } ] },
            "top": { "cells": [ { "name": "A", "bit": 0 } ] }
        }"#;
        let d = Description::from_json(text, Path::new("d.json")).unwrap();
        assert!(d.chains.is_empty());
        assert!(d.top.name.is_empty());
        assert_eq!(d.top.repeat, None);
        assert_eq!(d.top.offset, 0);
    }

    #[test]
    fn invalid_geometry_is_json_error() {
        let text = r#"{ "device": "dev", "geometry": { "zones": [] }, "top": {} }"#;
        let err = Description::from_json(text, Path::new("d.json")).unwrap_err();
        assert!(matches!(err, DatabaseError::Json { .. }));
    }

    #[test]
    fn load_missing_file() {
        let err = Description::load(Path::new("/nonexistent/description.json")).unwrap_err();
        assert!(matches!(err, DatabaseError::Io { .. }));
    }
}
