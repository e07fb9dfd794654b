//! Image layouts and the codec strategy each one selects.

use crate::error::EncodingError;
use crate::image::BitstreamImage;
use crate::packed::PackedBinaryCodec;
use crate::text_bits::TextBitsCodec;
use crate::text_hex::TextHexCodec;
use qlf_db::DeviceGeometry;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Converts between a [`BitstreamImage`] and its on-disk bytes.
///
/// `encode` and `decode` are exact inverses for a given geometry.
pub trait ImageCodec {
    /// Returns the layout this codec implements.
    fn layout(&self) -> Layout;

    /// Serializes an image.
    fn encode(&self, image: &BitstreamImage) -> Vec<u8>;

    /// Deserializes an image sized by `geometry`.
    ///
    /// # Errors
    ///
    /// Returns an [`EncodingError`] if the data size does not match the
    /// geometry, contains invalid digits, or sets bits above a word's width.
    fn decode(&self, data: &[u8], geometry: &DeviceGeometry) -> Result<BitstreamImage, EncodingError>;
}

/// The supported on-disk image layouts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Layout {
    /// One hex line per word.
    TextHex,
    /// Little-endian words, `ceil(word_width / 8)` bytes each.
    #[default]
    PackedBinary,
    /// One `0`/`1` character per bit.
    TextBits,
}

impl Layout {
    /// All layouts, in declaration order.
    pub const ALL: [Layout; 3] = [Layout::TextHex, Layout::PackedBinary, Layout::TextBits];

    /// Returns the layout name used on the command line and in config files.
    pub fn name(self) -> &'static str {
        match self {
            Layout::TextHex => "text-hex",
            Layout::PackedBinary => "packed-binary",
            Layout::TextBits => "text-bits",
        }
    }

    /// Selects the codec for this layout.
    pub fn codec(self) -> Box<dyn ImageCodec> {
        match self {
            Layout::TextHex => Box::new(TextHexCodec),
            Layout::PackedBinary => Box::new(PackedBinaryCodec),
            Layout::TextBits => Box::new(TextBitsCodec),
        }
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Layout {
    type Err = EncodingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Layout::ALL
            .into_iter()
            .find(|l| l.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| EncodingError::UnknownLayout(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_roundtrip() {
        for layout in Layout::ALL {
            assert_eq!(layout.name().parse::<Layout>().unwrap(), layout);
            assert_eq!(layout.codec().layout(), layout);
        }
    }

    #[test]
    fn unknown_name() {
        assert_eq!(
            "4byte".parse::<Layout>(),
            Err(EncodingError::UnknownLayout("4byte".to_string()))
        );
    }

    #[test]
    fn default_is_packed_binary() {
        assert_eq!(Layout::default(), Layout::PackedBinary);
    }

    #[test]
    fn serde_uses_kebab_names() {
        let json = serde_json::to_string(&Layout::TextHex).unwrap();
        assert_eq!(json, "\"text-hex\"");
        let back: Layout = serde_json::from_str("\"text-bits\"").unwrap();
        assert_eq!(back, Layout::TextBits);
    }
}
