//! Errors raised while decoding or addressing bitstream images.

/// Errors raised while decoding an image or addressing its bits.
///
/// All decode errors mean the input does not match the device geometry;
/// nothing is decoded partially.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodingError {
    /// The text-hex input has the wrong number of word lines.
    #[error("expected {expected} word lines, found {actual}")]
    LineCount {
        /// Words implied by the geometry.
        expected: u64,
        /// Lines found.
        actual: u64,
    },

    /// The packed-binary input has the wrong number of bytes.
    #[error("expected {expected} bytes, found {actual}")]
    ByteCount {
        /// Bytes implied by the geometry.
        expected: u64,
        /// Bytes found.
        actual: u64,
    },

    /// The text-bits input has the wrong number of bits.
    #[error("expected {expected} bits, found {actual}")]
    BitCount {
        /// Bits implied by the geometry.
        expected: u64,
        /// Bits found.
        actual: u64,
    },

    /// A character that is not a digit of the layout.
    #[error("line {line}: invalid digit '{digit}'")]
    InvalidDigit {
        /// 1-based line number.
        line: usize,
        /// The offending character.
        digit: char,
    },

    /// A word with bits set above its zone's word width.
    #[error("word {word} of zone '{zone}' has bits set above its {width}-bit width")]
    WordOverflow {
        /// Zone name.
        zone: String,
        /// Word offset.
        word: u32,
        /// Word width of the zone.
        width: u32,
    },

    /// The input is not valid UTF-8 text.
    #[error("text layout input is not valid UTF-8")]
    NotText,

    /// A bit or word address outside the image geometry.
    #[error("address {0} is outside the image geometry")]
    AddressOutOfRange(String),

    /// A layout name that is not recognized.
    #[error("unknown layout '{0}' (expected text-hex, packed-binary or text-bits)")]
    UnknownLayout(String),
}
