//! The text-bits layout: one `0`/`1` character per configuration bit.
//!
//! Bits appear in zone serialization order, then word order, then bit index
//! (bit 0 first). Encoding writes a single line; decoding ignores all
//! whitespace.

use crate::error::EncodingError;
use crate::image::BitstreamImage;
use crate::layout::{ImageCodec, Layout};
use qlf_db::DeviceGeometry;

/// Codec for [`Layout::TextBits`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TextBitsCodec;

impl ImageCodec for TextBitsCodec {
    fn layout(&self) -> Layout {
        Layout::TextBits
    }

    fn encode(&self, image: &BitstreamImage) -> Vec<u8> {
        let geometry = image.geometry();
        let mut out = Vec::with_capacity(geometry.total_bits() as usize + 1);
        for (zone, _, value) in image.serial_words() {
            let width = geometry.zone(zone).map_or(0, |z| z.word_width);
            out.extend((0..width).map(|b| if (value >> b) & 1 == 1 { b'1' } else { b'0' }));
        }
        out.push(b'\n');
        out
    }

    fn decode(&self, data: &[u8], geometry: &DeviceGeometry) -> Result<BitstreamImage, EncodingError> {
        let text = std::str::from_utf8(data).map_err(|_| EncodingError::NotText)?;

        let mut bits = Vec::with_capacity(geometry.total_bits() as usize);
        for (i, line) in text.lines().enumerate() {
            for c in line.chars().filter(|c| !c.is_whitespace()) {
                match c {
                    '0' => bits.push(false),
                    '1' => bits.push(true),
                    digit => return Err(EncodingError::InvalidDigit { line: i + 1, digit }),
                }
            }
        }

        let expected = geometry.total_bits();
        if bits.len() as u64 != expected {
            return Err(EncodingError::BitCount {
                expected,
                actual: bits.len() as u64,
            });
        }

        let mut image = BitstreamImage::new(geometry);
        let mut next = bits.into_iter();
        for &zone in geometry.serialization_order() {
            let Some(z) = geometry.zone(zone) else {
                continue;
            };
            for word in 0..z.words {
                let value = (0..z.word_width)
                    .zip(next.by_ref())
                    .fold(0u64, |acc, (b, set)| acc | (u64::from(set) << b));
                image.set_word(zone, word, value)?;
            }
        }
        Ok(image)
    }
}
