//! The text-hex layout: one lowercase hex line per word.
//!
//! Words appear in zone serialization order, then word order. Each line is
//! zero-padded to `ceil(word_width / 4)` digits, so images diff cleanly.
//! Blank lines are ignored on decode.

use crate::error::EncodingError;
use crate::image::BitstreamImage;
use crate::layout::{ImageCodec, Layout};
use qlf_db::DeviceGeometry;
use std::fmt::Write as _;

/// Codec for [`Layout::TextHex`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TextHexCodec;

impl ImageCodec for TextHexCodec {
    fn layout(&self) -> Layout {
        Layout::TextHex
    }

    fn encode(&self, image: &BitstreamImage) -> Vec<u8> {
        let geometry = image.geometry();
        let mut out = String::new();
        for (zone, _, value) in image.serial_words() {
            let digits = geometry
                .zone(zone)
                .map_or(16, |z| z.word_width.div_ceil(4) as usize);
            let _ = writeln!(out, "{value:0digits$x}");
        }
        out.into_bytes()
    }

    fn decode(&self, data: &[u8], geometry: &DeviceGeometry) -> Result<BitstreamImage, EncodingError> {
        let text = std::str::from_utf8(data).map_err(|_| EncodingError::NotText)?;
        let lines: Vec<(usize, &str)> = text
            .lines()
            .enumerate()
            .map(|(i, l)| (i + 1, l.trim()))
            .filter(|(_, l)| !l.is_empty())
            .collect();

        let expected = geometry.total_words();
        if lines.len() as u64 != expected {
            return Err(EncodingError::LineCount {
                expected,
                actual: lines.len() as u64,
            });
        }

        let mut image = BitstreamImage::new(geometry);
        let slots = geometry.serialization_order().iter().flat_map(|&zone| {
            let words = geometry.zone(zone).map_or(0, |z| z.words);
            (0..words).map(move |w| (zone, w))
        });
        for ((zone, word), (line, digits)) in slots.zip(lines) {
            if let Some(bad) = digits.chars().find(|c| !c.is_ascii_hexdigit()) {
                return Err(EncodingError::InvalidDigit { line, digit: bad });
            }
            // At most 16 significant digits fit a u64; anything longer overflows
            // every zone.
            let significant = digits.trim_start_matches('0');
            let value = if significant.is_empty() {
                Some(0)
            } else if significant.len() <= 16 {
                u64::from_str_radix(significant, 16).ok()
            } else {
                None
            };
            let Some(value) = value else {
                let zone = geometry.zone(zone);
                return Err(EncodingError::WordOverflow {
                    zone: zone.map(|z| z.name.clone()).unwrap_or_default(),
                    word,
                    width: zone.map_or(0, |z| z.word_width),
                });
            };
            image.set_word(zone, word, value)?;
        }
        Ok(image)
    }
}
