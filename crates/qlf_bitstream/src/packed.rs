//! The packed-binary layout.
//!
//! All words concatenated in zone serialization order, then word order. Each
//! word takes `ceil(word_width / 8)` bytes, least significant byte first,
//! regardless of host endianness. There is no header.

use crate::error::EncodingError;
use crate::image::BitstreamImage;
use crate::layout::{ImageCodec, Layout};
use qlf_db::DeviceGeometry;

/// Codec for [`Layout::PackedBinary`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PackedBinaryCodec;

fn word_bytes(word_width: u32) -> usize {
    word_width.div_ceil(8) as usize
}

/// Returns the encoded size of an image with the given geometry.
pub fn packed_size(geometry: &DeviceGeometry) -> u64 {
    geometry
        .zones()
        .iter()
        .map(|z| u64::from(z.words) * word_bytes(z.word_width) as u64)
        .sum()
}

impl ImageCodec for PackedBinaryCodec {
    fn layout(&self) -> Layout {
        Layout::PackedBinary
    }

    fn encode(&self, image: &BitstreamImage) -> Vec<u8> {
        let geometry = image.geometry();
        let mut data = Vec::with_capacity(packed_size(geometry) as usize);
        for (zone, _, value) in image.serial_words() {
            let n = geometry.zone(zone).map_or(8, |z| word_bytes(z.word_width));
            data.extend_from_slice(&value.to_le_bytes()[..n]);
        }
        data
    }

    fn decode(&self, data: &[u8], geometry: &DeviceGeometry) -> Result<BitstreamImage, EncodingError> {
        let expected = packed_size(geometry);
        if data.len() as u64 != expected {
            return Err(EncodingError::ByteCount {
                expected,
                actual: data.len() as u64,
            });
        }

        let mut image = BitstreamImage::new(geometry);
        let mut offset = 0;
        for &zone in geometry.serialization_order() {
            let Some(z) = geometry.zone(zone) else {
                continue;
            };
            let n = word_bytes(z.word_width);
            for word in 0..z.words {
                let mut bytes = [0u8; 8];
                bytes[..n].copy_from_slice(&data[offset..offset + n]);
                offset += n;
                image.set_word(zone, word, u64::from_le_bytes(bytes))?;
            }
        }
        Ok(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qlf_db::{BitAddress, Zone};

    fn geometry() -> DeviceGeometry {
        DeviceGeometry::new(vec![
            Zone {
                name: "t0".to_string(),
                words: 2,
                word_width: 32,
                order: 1,
            },
            Zone {
                name: "t1".to_string(),
                words: 1,
                word_width: 12,
                order: 0,
            },
        ])
        .unwrap()
    }

    #[test]
    fn size_from_geometry() {
        assert_eq!(packed_size(&geometry()), 2 * 4 + 2);
    }

    #[test]
    fn little_endian_words_in_serial_order() {
        let g = geometry();
        let mut image = BitstreamImage::new(&g);
        image.set_word(g.zone_id("t1").unwrap(), 0, 0xabc).unwrap();
        image.set_word(g.zone_id("t0").unwrap(), 0, 0x0102_0304).unwrap();
        let data = PackedBinaryCodec.encode(&image);
        assert_eq!(
            data,
            vec![0xbc, 0x0a, 0x04, 0x03, 0x02, 0x01, 0, 0, 0, 0]
        );
    }

    #[test]
    fn decode_inverts_encode() {
        let g = geometry();
        let mut image = BitstreamImage::new(&g);
        image
            .set(BitAddress::new(g.zone_id("t0").unwrap(), 1, 31), true)
            .unwrap();
        image
            .set(BitAddress::new(g.zone_id("t1").unwrap(), 0, 11), true)
            .unwrap();
        let data = PackedBinaryCodec.encode(&image);
        assert_eq!(PackedBinaryCodec.decode(&data, &g).unwrap(), image);
    }

    #[test]
    fn byte_count_mismatch() {
        let g = geometry();
        assert_eq!(
            PackedBinaryCodec.decode(&[0; 9], &g),
            Err(EncodingError::ByteCount {
                expected: 10,
                actual: 9
            })
        );
    }

    #[test]
    fn bits_above_word_width_rejected() {
        let g = geometry();
        let mut data = vec![0u8; 10];
        data[1] = 0x10;
        assert!(matches!(
            PackedBinaryCodec.decode(&data, &g),
            Err(EncodingError::WordOverflow { .. })
        ));
    }
}
