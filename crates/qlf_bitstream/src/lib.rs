//! Bitstream images and their on-disk layouts.
//!
//! A [`BitstreamImage`] holds the whole configuration memory of a device,
//! sized by its [`DeviceGeometry`](qlf_db::DeviceGeometry). A [`Layout`]
//! selects, once, the [`ImageCodec`] that turns an image into bytes and back:
//!
//! - `text-hex`: one zero-padded hex line per word
//! - `packed-binary`: little-endian words, `ceil(word_width / 8)` bytes each
//! - `text-bits`: one `0`/`1` character per bit
//!
//! Every layout writes zones in serialization order and words in offset order.

#![warn(missing_docs)]

pub mod error;
pub mod image;
pub mod layout;
pub mod packed;
pub mod text_bits;
pub mod text_hex;

pub use error::EncodingError;
pub use image::BitstreamImage;
pub use layout::{ImageCodec, Layout};
pub use packed::PackedBinaryCodec;
pub use text_bits::TextBitsCodec;
pub use text_hex::TextHexCodec;

#[cfg(test)]
mod tests {
    use super::*;
    use qlf_db::{DeviceGeometry, Zone};

    #[test]
    fn every_layout_roundtrips() {
        let geometry = DeviceGeometry::new(vec![
            Zone {
                name: "a".to_string(),
                words: 3,
                word_width: 17,
                order: 2,
            },
            Zone {
                name: "b".to_string(),
                words: 2,
                word_width: 64,
                order: 0,
            },
            Zone {
                name: "c".to_string(),
                words: 1,
                word_width: 1,
                order: 1,
            },
        ])
        .unwrap();
        let mut image = BitstreamImage::new(&geometry);
        let a = geometry.zone_id("a").unwrap();
        let b = geometry.zone_id("b").unwrap();
        let c = geometry.zone_id("c").unwrap();
        image.set_word(a, 0, 0x1_ffff).unwrap();
        image.set_word(a, 2, 0x1_0001).unwrap();
        image.set_word(b, 1, 0x8000_0000_0000_0001).unwrap();
        image.set_word(c, 0, 1).unwrap();

        for layout in Layout::ALL {
            let codec = layout.codec();
            let data = codec.encode(&image);
            assert_eq!(codec.decode(&data, &geometry).unwrap(), image, "{layout}");
        }
    }
}
