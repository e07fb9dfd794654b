//! Round-trip, idempotence and determinism across every layout.

use qlf_asm::{assemble, disassemble};
use qlf_bitstream::{BitstreamImage, Layout};
use qlf_conformance::{device_db, fasm_to_image, image_to_fasm, random_owned_image};
use qlf_fasm::{parse_assignments, write_fasm};

#[test]
fn every_layout_decodes_what_it_encodes() {
    let db = device_db();
    for seed in [1, 7, 0xdead_beef] {
        let image = random_owned_image(&db, seed);
        for layout in Layout::ALL {
            let codec = layout.codec();
            let bytes = codec.encode(&image);
            assert_eq!(codec.decode(&bytes, db.geometry()).unwrap(), image, "{layout} seed {seed}");
        }
    }
}

#[test]
fn full_disassembly_reassembles_to_same_image() {
    let db = device_db();
    for seed in 1..=16 {
        let image = random_owned_image(&db, seed);
        let assignments = disassemble(&image, &db, true).unwrap();
        assert_eq!(assemble(&assignments, &db).unwrap(), image, "seed {seed}");
    }
}

#[test]
fn set_only_disassembly_reassembles_on_zero_image() {
    let db = device_db();
    let image = random_owned_image(&db, 42);
    let assignments = disassemble(&image, &db, false).unwrap();
    assert!(assignments.iter().all(|a| !a.value.is_zero()));
    assert_eq!(assemble(&assignments, &db).unwrap(), image);
}

#[test]
fn round_trip_through_bytes_and_text() {
    let db = device_db();
    let image = random_owned_image(&db, 99);
    for layout in Layout::ALL {
        let codec = layout.codec();
        let decoded = codec.decode(&codec.encode(&image), db.geometry()).unwrap();
        let text = image_to_fasm(&decoded, &db, false).unwrap();
        let reassembled = fasm_to_image(&text, &db).unwrap();
        assert_eq!(codec.encode(&reassembled), codec.encode(&image), "{layout}");
    }
}

#[test]
fn written_text_is_idempotent() {
    let db = device_db();
    let image = random_owned_image(&db, 5);
    let first = image_to_fasm(&image, &db, true).unwrap();
    let reparsed = parse_assignments(&first, |name| db.declared_width(name)).unwrap();
    assert_eq!(write_fasm(&reparsed), first);
}

#[test]
fn wide_values_are_written_in_hex() {
    let db = device_db();
    let text = image_to_fasm(&random_owned_image(&db, 3), &db, true).unwrap();
    assert!(text.contains("fpga_top.wide.WORD[63:0] = 64'h"));
    assert!(text.contains("fpga_top.grid_clb_0_.LUT_INIT[19:0] = 20'h"));
    assert!(text.contains("fpga_top.io_0_.CFG[9:0] = 10'b"));
}

#[test]
fn conversions_are_deterministic() {
    let db = device_db();
    let source = "fpga_top.grid_clb_1_.MODE[2:0] = 3'b101\n\
                  fpga_top.wide.WORD[63:32] = 32'hcafe_f00d\n\
                  fpga_top.grid_clb_0_.FF_EN\n";
    for layout in Layout::ALL {
        let codec = layout.codec();
        let a = codec.encode(&fasm_to_image(source, &db).unwrap());
        let b = codec.encode(&fasm_to_image(source, &db).unwrap());
        assert_eq!(a, b, "{layout}");
    }

    let image = fasm_to_image(source, &db).unwrap();
    assert_eq!(
        image_to_fasm(&image, &db, false).unwrap(),
        image_to_fasm(&image, &db, false).unwrap()
    );
}

#[test]
fn empty_input_gives_zero_image() {
    let db = device_db();
    let image = fasm_to_image("# nothing set\n\n", &db).unwrap();
    assert_eq!(image, BitstreamImage::new(db.geometry()));
    assert_eq!(image_to_fasm(&image, &db, false).unwrap(), "");
}

#[test]
fn packed_binary_size_follows_geometry() {
    let db = device_db();
    let bytes = Layout::PackedBinary.codec().encode(&BitstreamImage::new(db.geometry()));
    // cfg: 4 words x 2 bytes, io: 2 x 1, wide: 1 x 8
    assert_eq!(bytes.len(), 8 + 2 + 8);
}
