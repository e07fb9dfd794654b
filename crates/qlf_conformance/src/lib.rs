//! Conformance test helpers for the QLF FASM tools.
//!
//! Provides fixture databases and the text-to-image flows (parse → coalesce →
//! assemble, and disassemble → write) used by the integration tests under
//! `tests/`.

#![warn(missing_docs)]

use qlf_asm::{assemble, disassemble, LookupError};
use qlf_bitstream::BitstreamImage;
use qlf_db::{BitAddress, DeviceGeometry, Feature, FeatureDatabase, Zone};
use qlf_fasm::{parse_assignments, write_fasm, ParseError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// A failure anywhere in the FASM to image flow.
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    /// The FASM text is malformed.
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// The assignments do not fit the database.
    #[error(transparent)]
    Lookup(#[from] LookupError),
}

fn zone(name: &str, words: u32, word_width: u32, order: u32) -> Zone {
    Zone {
        name: name.to_string(),
        words,
        word_width,
        order,
    }
}

/// The database of scenarios A and B: one 8-bit word in zone `t0`, with
/// `A.B` at `t0:0:0` and `C.D` at `t0:0:1`.
pub fn scenario_db() -> FeatureDatabase {
    let geometry = DeviceGeometry::new(vec![zone("t0", 1, 8, 0)]).expect("valid geometry");
    let t0 = geometry.zone_id("t0").expect("zone t0");
    FeatureDatabase::new(
        "scenario",
        geometry,
        vec![
            Feature::new("A.B", vec![BitAddress::new(t0, 0, 0)]),
            Feature::new("C.D", vec![BitAddress::new(t0, 0, 1)]),
        ],
    )
    .expect("valid scenario database")
}

/// A database holding only `X`, width 4, mapped to `t0:0:1` (LSB) to `t0:0:4`.
pub fn scenario_c_db() -> FeatureDatabase {
    let geometry = DeviceGeometry::new(vec![zone("t0", 1, 8, 0)]).expect("valid geometry");
    let t0 = geometry.zone_id("t0").expect("zone t0");
    FeatureDatabase::new(
        "scenario",
        geometry,
        vec![Feature::new(
            "X",
            (1..=4).map(|b| BitAddress::new(t0, 0, b)).collect(),
        )],
    )
    .expect("valid scenario database")
}

/// A multi-zone database exercising every layout corner.
///
/// Zones are serialized out of table order, word widths are not byte
/// multiples, and features span words and zones. Feature widths are 1, 3,
/// 10, 20 (written in hex) and 64. Every bit of the geometry is owned.
pub fn device_db() -> FeatureDatabase {
    let geometry = DeviceGeometry::new(vec![
        zone("cfg", 4, 12, 1),
        zone("io", 2, 5, 0),
        zone("wide", 1, 64, 2),
    ])
    .expect("valid geometry");
    let cfg = geometry.zone_id("cfg").expect("zone cfg");
    let io = geometry.zone_id("io").expect("zone io");
    let wide = geometry.zone_id("wide").expect("zone wide");

    let mut features = Vec::new();
    for tile in 0..2u32 {
        let word = tile * 2;
        features.push(Feature::new(
            format!("fpga_top.grid_clb_{tile}_.FF_EN"),
            vec![BitAddress::new(cfg, word, 0)],
        ));
        features.push(Feature::new(
            format!("fpga_top.grid_clb_{tile}_.MODE"),
            (1..=3).map(|b| BitAddress::new(cfg, word, b)).collect(),
        ));
        features.push(Feature::new(
            format!("fpga_top.grid_clb_{tile}_.LUT_INIT"),
            (4..12)
                .map(|b| BitAddress::new(cfg, word, b))
                .chain((0..12).map(|b| BitAddress::new(cfg, word + 1, b)))
                .collect(),
        ));
    }
    features.push(Feature::new(
        "fpga_top.io_0_.CFG",
        (0..5)
            .map(|b| BitAddress::new(io, 0, b))
            .chain((0..5).map(|b| BitAddress::new(io, 1, b)))
            .collect(),
    ));
    features.push(Feature::new(
        "fpga_top.wide.WORD",
        (0..64).map(|b| BitAddress::new(wide, 0, b)).collect(),
    ));

    FeatureDatabase::new("qlf_test", geometry, features).expect("valid device database")
}

/// Sets a deterministic pseudo-random subset of the bits owned by features.
pub fn random_owned_image(db: &FeatureDatabase, seed: u64) -> BitstreamImage {
    let mut image = BitstreamImage::new(db.geometry());
    let mut rng = StdRng::seed_from_u64(seed);
    for feature in db.all_features() {
        for addr in feature.bits() {
            if rng.gen_bool(0.5) {
                image.set(*addr, true).expect("feature bit inside geometry");
            }
        }
    }
    image
}

/// Parses, coalesces and assembles FASM text onto an all-zero image.
pub fn fasm_to_image(source: &str, db: &FeatureDatabase) -> Result<BitstreamImage, FlowError> {
    let assignments = parse_assignments(source, |name| db.declared_width(name))?;
    Ok(assemble(&assignments, db)?)
}

/// Disassembles an image and writes it as FASM text.
pub fn image_to_fasm(image: &BitstreamImage, db: &FeatureDatabase, include_unset: bool) -> Result<String, FlowError> {
    Ok(write_fasm(&disassemble(image, db, include_unset)?))
}

/// A builder description for a two-tile device with a bus, a chain in each
/// bit order and a direct address.
pub const BUILDER_DESCRIPTION: &str = r#"{
    "device": "qlf_k4n8_test",
    "geometry": { "zones": [
        { "name": "r0", "words": 4, "word_width": 16, "order": 1 },
        { "name": "r1", "words": 1, "word_width": 8, "order": 0 }
    ] },
    "chains": [
        { "name": "tiles", "bit_order": "lsb_first", "segments": [ { "zone": "r0" } ] },
        { "name": "io", "bit_order": "msb_first", "segments": [ { "zone": "r1" } ] }
    ],
    "top": {
        "name": "fpga_top",
        "chain": "tiles",
        "children": [
            { "name": "grid_clb_{}_", "repeat": 2, "stride": 32, "index_base": 1,
              "cells": [
                { "name": "LUT_INIT[0]", "bit": 0 },
                { "name": "LUT_INIT[1]", "bit": 1 },
                { "name": "LUT_INIT[2]", "bit": 2 },
                { "name": "LUT_INIT[3]", "bit": 3 },
                { "name": "FF_EN", "bit": 16 }
              ] },
            { "name": "io_{}_", "chain": "io",
              "instances": [ { "index": "0__1", "offset": 0 }, { "index": "0__2", "offset": 4 } ],
              "cells": [ { "name": "OE", "bit": 0 }, { "name": "PULL[0]", "bit": 1 }, { "name": "PULL[1]", "bit": 2 } ] },
            { "name": "global",
              "cells": [ { "name": "DONE", "address": { "zone": "r0", "word": 3, "bit": 15 } } ] }
        ]
    }
}"#;
