//! Feature database for QLF FASM assembly and disassembly.
//!
//! A feature database maps dotted hierarchical feature names (for example
//! `fpga_top.grid_clb_1__4_.LUT_INIT`) to the exact configuration bits they
//! drive, and keeps the reverse index used by the disassembler. Bits are
//! addressed by [`BitAddress`] inside the word-addressed zones of a
//! [`DeviceGeometry`].
//!
//! # Database files
//!
//! Each device lives in its own directory:
//!
//! - `device.json`: the manifest, holding format version, device name, geometry, the
//!   feature table reference with its checksum, and an optional default image
//! - `features.db`: text feature table (`NAME WIDTH zone:word:bit ...`), or
//! - `features.bin`: the same table as a bincode artifact
//!
//! A database root holds one such directory per device, see [`DatabaseRoot`].

#![warn(missing_docs)]

pub mod addr;
pub mod artifact;
pub mod database;
pub mod error;
pub mod feature;
pub mod geometry;
pub mod store;
pub mod table;

pub use addr::{BitAddress, ZoneId};
pub use database::{DefaultImage, FeatureDatabase};
pub use error::{AddressError, DatabaseError};
pub use feature::{is_valid_feature_name, split_bus_index, Feature};
pub use geometry::{DeviceGeometry, Zone};
pub use store::{DatabaseRoot, TableEncoding, MANIFEST_FILE};
