//! FASM assembler and disassembler.
//!
//! The [`Assembler`] resolves [`FasmAssignment`](qlf_fasm::FasmAssignment)s
//! through a [`FeatureDatabase`](qlf_db::FeatureDatabase) and writes their bits
//! into a [`BitstreamImage`](qlf_bitstream::BitstreamImage); the
//! [`Disassembler`] reads them back. For every image whose set bits are all
//! owned by some feature:
//!
//! ```text
//! assemble(disassemble(image, db, true), db) == image
//! ```

#![warn(missing_docs)]

pub mod assembler;
pub mod defaults;
pub mod disassembler;
pub mod error;

pub use assembler::{assemble, Assembler};
pub use defaults::default_assignments;
pub use disassembler::{disassemble, Disassembler};
pub use error::LookupError;
