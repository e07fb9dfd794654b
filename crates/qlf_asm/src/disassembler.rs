//! Bitstream image to feature assignments.

use crate::error::LookupError;
use qlf_bitstream::BitstreamImage;
use qlf_db::{BitAddress, FeatureDatabase};
use qlf_fasm::{FasmAssignment, FeatureValue};
use tracing::{debug, info, warn};

/// Recovers feature assignments from bitstream images.
#[derive(Debug, Clone, Copy)]
pub struct Disassembler<'db> {
    db: &'db FeatureDatabase,
}

impl<'db> Disassembler<'db> {
    /// Creates a disassembler for a database.
    pub fn new(db: &'db FeatureDatabase) -> Self {
        Self { db }
    }

    /// Reads every feature's value out of the image.
    ///
    /// Features are visited in name order and each value is rebuilt LSB
    /// first from the feature's bit addresses. A feature is emitted when its
    /// value is non-zero, or always when `include_unset` is set. Emitted
    /// assignments carry no source line.
    ///
    /// Set bits owned by no feature cannot be represented and are dropped
    /// with a warning.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::GeometryMismatch`] if the image was not sized
    /// for the database geometry.
    pub fn disassemble(
        &self,
        image: &BitstreamImage,
        include_unset: bool,
    ) -> Result<Vec<FasmAssignment>, LookupError> {
        if image.geometry() != self.db.geometry() {
            return Err(LookupError::GeometryMismatch {
                device: self.db.device().to_string(),
            });
        }

        let mut assignments = Vec::new();
        for feature in self.db.all_features() {
            let mut value = FeatureValue::zero(feature.width());
            for (i, addr) in feature.bits().iter().enumerate() {
                if image.get(*addr) {
                    value.set_bit(i as u32, true);
                }
            }
            if include_unset || !value.is_zero() {
                debug!(feature = feature.name(), value = ?value, "disassembled feature");
                assignments.push(FasmAssignment::new(feature.name(), value));
            }
        }

        let unowned = self.unowned_bits(image);
        if !unowned.is_empty() {
            let geometry = self.db.geometry();
            warn!(
                count = unowned.len(),
                first = %geometry.format_address(unowned[0]),
                "set bits not owned by any feature were dropped"
            );
        }

        info!(
            device = self.db.device(),
            features = assignments.len(),
            include_unset,
            "disassembled image"
        );
        Ok(assignments)
    }

    /// Returns the set bits of `image` that no feature claims.
    pub fn unowned_bits(&self, image: &BitstreamImage) -> Vec<BitAddress> {
        image
            .set_bits()
            .filter(|addr| self.db.lookup_bit(*addr).is_none())
            .collect()
    }
}

/// Disassembles `image` using `db`.
///
/// # Errors
///
/// See [`Disassembler::disassemble`].
pub fn disassemble(
    image: &BitstreamImage,
    db: &FeatureDatabase,
    include_unset: bool,
) -> Result<Vec<FasmAssignment>, LookupError> {
    Disassembler::new(db).disassemble(image, include_unset)
}
