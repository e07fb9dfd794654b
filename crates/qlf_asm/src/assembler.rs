//! Feature assignments to bitstream image.

use crate::error::LookupError;
use qlf_bitstream::BitstreamImage;
use qlf_db::{Feature, FeatureDatabase};
use qlf_fasm::{FasmAssignment, FeatureValue};
use tracing::{debug, error, info};

/// Writes feature assignments into bitstream images.
///
/// Every assignment is resolved against the database before a single bit is
/// written, so a failed assembly never yields a partial image.
#[derive(Debug, Clone, Copy)]
pub struct Assembler<'db> {
    db: &'db FeatureDatabase,
}

impl<'db> Assembler<'db> {
    /// Creates an assembler for a database.
    pub fn new(db: &'db FeatureDatabase) -> Self {
        Self { db }
    }

    /// Assembles assignments into a fresh all-zero image.
    ///
    /// # Errors
    ///
    /// See [`assemble_onto`](Self::assemble_onto).
    pub fn assemble(&self, assignments: &[FasmAssignment]) -> Result<BitstreamImage, LookupError> {
        self.assemble_onto(BitstreamImage::new(self.db.geometry()), assignments)
    }

    /// Assembles assignments on top of a base image.
    ///
    /// Every bit of every assigned feature is written, 1s and 0s alike, so an
    /// assignment fully overrides what the base image held for that feature.
    /// Bits of unassigned features keep their base value.
    ///
    /// # Errors
    ///
    /// - [`LookupError::GeometryMismatch`] if `base` was not sized for the database
    /// - [`LookupError::UnknownFeature`] for the first assignment naming a feature
    ///   the database lacks (each unknown feature is also logged)
    /// - [`LookupError::WidthMismatch`] if an assignment's width differs from
    ///   the declared width
    pub fn assemble_onto(
        &self,
        mut base: BitstreamImage,
        assignments: &[FasmAssignment],
    ) -> Result<BitstreamImage, LookupError> {
        if base.geometry() != self.db.geometry() {
            return Err(self.geometry_mismatch());
        }

        let resolved = self.resolve(assignments)?;

        let mut written = 0usize;
        for (feature, value) in resolved {
            for (i, addr) in feature.bits().iter().enumerate() {
                base.set(*addr, value.bit(i as u32))
                    .map_err(|_| self.geometry_mismatch())?;
            }
            written += feature.bits().len();
        }

        info!(
            device = self.db.device(),
            assignments = assignments.len(),
            bits = written,
            set = base.count_ones(),
            "assembled image"
        );
        Ok(base)
    }

    /// Resolves every assignment to its feature without touching any image.
    fn resolve<'a>(
        &self,
        assignments: &'a [FasmAssignment],
    ) -> Result<Vec<(&'db Feature, &'a FeatureValue)>, LookupError> {
        let mut resolved = Vec::with_capacity(assignments.len());
        let mut first_error = None;
        let mut unknown = 0usize;

        for assignment in assignments {
            let Some(feature) = self.db.lookup(&assignment.name) else {
                unknown += 1;
                match assignment.line {
                    Some(line) => error!(feature = %assignment.name, line, "unknown FASM feature"),
                    None => error!(feature = %assignment.name, "unknown FASM feature"),
                }
                first_error.get_or_insert(LookupError::UnknownFeature {
                    name: assignment.name.clone(),
                    line: assignment.line,
                });
                continue;
            };
            if feature.width() != assignment.width() {
                first_error.get_or_insert(LookupError::WidthMismatch {
                    name: assignment.name.clone(),
                    declared: feature.width(),
                    assigned: assignment.width(),
                    line: assignment.line,
                });
                continue;
            }
            debug!(feature = %assignment.name, width = feature.width(), "resolved assignment");
            resolved.push((feature, &assignment.value));
        }

        if unknown > 0 {
            error!(count = unknown, "unknown FASM features encountered");
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(resolved),
        }
    }

    fn geometry_mismatch(&self) -> LookupError {
        LookupError::GeometryMismatch {
            device: self.db.device().to_string(),
        }
    }
}

/// Assembles assignments into a fresh image using `db`.
///
/// # Errors
///
/// See [`Assembler::assemble_onto`].
pub fn assemble(
    assignments: &[FasmAssignment],
    db: &FeatureDatabase,
) -> Result<BitstreamImage, LookupError> {
    Assembler::new(db).assemble(assignments)
}
