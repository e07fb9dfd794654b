//! Feature database builder.
//!
//! Turns a bitstream-definition [`Description`] into a validated
//! [`FeatureDatabase`](qlf_db::FeatureDatabase):
//!
//! 1. [`ChainTable`] resolves chain positions to bit addresses.
//! 2. [`Walker`] walks the scope tree and yields one [`Leaf`] per cell.
//! 3. [`build`] merges `NAME[i]` leaves into multi-bit features and validates
//!    the result, reporting counts in a [`BuildReport`].

#![warn(missing_docs)]

pub mod builder;
pub mod description;
pub mod resolver;
pub mod walk;

pub use builder::{build, build_with, BuildReport};
pub use description::{BitOrder, CellDef, ChainDef, Description, ScopeDef};
pub use resolver::{AddressResolver, ChainTable};
pub use walk::{Context, Leaf, Walker};

use qlf_db::{DatabaseError, DatabaseRoot, TableEncoding};
use std::path::{Path, PathBuf};
use tracing::info;

/// Builds the database described by `description_path` into `root/<device>/`.
///
/// A default image named by the description is copied from the description's
/// directory when it exists there. Returns the device directory and the build
/// report.
///
/// # Errors
///
/// Any [`DatabaseError`] from loading, building or saving.
pub fn build_database(
    description_path: &Path,
    root: &Path,
    encoding: TableEncoding,
) -> Result<(PathBuf, BuildReport), DatabaseError> {
    let description = Description::load(description_path)?;
    let (db, report) = build(&description)?;

    let dir = DatabaseRoot::new(root).device_dir(db.device());
    db.save(&dir, encoding)?;

    if let Some(image) = db.default_image() {
        let source = description_path
            .parent()
            .unwrap_or(Path::new("."))
            .join(&image.file);
        if source.is_file() {
            let target = dir.join(&image.file);
            std::fs::copy(&source, &target).map_err(|e| DatabaseError::io(&target, e))?;
        }
    }

    info!(dir = %dir.display(), encoding = %encoding, "saved feature database");
    Ok((dir, report))
}
