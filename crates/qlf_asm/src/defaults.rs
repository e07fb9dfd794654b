//! Default feature assignments by name.
//!
//! Expands a list of feature names into value-1 assignments. A name that is
//! not a full feature name is treated as tile-relative and matches every
//! feature ending in `.<name>`.

use crate::error::LookupError;
use qlf_db::FeatureDatabase;
use qlf_fasm::{FasmAssignment, FeatureValue};
use std::collections::BTreeSet;
use tracing::debug;

/// Builds value-1 assignments for the requested features.
///
/// Each match gets the value 1 at the feature's declared width. Output is
/// sorted by name and deduplicated.
///
/// # Errors
///
/// Returns [`LookupError::NoMatch`] for the first name matching nothing.
pub fn default_assignments<S: AsRef<str>>(
    db: &FeatureDatabase,
    names: &[S],
) -> Result<Vec<FasmAssignment>, LookupError> {
    let mut matched = BTreeSet::new();
    for name in names {
        let name = name.as_ref().trim();
        if db.lookup(name).is_some() {
            matched.insert(name.to_string());
            continue;
        }
        let suffix = format!(".{name}");
        let before = matched.len();
        let mut hits = 0usize;
        for feature in db.all_features() {
            if feature.name().ends_with(&suffix) {
                matched.insert(feature.name().to_string());
                hits += 1;
            }
        }
        if hits == 0 {
            return Err(LookupError::NoMatch(name.to_string()));
        }
        debug!(name, hits, added = matched.len() - before, "expanded tile-relative feature");
    }

    let mut out = Vec::with_capacity(matched.len());
    for name in matched {
        let width = db.declared_width(&name).unwrap_or(1);
        let Some(value) = FeatureValue::from_u64(1, width) else {
            continue;
        };
        out.push(FasmAssignment::new(name, value));
    }
    Ok(out)
}
