//! Leaf cells to feature database.

use crate::description::Description;
use crate::resolver::{AddressResolver, ChainTable};
use crate::walk::{Context, Leaf, Walker};
use qlf_db::{split_bus_index, BitAddress, DatabaseError, Feature, FeatureDatabase};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, info};

/// Statistics of one database build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildReport {
    /// Cells found in the description.
    pub leaf_cells: usize,
    /// Features in the database.
    pub features: usize,
    /// Features wider than one bit.
    pub multi_bit_features: usize,
    /// Sum of all feature widths.
    pub bits: usize,
}

impl BuildReport {
    /// Returns whether every leaf cell became exactly one feature bit.
    pub fn is_lossless(&self) -> bool {
        self.bits == self.leaf_cells
    }
}

impl fmt::Display for BuildReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} cells, {} features ({} multi-bit), {} bits",
            self.leaf_cells, self.features, self.multi_bit_features, self.bits
        )
    }
}

enum Group {
    Scalar(BitAddress),
    Bus(BTreeMap<u32, BitAddress>),
}

/// Builds the database for a description using its own chain table.
///
/// # Errors
///
/// Any [`DatabaseError`] from the chain table, the walk, bus merging or
/// database validation.
pub fn build(description: &Description) -> Result<(FeatureDatabase, BuildReport), DatabaseError> {
    let table = ChainTable::new(&description.chains, &description.geometry)?;
    build_with(description, &table)
}

/// Builds the database for a description with a caller-supplied resolver.
///
/// # Errors
///
/// See [`build`].
pub fn build_with<R: AddressResolver + ?Sized>(
    description: &Description,
    resolver: &R,
) -> Result<(FeatureDatabase, BuildReport), DatabaseError> {
    let leaves = Walker::new(&description.geometry, resolver).walk(&description.top, &Context::default())?;
    debug!(leaves = leaves.len(), "walked description");

    let leaf_cells = leaves.len();
    let features = merge_buses(leaves)?;

    let report = BuildReport {
        leaf_cells,
        features: features.len(),
        multi_bit_features: features.iter().filter(|f| f.width() > 1).count(),
        bits: features.iter().map(|f| f.bits().len()).sum(),
    };
    if !report.is_lossless() {
        return Err(DatabaseError::Description(format!(
            "{} leaf cells became {} feature bits",
            report.leaf_cells, report.bits
        )));
    }

    let db = FeatureDatabase::new(description.device.clone(), description.geometry.clone(), features)?
        .with_default_image(description.default_image.clone());
    info!(device = db.device(), %report, "built feature database");
    Ok((db, report))
}

/// Merges `NAME[i]` leaves into one feature per `NAME`, ordered by `i`.
fn merge_buses(leaves: Vec<Leaf>) -> Result<Vec<Feature>, DatabaseError> {
    let mut groups: BTreeMap<String, Group> = BTreeMap::new();
    for leaf in leaves {
        let conflict = |name: &str, reason: &str| DatabaseError::ConflictingWidth {
            name: name.to_string(),
            reason: reason.to_string(),
        };
        match split_bus_index(&leaf.name) {
            Some((base, index)) => match groups.entry(base.to_string()).or_insert_with(|| Group::Bus(BTreeMap::new())) {
                Group::Scalar(_) => return Err(conflict(base, "used both as a single bit and as a bus")),
                Group::Bus(bits) => {
                    if bits.insert(index, leaf.address).is_some() {
                        return Err(conflict(base, &format!("bus index {index} is defined twice")));
                    }
                }
            },
            None => match groups.get(&leaf.name) {
                Some(Group::Bus(_)) => {
                    return Err(conflict(&leaf.name, "used both as a single bit and as a bus"))
                }
                Some(Group::Scalar(_)) => return Err(DatabaseError::DuplicateFeature(leaf.name)),
                None => {
                    groups.insert(leaf.name, Group::Scalar(leaf.address));
                }
            },
        }
    }

    let mut features = Vec::with_capacity(groups.len());
    for (name, group) in groups {
        let bits = match group {
            Group::Scalar(addr) => vec![addr],
            Group::Bus(bits) => {
                if let Some(missing) = (0u32..).zip(bits.keys()).find(|(i, k)| i != *k).map(|(i, _)| i) {
                    return Err(DatabaseError::ConflictingWidth {
                        name,
                        reason: format!("bus index {missing} is missing"),
                    });
                }
                bits.into_values().collect()
            }
        };
        features.push(Feature::new(name, bits));
    }
    Ok(features)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn description(top: &str) -> Description {
        let text = format!(
            r#"{{
                "device": "dev",
                "geometry": {{ "zones": [ {{ "name": "r0", "words": 4, "word_width": 8, "order": 0 }} ] }},
                "chains": [ {{ "name": "cfg", "segments": [ {{ "zone": "r0" }} ] }} ],
                "top": {top}
            }}"#
        );
        Description::from_json(&text, Path::new("d.json")).unwrap()
    }

    #[test]
    fn buses_merge_in_index_order() {
        let d = description(
            r#"{ "name": "top", "chain": "cfg", "cells": [
                { "name": "M[1]", "bit": 3 }, { "name": "M[0]", "bit": 5 },
                { "name": "EN", "bit": 0 } ] }"#,
        );
        let (db, report) = build(&d).unwrap();
        let r0 = db.geometry().zone_id("r0").unwrap();
        let m = db.lookup("top.M").unwrap();
        assert_eq!(m.bits(), [BitAddress::new(r0, 0, 5), BitAddress::new(r0, 0, 3)]);
        assert_eq!(db.declared_width("top.EN"), Some(1));
        assert_eq!(
            report,
            BuildReport {
                leaf_cells: 3,
                features: 2,
                multi_bit_features: 1,
                bits: 3
            }
        );
        assert!(report.is_lossless());
    }

    #[test]
    fn scalar_and_bus_collision() {
        let d = description(
            r#"{ "name": "top", "chain": "cfg", "cells": [
                { "name": "M", "bit": 0 }, { "name": "M[0]", "bit": 1 } ] }"#,
        );
        assert!(matches!(build(&d), Err(DatabaseError::ConflictingWidth { .. })));
    }

    #[test]
    fn missing_bus_index() {
        let d = description(
            r#"{ "name": "top", "chain": "cfg", "cells": [
                { "name": "M[0]", "bit": 0 }, { "name": "M[2]", "bit": 1 } ] }"#,
        );
        let err = build(&d).unwrap_err();
        assert_eq!(
            err.to_string(),
            "feature 'top.M' has conflicting definitions: bus index 1 is missing"
        );
    }

    #[test]
    fn duplicate_bus_index() {
        let d = description(
            r#"{ "name": "top", "chain": "cfg", "cells": [
                { "name": "M[0]", "bit": 0 }, { "name": "M[0]", "bit": 1 } ] }"#,
        );
        assert!(build(&d).unwrap_err().to_string().contains("defined twice"));
    }

    #[test]
    fn duplicate_scalar_name() {
        let d = description(
            r#"{ "name": "top", "chain": "cfg", "cells": [
                { "name": "A", "bit": 0 }, { "name": "A", "bit": 1 } ] }"#,
        );
        assert!(matches!(build(&d), Err(DatabaseError::DuplicateFeature(n)) if n == "top.A"));
    }

    #[test]
    fn shared_bit_is_rejected() {
        let d = description(
            r#"{ "name": "top", "chain": "cfg", "cells": [
                { "name": "A", "bit": 2 },
                { "name": "B", "address": { "zone": "r0", "word": 0, "bit": 2 } } ] }"#,
        );
        assert!(matches!(build(&d), Err(DatabaseError::DuplicateBitClaim { .. })));
    }

    #[test]
    fn position_past_chain() {
        let d = description(r#"{ "name": "top", "chain": "cfg", "cells": [ { "name": "A", "bit": 32 } ] }"#);
        assert!(matches!(build(&d), Err(DatabaseError::UnresolvedAddress { .. })));
    }

    #[test]
    fn invalid_full_name() {
        let d = description(r#"{ "name": "top", "chain": "cfg", "cells": [ { "name": "9A", "bit": 0 } ] }"#);
        assert!(matches!(build(&d), Err(DatabaseError::InvalidName(_))));
    }

    #[test]
    fn default_image_carried_to_database() {
        let text = r#"{
            "device": "dev",
            "geometry": { "zones": [ { "name": "r0", "words": 1, "word_width": 8, "order": 0 } ] },
            "default_image": { "file": "default.hex", "layout": "text-hex" },
            "top": { "cells": [ { "name": "A", "address": { "zone": "r0", "word": 0, "bit": 0 } } ] }
        }"#;
        let d = Description::from_json(text, Path::new("d.json")).unwrap();
        let (db, _) = build(&d).unwrap();
        assert_eq!(db.default_image().map(|i| i.file.as_str()), Some("default.hex"));
    }
}
