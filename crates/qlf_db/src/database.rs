//! The in-memory feature database.
//!
//! Combines the device geometry, the name-sorted feature list and the
//! reverse bit index into a single immutable [`FeatureDatabase`] shared by
//! every conversion for the device.

use crate::addr::BitAddress;
use crate::error::DatabaseError;
use crate::feature::{is_valid_feature_name, Feature};
use crate::geometry::DeviceGeometry;
use crate::store::{self, TableEncoding};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Reference to a base image assembled on top of instead of all-zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultImage {
    /// Image file name, relative to the device directory.
    pub file: String,
    /// Binary layout name of the image file (e.g. `text-hex`).
    pub layout: String,
}

/// The name ↔ bit mapping for one device.
///
/// Features are kept sorted by name, which fixes the disassembly order. The
/// reverse index from [`BitAddress`] to `(feature, position)` is built once in
/// [`new`](Self::new). The database holds no interior mutability and can be
/// shared by reference across threads.
#[derive(Debug, Clone)]
pub struct FeatureDatabase {
    device: String,
    geometry: DeviceGeometry,
    features: Vec<Feature>,
    by_name: HashMap<String, usize>,
    by_bit: HashMap<BitAddress, (usize, u32)>,
    default_image: Option<DefaultImage>,
}

impl FeatureDatabase {
    /// Validates the features against the geometry and builds the database.
    ///
    /// # Errors
    ///
    /// - [`DatabaseError::InvalidName`] for names that are not dotted identifiers
    /// - [`DatabaseError::EmptyFeature`] for features without bits
    /// - [`DatabaseError::AddressOutOfRange`] for bits outside the geometry
    /// - [`DatabaseError::DuplicateFeature`] for repeated names
    /// - [`DatabaseError::DuplicateBitClaim`] when two feature bits share an address
    pub fn new(
        device: impl Into<String>,
        geometry: DeviceGeometry,
        mut features: Vec<Feature>,
    ) -> Result<Self, DatabaseError> {
        for feature in &features {
            if !is_valid_feature_name(feature.name()) {
                return Err(DatabaseError::InvalidName(feature.name().to_string()));
            }
            if feature.bits().is_empty() {
                return Err(DatabaseError::EmptyFeature(feature.name().to_string()));
            }
            for (position, addr) in feature.bits().iter().enumerate() {
                if !geometry.contains(*addr) {
                    return Err(DatabaseError::AddressOutOfRange {
                        name: feature.name().to_string(),
                        position: position as u32,
                        address: geometry.format_address(*addr),
                    });
                }
            }
        }

        features.sort_by(|a, b| a.name().cmp(b.name()));

        let mut by_name = HashMap::with_capacity(features.len());
        for (index, feature) in features.iter().enumerate() {
            if by_name.insert(feature.name().to_string(), index).is_some() {
                return Err(DatabaseError::DuplicateFeature(feature.name().to_string()));
            }
        }

        let mut by_bit = HashMap::new();
        for (index, feature) in features.iter().enumerate() {
            for (position, addr) in feature.bits().iter().enumerate() {
                let position = position as u32;
                if let Some(&(other, other_pos)) = by_bit.get(addr) {
                    let other: &Feature = &features[other];
                    return Err(DatabaseError::DuplicateBitClaim {
                        address: geometry.format_address(*addr),
                        first: format!("{}[{other_pos}]", other.name()),
                        second: format!("{}[{position}]", feature.name()),
                    });
                }
                by_bit.insert(*addr, (index, position));
            }
        }

        Ok(Self {
            device: device.into(),
            geometry,
            features,
            by_name,
            by_bit,
            default_image: None,
        })
    }

    /// Attaches (or clears) the default base image reference.
    pub fn with_default_image(mut self, default_image: Option<DefaultImage>) -> Self {
        self.default_image = default_image;
        self
    }

    /// Loads a database from a device directory.
    ///
    /// # Errors
    ///
    /// Returns a [`DatabaseError`] if files are missing, malformed, fail their
    /// checksum, or describe an inconsistent database.
    pub fn load(dir: &Path) -> Result<Self, DatabaseError> {
        store::load(dir)
    }

    /// Writes the database into a device directory, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns a [`DatabaseError`] if a file cannot be written or encoded.
    pub fn save(&self, dir: &Path, encoding: TableEncoding) -> Result<(), DatabaseError> {
        store::save(self, dir, encoding)
    }

    /// Returns the device name.
    pub fn device(&self) -> &str {
        &self.device
    }

    /// Returns the device geometry.
    pub fn geometry(&self) -> &DeviceGeometry {
        &self.geometry
    }

    /// Returns the default base image reference, if any.
    pub fn default_image(&self) -> Option<&DefaultImage> {
        self.default_image.as_ref()
    }

    /// Looks up a feature by its full name.
    pub fn lookup(&self, name: &str) -> Option<&Feature> {
        self.by_name.get(name).map(|&i| &self.features[i])
    }

    /// Returns the feature and bit position owning an address.
    pub fn lookup_bit(&self, addr: BitAddress) -> Option<(&str, u32)> {
        self.by_bit
            .get(&addr)
            .map(|&(i, position)| (self.features[i].name(), position))
    }

    /// Returns the declared width of a feature.
    pub fn declared_width(&self, name: &str) -> Option<u32> {
        self.lookup(name).map(Feature::width)
    }

    /// Returns every feature, sorted by name.
    pub fn all_features(&self) -> &[Feature] {
        &self.features
    }

    /// Returns the number of features.
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Returns whether the database has no features.
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Returns the number of configuration bits owned by some feature.
    pub fn claimed_bits(&self) -> usize {
        self.by_bit.len()
    }
}

impl PartialEq for FeatureDatabase {
    fn eq(&self, other: &Self) -> bool {
        self.device == other.device
            && self.geometry == other.geometry
            && self.features == other.features
            && self.default_image == other.default_image
    }
}

impl Eq for FeatureDatabase {}
