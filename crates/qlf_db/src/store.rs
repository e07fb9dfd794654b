//! On-disk database store: device manifests and database roots.
//!
//! A device directory holds `device.json` plus the feature table it
//! references. The manifest records the table's content hash so that a
//! feature table edited or truncated after the build is rejected on load.
//!
//! # Manifest format
//!
//! ```json
//! {
//!   "format_version": 1,
//!   "device": "qlf_k4n8",
//!   "geometry": { "zones": [ { "name": "r0", "words": 8, "word_width": 32, "order": 0 } ] },
//!   "features": { "file": "features.db", "encoding": "text", "checksum": "5f1c..." },
//!   "default_image": { "file": "default.hex", "layout": "text-hex" }
//! }
//! ```

use crate::artifact;
use crate::database::{DefaultImage, FeatureDatabase};
use crate::error::DatabaseError;
use crate::geometry::DeviceGeometry;
use crate::table;
use qlf_common::ContentHash;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// File name of the device manifest inside a device directory.
pub const MANIFEST_FILE: &str = "device.json";

/// Current manifest format version.
pub const FORMAT_VERSION: u32 = 1;

/// Encoding of the feature table file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableEncoding {
    /// Line-oriented text table (`features.db`).
    #[default]
    Text,
    /// Bincode table with a validated header (`features.bin`).
    Binary,
}

impl TableEncoding {
    /// Returns the conventional file name for this encoding.
    pub fn file_name(self) -> &'static str {
        match self {
            TableEncoding::Text => "features.db",
            TableEncoding::Binary => "features.bin",
        }
    }
}

impl fmt::Display for TableEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableEncoding::Text => write!(f, "text"),
            TableEncoding::Binary => write!(f, "binary"),
        }
    }
}

/// Reference from the manifest to the feature table file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableRef {
    /// Table file name, relative to the device directory.
    pub file: String,
    /// How the table is encoded.
    pub encoding: TableEncoding,
    /// XXH3-128 content hash of the table file, as hex.
    pub checksum: String,
}

/// Contents of `device.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    /// Manifest format version.
    pub format_version: u32,
    /// Device name.
    pub device: String,
    /// Zone table of the device.
    pub geometry: DeviceGeometry,
    /// The feature table.
    pub features: TableRef,
    /// Optional base image assembled on top of.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_image: Option<DefaultImage>,
}

/// Reads and version-checks the manifest of a device directory.
///
/// # Errors
///
/// Returns a [`DatabaseError`] if the manifest is missing, is not valid JSON,
/// has an invalid geometry, or carries an unknown format version.
pub fn read_manifest(dir: &Path) -> Result<Manifest, DatabaseError> {
    let path = dir.join(MANIFEST_FILE);
    let content = std::fs::read_to_string(&path).map_err(|e| DatabaseError::io(&path, e))?;
    let manifest: Manifest = serde_json::from_str(&content).map_err(|e| DatabaseError::Json {
        path: path.clone(),
        reason: e.to_string(),
    })?;
    if manifest.format_version != FORMAT_VERSION {
        return Err(DatabaseError::VersionMismatch {
            path,
            expected: FORMAT_VERSION,
            actual: manifest.format_version,
        });
    }
    Ok(manifest)
}

/// Loads the database stored in a device directory.
///
/// # Errors
///
/// See [`FeatureDatabase::load`].
pub fn load(dir: &Path) -> Result<FeatureDatabase, DatabaseError> {
    let manifest = read_manifest(dir)?;

    let table_path = dir.join(&manifest.features.file);
    let raw = std::fs::read(&table_path).map_err(|e| DatabaseError::io(&table_path, e))?;

    let actual = ContentHash::from_bytes(&raw);
    let expected = manifest
        .features
        .checksum
        .parse::<ContentHash>()
        .map_err(|e| DatabaseError::Json {
            path: dir.join(MANIFEST_FILE),
            reason: e.to_string(),
        })?;
    if actual != expected {
        return Err(DatabaseError::ChecksumMismatch {
            path: table_path,
            expected: expected.to_string(),
            actual: actual.to_string(),
        });
    }

    let features = match manifest.features.encoding {
        TableEncoding::Text => {
            let content = String::from_utf8(raw).map_err(|e| DatabaseError::Malformed {
                path: table_path.clone(),
                line: 0,
                reason: format!("feature table is not UTF-8: {e}"),
            })?;
            table::parse_table(&content, &manifest.geometry, &table_path)?
        }
        TableEncoding::Binary => artifact::decode_table(&raw, &table_path)?,
    };
    debug!(
        path = %table_path.display(),
        encoding = %manifest.features.encoding,
        count = features.len(),
        "read feature table"
    );

    let db = FeatureDatabase::new(manifest.device, manifest.geometry, features)?
        .with_default_image(manifest.default_image);
    info!(
        device = db.device(),
        features = db.len(),
        bits = db.claimed_bits(),
        "loaded feature database"
    );
    Ok(db)
}

/// Writes a database into a device directory.
///
/// The feature table is written first and the manifest last, so a directory
/// with a manifest always has the table it describes.
///
/// # Errors
///
/// See [`FeatureDatabase::save`].
pub fn save(db: &FeatureDatabase, dir: &Path, encoding: TableEncoding) -> Result<(), DatabaseError> {
    std::fs::create_dir_all(dir).map_err(|e| DatabaseError::io(dir, e))?;

    let bytes = match encoding {
        TableEncoding::Text => {
            table::write_table(db.device(), db.geometry(), db.all_features()).into_bytes()
        }
        TableEncoding::Binary => artifact::encode_table(db.all_features())?,
    };
    let table_path = dir.join(encoding.file_name());
    std::fs::write(&table_path, &bytes).map_err(|e| DatabaseError::io(&table_path, e))?;

    let manifest = Manifest {
        format_version: FORMAT_VERSION,
        device: db.device().to_string(),
        geometry: db.geometry().clone(),
        features: TableRef {
            file: encoding.file_name().to_string(),
            encoding,
            checksum: ContentHash::from_bytes(&bytes).to_string(),
        },
        default_image: db.default_image().cloned(),
    };
    let manifest_path = dir.join(MANIFEST_FILE);
    let json = serde_json::to_string_pretty(&manifest).map_err(|e| DatabaseError::Json {
        path: manifest_path.clone(),
        reason: e.to_string(),
    })?;
    std::fs::write(&manifest_path, json + "\n")
        .map_err(|e| DatabaseError::io(&manifest_path, e))?;

    info!(
        device = db.device(),
        dir = %dir.display(),
        %encoding,
        features = db.len(),
        "saved feature database"
    );
    Ok(())
}

/// A directory of device databases, one subdirectory per device.
///
/// A directory that itself contains `device.json` is treated as a root
/// holding exactly that device.
#[derive(Debug, Clone)]
pub struct DatabaseRoot {
    root: PathBuf,
}

impl DatabaseRoot {
    /// Creates a database root at the given path.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the root path.
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Returns the directory a device's database is stored in.
    pub fn device_dir(&self, device: &str) -> PathBuf {
        self.root.join(device)
    }

    fn is_single_device(&self) -> bool {
        self.root.join(MANIFEST_FILE).is_file()
    }

    /// Lists the devices available under the root, sorted by name.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::Io`] if the root cannot be read, or a
    /// manifest error for a single-device root.
    pub fn devices(&self) -> Result<Vec<String>, DatabaseError> {
        if self.is_single_device() {
            return Ok(vec![read_manifest(&self.root)?.device]);
        }

        let entries = std::fs::read_dir(&self.root).map_err(|e| DatabaseError::io(&self.root, e))?;
        let mut devices = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| DatabaseError::io(&self.root, e))?;
            let path = entry.path();
            if path.join(MANIFEST_FILE).is_file() {
                if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                    devices.push(name.to_string());
                }
            }
        }
        devices.sort();
        Ok(devices)
    }

    /// Resolves the device directory to load.
    ///
    /// With a device name, its subdirectory is used (or the root itself when
    /// it is a single-device root for that device). Without one, the root must
    /// identify exactly one device.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::UnknownDevice`] if the named device has no
    /// database, or [`DatabaseError::AmbiguousRoot`] if no device was named
    /// and the root does not hold exactly one.
    pub fn resolve(&self, device: Option<&str>) -> Result<PathBuf, DatabaseError> {
        if let Some(device) = device {
            let dir = self.device_dir(device);
            if dir.join(MANIFEST_FILE).is_file() {
                return Ok(dir);
            }
            if self.is_single_device() && read_manifest(&self.root)?.device == device {
                return Ok(self.root.clone());
            }
            return Err(DatabaseError::UnknownDevice {
                root: self.root.clone(),
                device: device.to_string(),
            });
        }

        if self.is_single_device() {
            return Ok(self.root.clone());
        }
        let devices = self.devices()?;
        match devices.as_slice() {
            [only] => Ok(self.device_dir(only)),
            _ => Err(DatabaseError::AmbiguousRoot {
                root: self.root.clone(),
                count: devices.len(),
                available: devices.join(", "),
            }),
        }
    }

    /// Resolves and loads a device database.
    ///
    /// # Errors
    ///
    /// Returns any error from [`resolve`](Self::resolve) or
    /// [`FeatureDatabase::load`].
    pub fn load(&self, device: Option<&str>) -> Result<FeatureDatabase, DatabaseError> {
        let dir = self.resolve(device)?;
        debug!(dir = %dir.display(), "resolved device database");
        load(&dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::addr::BitAddress;
    use crate::feature::Feature;
    use crate::geometry::Zone;

    fn sample_db(device: &str) -> FeatureDatabase {
        let geometry = DeviceGeometry::new(vec![
            Zone {
                name: "t0".to_string(),
                words: 2,
                word_width: 32,
                order: 0,
            },
            Zone {
                name: "t1".to_string(),
                words: 1,
                word_width: 8,
                order: 1,
            },
        ])
        .unwrap();
        let t0 = geometry.zone_id("t0").unwrap();
        let t1 = geometry.zone_id("t1").unwrap();
        FeatureDatabase::new(
            device,
            geometry,
            vec![
                Feature::new("C.D", vec![BitAddress::new(t0, 0, 1)]),
                Feature::new("A.B", vec![BitAddress::new(t0, 0, 0)]),
                Feature::new(
                    "X",
                    vec![
                        BitAddress::new(t1, 0, 4),
                        BitAddress::new(t1, 0, 5),
                        BitAddress::new(t0, 1, 31),
                    ],
                ),
            ],
        )
        .unwrap()
    }

    #[test]
    fn text_save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let db = sample_db("dev").with_default_image(Some(DefaultImage {
            file: "default.hex".to_string(),
            layout: "text-hex".to_string(),
        }));
        db.save(dir.path(), TableEncoding::Text).unwrap();
        assert!(dir.path().join("features.db").is_file());

        let back = FeatureDatabase::load(dir.path()).unwrap();
        assert_eq!(back, db);
        assert_eq!(back.default_image().unwrap().file, "default.hex");
    }

    #[test]
    fn binary_save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let db = sample_db("dev");
        db.save(dir.path(), TableEncoding::Binary).unwrap();
        assert!(dir.path().join("features.bin").is_file());

        let back = FeatureDatabase::load(dir.path()).unwrap();
        assert_eq!(back, db);
        assert!(back.default_image().is_none());
    }

    #[test]
    fn text_table_is_sorted() {
        let dir = tempfile::tempdir().unwrap();
        sample_db("dev").save(dir.path(), TableEncoding::Text).unwrap();
        let text = std::fs::read_to_string(dir.path().join("features.db")).unwrap();
        let names: Vec<&str> = text
            .lines()
            .filter(|l| !l.starts_with('#'))
            .filter_map(|l| l.split_whitespace().next())
            .collect();
        assert_eq!(names, vec!["A.B", "C.D", "X"]);
    }

    #[test]
    fn missing_manifest_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = FeatureDatabase::load(dir.path()).unwrap_err();
        assert!(matches!(err, DatabaseError::Io { .. }));
    }

    #[test]
    fn edited_table_fails_checksum() {
        let dir = tempfile::tempdir().unwrap();
        sample_db("dev").save(dir.path(), TableEncoding::Text).unwrap();
        let path = dir.path().join("features.db");
        let mut text = std::fs::read_to_string(&path).unwrap();
        text.push_str("E 1 t0:1:0\n");
        std::fs::write(&path, text).unwrap();

        let err = FeatureDatabase::load(dir.path()).unwrap_err();
        assert!(matches!(err, DatabaseError::ChecksumMismatch { .. }));
    }

    #[test]
    fn manifest_version_checked() {
        let dir = tempfile::tempdir().unwrap();
        sample_db("dev").save(dir.path(), TableEncoding::Text).unwrap();
        let path = dir.path().join(MANIFEST_FILE);
        let json = std::fs::read_to_string(&path)
            .unwrap()
            .replace("\"format_version\": 1", "\"format_version\": 7");
        std::fs::write(&path, json).unwrap();

        let err = FeatureDatabase::load(dir.path()).unwrap_err();
        assert!(matches!(err, DatabaseError::VersionMismatch { actual: 7, .. }));
    }

    #[test]
    fn inconsistent_table_rejected_on_load() {
        let dir = tempfile::tempdir().unwrap();
        sample_db("dev").save(dir.path(), TableEncoding::Text).unwrap();

        let table = "A 1 t0:0:0\nB 1 t0:0:0\n";
        std::fs::write(dir.path().join("features.db"), table).unwrap();
        let path = dir.path().join(MANIFEST_FILE);
        let mut manifest = read_manifest(dir.path()).unwrap();
        manifest.features.checksum = ContentHash::from_bytes(table.as_bytes()).to_string();
        std::fs::write(&path, serde_json::to_string(&manifest).unwrap()).unwrap();

        let err = FeatureDatabase::load(dir.path()).unwrap_err();
        assert!(matches!(err, DatabaseError::DuplicateBitClaim { .. }));
    }

    #[test]
    fn root_lists_and_resolves_devices() {
        let dir = tempfile::tempdir().unwrap();
        let root = DatabaseRoot::new(dir.path());
        sample_db("b_dev")
            .save(&root.device_dir("b_dev"), TableEncoding::Text)
            .unwrap();
        sample_db("a_dev")
            .save(&root.device_dir("a_dev"), TableEncoding::Binary)
            .unwrap();
        std::fs::create_dir(dir.path().join("not_a_device")).unwrap();

        assert_eq!(root.devices().unwrap(), vec!["a_dev", "b_dev"]);
        assert_eq!(root.resolve(Some("a_dev")).unwrap(), dir.path().join("a_dev"));
        assert_eq!(root.load(Some("b_dev")).unwrap().device(), "b_dev");

        let err = root.resolve(None).unwrap_err();
        assert!(matches!(err, DatabaseError::AmbiguousRoot { count: 2, .. }));

        let err = root.resolve(Some("c_dev")).unwrap_err();
        assert!(matches!(err, DatabaseError::UnknownDevice { .. }));
    }

    #[test]
    fn root_with_one_device_resolves_without_name() {
        let dir = tempfile::tempdir().unwrap();
        let root = DatabaseRoot::new(dir.path());
        sample_db("only").save(&root.device_dir("only"), TableEncoding::Text).unwrap();
        assert_eq!(root.resolve(None).unwrap(), dir.path().join("only"));
    }

    #[test]
    fn single_device_root() {
        let dir = tempfile::tempdir().unwrap();
        sample_db("flat").save(dir.path(), TableEncoding::Text).unwrap();
        let root = DatabaseRoot::new(dir.path());
        assert_eq!(root.devices().unwrap(), vec!["flat"]);
        assert_eq!(root.resolve(None).unwrap(), dir.path());
        assert_eq!(root.resolve(Some("flat")).unwrap(), dir.path());
        assert!(root.resolve(Some("other")).is_err());
    }
}
