//! Version records and the on-disk index document.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::RegistryResult;

/// Metric name → value, as stored in the metrics document.
pub type Metrics = BTreeMap<String, Value>;

/// Parameter name → value, as stored in the parameters document.
pub type Parameters = BTreeMap<String, Value>;

/// One entry of the version index. Immutable once written.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VersionRecord {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub metrics: Option<Metrics>,
}

/// A version with its stored parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelVersion {
    pub record: VersionRecord,
    pub parameters: Option<Parameters>,
}

/// The index document: versions in creation order plus the current pointer.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistryIndex {
    pub versions: Vec<VersionRecord>,
    pub current: Option<String>,
}

impl RegistryIndex {
    /// Record of a listed version.
    pub fn find(&self, id: &str) -> Option<&VersionRecord> {
        self.versions.iter().find(|v| v.id == id)
    }

    /// Whether the index lists `id`.
    pub fn contains(&self, id: &str) -> bool {
        self.find(id).is_some()
    }

    /// Read the index, or an empty one if it was never written.
    pub(crate) fn read(path: &Path) -> RegistryResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Replace the index atomically: unique temp file, then rename.
    pub(crate) fn write(&self, path: &Path) -> RegistryResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        let tmp_path = path.with_extension(format!("{}.tmp", uuid::Uuid::new_v4()));
        std::fs::write(&tmp_path, json)?;
        if let Err(e) = std::fs::rename(&tmp_path, path) {
            let _ = std::fs::remove_file(&tmp_path);
            return Err(e.into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_index_serialises_with_null_current() {
        let json = serde_json::to_value(RegistryIndex::default()).unwrap();
        assert_eq!(json, serde_json::json!({"versions": [], "current": null}));
    }

    #[test]
    fn read_missing_index_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let index = RegistryIndex::read(&dir.path().join("registry.json")).unwrap();
        assert_eq!(index, RegistryIndex::default());
    }

    #[test]
    fn write_then_read_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registry.json");
        let index = RegistryIndex {
            versions: vec![VersionRecord {
                id: "rf_20240301_120000".into(),
                name: "rf".into(),
                created_at: Utc::now(),
                metrics: None,
            }],
            current: Some("rf_20240301_120000".into()),
        };
        index.write(&path).unwrap();
        assert_eq!(RegistryIndex::read(&path).unwrap(), index);
        let entries = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(entries, 1);
    }
}
