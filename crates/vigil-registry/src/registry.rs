//! File-backed model registry.
//!
//! ## Layout
//!
//! ```text
//!   <base>/
//!   ├── registry.json               index: versions (creation order) + current
//!   ├── versions/
//!   │   └── <name>_<YYYYmmdd_HHMMSS>[_n]/
//!   │       ├── artifact.<ext>
//!   │       ├── metrics.json        (optional)
//!   │       └── parameters.json     (optional)
//!   └── config/
//!       └── <config-name>.json
//! ```
//!
//! A save stages the version directory under a hidden name, renames it into
//! `versions/`, then rewrites the index. The index rewrite is the commit
//! point: readers resolve versions only through the index, so they never
//! observe a half-written version.
//!
//! Every registry opened on the same base directory within a process shares
//! one write lock, so index read → claim → index write never interleaves.
//! Writers in separate processes are not coordinated.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::codec::ArtifactCodec;
use crate::compare::{compare_metrics, MetricComparison};
use crate::error::{RegistryError, RegistryResult};
use crate::index::{Metrics, ModelVersion, Parameters, RegistryIndex, VersionRecord};

/// Index document name.
pub const INDEX_FILE: &str = "registry.json";

/// Directory holding one subdirectory per version.
pub const VERSIONS_DIR: &str = "versions";

/// Directory holding named configuration documents.
pub const CONFIG_DIR: &str = "config";

/// Attempts at claiming a version directory before giving up.
pub const MAX_WRITE_ATTEMPTS: usize = 8;

const ARTIFACT_STEM: &str = "artifact";
const METRICS_FILE: &str = "metrics.json";
const PARAMETERS_FILE: &str = "parameters.json";

fn validate_name(name: &str) -> RegistryResult<()> {
    let reason = if name.is_empty() {
        Some("must not be empty")
    } else if name.starts_with('.') {
        Some("must not start with '.'")
    } else if name.contains(['/', '\\']) {
        Some("must not contain path separators")
    } else {
        None
    };
    match reason {
        Some(reason) => Err(RegistryError::InvalidName {
            name: name.to_string(),
            reason: reason.to_string(),
        }),
        None => Ok(()),
    }
}

/// Process-wide write locks, one per canonical base directory.
fn write_lock_for(base: &Path) -> Arc<Mutex<()>> {
    static LOCKS: OnceLock<parking_lot::Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>> = OnceLock::new();
    let locks = LOCKS.get_or_init(Default::default);
    Arc::clone(locks.lock().entry(base.to_path_buf()).or_default())
}

fn write_json(path: &Path, value: &impl serde::Serialize) -> RegistryResult<()> {
    std::fs::write(path, serde_json::to_vec_pretty(value)?)?;
    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> RegistryResult<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }
    let bytes = std::fs::read(path)?;
    Ok(Some(serde_json::from_slice(&bytes)?))
}

/// Versioned artifact store with a single current pointer.
///
/// Writers are serialised per base directory; readers take no lock and only
/// see versions the index has committed.
pub struct ModelRegistry<C: ArtifactCodec> {
    base: PathBuf,
    codec: C,
    clock: Arc<dyn Clock>,
    write_lock: Arc<Mutex<()>>,
}

impl<C: ArtifactCodec> ModelRegistry<C> {
    /// Open (creating if needed) a registry rooted at `base`.
    pub fn open(base: impl Into<PathBuf>, codec: C) -> RegistryResult<Self> {
        let base = base.into();
        std::fs::create_dir_all(base.join(VERSIONS_DIR))?;
        std::fs::create_dir_all(base.join(CONFIG_DIR))?;
        let write_lock = write_lock_for(&std::fs::canonicalize(&base)?);
        let registry = Self {
            base,
            codec,
            clock: Arc::new(SystemClock),
            write_lock,
        };
        {
            let _guard = registry.write_lock.lock().map_err(|_| RegistryError::Lock)?;
            if !registry.index_path().exists() {
                RegistryIndex::default().write(&registry.index_path())?;
            }
        }
        debug!(base = %registry.base.display(), "opened model registry");
        Ok(registry)
    }

    /// Replace the clock used for version ids and timestamps.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Root directory of this registry.
    pub fn base_dir(&self) -> &Path {
        &self.base
    }

    fn index_path(&self) -> PathBuf {
        self.base.join(INDEX_FILE)
    }

    fn version_dir(&self, id: &str) -> PathBuf {
        self.base.join(VERSIONS_DIR).join(id)
    }

    fn artifact_path(&self, id: &str) -> PathBuf {
        self.version_dir(id)
            .join(format!("{}.{}", ARTIFACT_STEM, self.codec.extension()))
    }

    fn index(&self) -> RegistryResult<RegistryIndex> {
        RegistryIndex::read(&self.index_path())
    }

    /// First id for `name` at `at` that the index does not list, counting
    /// from `start`.
    fn candidate_id(
        name: &str,
        at: DateTime<Utc>,
        index: &RegistryIndex,
        start: usize,
    ) -> (String, usize) {
        let stem = format!("{}_{}", name, at.format("%Y%m%d_%H%M%S"));
        let mut n = start;
        loop {
            let id = if n == 0 {
                stem.clone()
            } else {
                format!("{}_{}", stem, n)
            };
            if !index.contains(&id) {
                return (id, n);
            }
            n += 1;
        }
    }

    // ── Writes ──────────────────────────────────────────────────────────

    /// Store a new immutable version and return its id.
    ///
    /// The first version saved becomes current.
    pub fn save(
        &self,
        artifact: &C::Artifact,
        name: &str,
        metrics: Option<Metrics>,
        parameters: Option<Parameters>,
    ) -> RegistryResult<String> {
        validate_name(name)?;
        let bytes = self.codec.encode(artifact)?;
        let _guard = self.write_lock.lock().map_err(|_| RegistryError::Lock)?;

        let staging = self
            .base
            .join(format!(".staging-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&staging)?;
        let staged = (|| -> RegistryResult<()> {
            std::fs::write(
                staging.join(format!("{}.{}", ARTIFACT_STEM, self.codec.extension())),
                &bytes,
            )?;
            if let Some(m) = &metrics {
                write_json(&staging.join(METRICS_FILE), m)?;
            }
            if let Some(p) = &parameters {
                write_json(&staging.join(PARAMETERS_FILE), p)?;
            }
            Ok(())
        })();
        if let Err(e) = staged {
            let _ = std::fs::remove_dir_all(&staging);
            return Err(e);
        }

        // Read under the lock, so the index written below is never stale.
        let mut index = self.index()?;
        let created_at = self.clock.now();
        let mut next = 0;
        let mut claimed = None;
        for attempt in 1..=MAX_WRITE_ATTEMPTS {
            let (id, n) = Self::candidate_id(name, created_at, &index, next);
            let target = self.version_dir(&id);
            match std::fs::rename(&staging, &target) {
                Ok(()) => {
                    claimed = Some(id);
                    break;
                }
                Err(_) if target.exists() => {
                    // Left behind by an interrupted save; never listed.
                    warn!(version_id = %id, attempt, "version directory already present, retrying");
                    next = n + 1;
                }
                Err(e) => {
                    let _ = std::fs::remove_dir_all(&staging);
                    return Err(e.into());
                }
            }
        }
        let Some(id) = claimed else {
            let _ = std::fs::remove_dir_all(&staging);
            return Err(RegistryError::ConcurrentWriteConflict {
                attempts: MAX_WRITE_ATTEMPTS,
            });
        };

        index.versions.push(VersionRecord {
            id: id.clone(),
            name: name.to_string(),
            created_at,
            metrics,
        });
        let became_current = index.current.is_none();
        if became_current {
            index.current = Some(id.clone());
        }
        if let Err(e) = index.write(&self.index_path()) {
            let _ = std::fs::remove_dir_all(self.version_dir(&id));
            return Err(e);
        }

        info!(version_id = %id, model = %name, became_current, "model version saved");
        Ok(id)
    }

    /// Point `current` at an existing version.
    pub fn set_current(&self, id: &str) -> RegistryResult<()> {
        let _guard = self.write_lock.lock().map_err(|_| RegistryError::Lock)?;
        let mut index = self.index()?;
        if !index.contains(id) {
            return Err(RegistryError::VersionNotFound(id.to_string()));
        }
        let previous = index.current.replace(id.to_string());
        index.write(&self.index_path())?;
        info!(version_id = %id, previous = ?previous, "current version set");
        Ok(())
    }

    // ── Reads ───────────────────────────────────────────────────────────

    fn resolve(&self, index: &RegistryIndex, id: Option<&str>) -> RegistryResult<String> {
        let id = match id {
            Some(id) => id.to_string(),
            None => index.current.clone().ok_or(RegistryError::NoCurrentVersion)?,
        };
        if !index.contains(&id) {
            return Err(RegistryError::VersionNotFound(id));
        }
        Ok(id)
    }

    /// Load an artifact; `None` means the current version.
    pub fn load(&self, id: Option<&str>) -> RegistryResult<C::Artifact> {
        let id = self.resolve(&self.index()?, id)?;
        let bytes = std::fs::read(self.artifact_path(&id))?;
        self.codec.decode(&bytes)
    }

    /// All versions in creation order.
    pub fn list_versions(&self) -> RegistryResult<Vec<VersionRecord>> {
        Ok(self.index()?.versions)
    }

    /// Id of the current version, if one is set.
    pub fn current_id(&self) -> RegistryResult<Option<String>> {
        Ok(self.index()?.current)
    }

    /// Index record of the current version, if one is set.
    pub fn current_version(&self) -> RegistryResult<Option<VersionRecord>> {
        let index = self.index()?;
        Ok(index
            .current
            .as_deref()
            .and_then(|id| index.find(id))
            .cloned())
    }

    /// Record plus stored parameters of one version.
    pub fn get_version(&self, id: &str) -> RegistryResult<ModelVersion> {
        let index = self.index()?;
        let record = index
            .find(id)
            .cloned()
            .ok_or_else(|| RegistryError::VersionNotFound(id.to_string()))?;
        let parameters = read_json(&self.version_dir(id).join(PARAMETERS_FILE))?;
        Ok(ModelVersion { record, parameters })
    }

    /// Stored metrics of one version (empty when none were saved).
    pub fn metrics(&self, id: &str) -> RegistryResult<Metrics> {
        let index = self.index()?;
        if !index.contains(id) {
            return Err(RegistryError::VersionNotFound(id.to_string()));
        }
        Ok(read_json(&self.version_dir(id).join(METRICS_FILE))?.unwrap_or_default())
    }

    /// Per-metric comparison over the numeric metrics both versions share.
    pub fn compare(&self, a: &str, b: &str) -> RegistryResult<BTreeMap<String, MetricComparison>> {
        let (ma, mb) = (self.metrics(a)?, self.metrics(b)?);
        Ok(compare_metrics(&ma, &mb))
    }

    // ── Named configurations ────────────────────────────────────────────

    fn config_path(&self, name: &str) -> RegistryResult<PathBuf> {
        validate_name(name)?;
        Ok(self.base.join(CONFIG_DIR).join(format!("{}.json", name)))
    }

    /// Store a named configuration document, replacing any previous one.
    pub fn save_config(&self, name: &str, config: &Value) -> RegistryResult<()> {
        let path = self.config_path(name)?;
        let tmp_path = path.with_extension("json.tmp");
        write_json(&tmp_path, config)?;
        std::fs::rename(&tmp_path, &path)?;
        debug!(config = %name, "configuration saved");
        Ok(())
    }

    /// Load a named configuration document.
    pub fn load_config(&self, name: &str) -> RegistryResult<Value> {
        read_json(&self.config_path(name)?)?
            .ok_or_else(|| RegistryError::ConfigNotFound(name.to_string()))
    }
}
