//! Layered engine configuration.
//!
//! Sources, lowest precedence first: built-in defaults, an optional file
//! (any format the `config` crate recognises by extension), then
//! environment variables such as `VIGIL_DRIFT__SIGNIFICANCE=0.01`.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use vigil_detect::{EnsembleConfig, DEFAULT_CONTAMINATION, DEFAULT_Z_THRESHOLD};
use vigil_drift::DriftConfig;
use vigil_stats::DEFAULT_IQR_MULTIPLIER;

use crate::error::{VigilError, VigilResult};

/// Prefix of environment overrides.
pub const ENV_PREFIX: &str = "VIGIL";

/// Main engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VigilConfig {
    #[serde(default)]
    pub detectors: DetectorSettings,

    #[serde(default)]
    pub ensemble: EnsembleConfig,

    #[serde(default)]
    pub drift: DriftConfig,

    #[serde(default)]
    pub registry: RegistrySettings,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Settings of the built-in and plug-in detectors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorSettings {
    #[serde(default = "default_z_threshold")]
    pub z_threshold: f64,

    #[serde(default = "default_iqr_multiplier")]
    pub iqr_multiplier: f64,

    /// Expected anomaly fraction for scorer-backed detectors.
    #[serde(default = "default_contamination")]
    pub contamination: f64,
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self {
            z_threshold: DEFAULT_Z_THRESHOLD,
            iqr_multiplier: DEFAULT_IQR_MULTIPLIER,
            contamination: DEFAULT_CONTAMINATION,
        }
    }
}

/// Storage locations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrySettings {
    #[serde(default = "default_base_dir")]
    pub base_dir: PathBuf,

    /// Drift history file. Relative paths resolve against `base_dir`; unset
    /// keeps history in memory only.
    #[serde(default)]
    pub drift_history: Option<PathBuf>,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
            drift_history: None,
        }
    }
}

impl RegistrySettings {
    /// Drift history file, resolved against the registry base directory.
    pub fn drift_history_path(&self) -> Option<PathBuf> {
        self.drift_history.as_ref().map(|p| {
            if p.is_absolute() {
                p.clone()
            } else {
                self.base_dir.join(p)
            }
        })
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Fallback filter when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,

    /// JSON format
    #[serde(default)]
    pub json: bool,

    /// Include timestamps
    #[serde(default = "default_true")]
    pub timestamps: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
            timestamps: true,
        }
    }
}

// Default value helpers
fn default_true() -> bool {
    true
}

fn default_z_threshold() -> f64 {
    DEFAULT_Z_THRESHOLD
}

fn default_iqr_multiplier() -> f64 {
    DEFAULT_IQR_MULTIPLIER
}

fn default_contamination() -> f64 {
    DEFAULT_CONTAMINATION
}

fn default_base_dir() -> PathBuf {
    PathBuf::from(vigil_registry::DEFAULT_BASE_DIR)
}

fn default_log_level() -> String {
    "info".to_string()
}

impl VigilConfig {
    /// Load configuration from defaults, an optional file and the environment.
    pub fn load(path: Option<&str>) -> VigilResult<Self> {
        let mut builder = config::Config::builder();

        builder = builder.add_source(config::Config::try_from(&VigilConfig::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: VigilConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Range checks across every section.
    pub fn validate(&self) -> VigilResult<()> {
        let d = &self.detectors;
        if !(d.z_threshold.is_finite() && d.z_threshold > 0.0) {
            return Err(VigilError::Config(format!(
                "detectors.z_threshold must be positive, got {}",
                d.z_threshold
            )));
        }
        if !(d.iqr_multiplier.is_finite() && d.iqr_multiplier >= 0.0) {
            return Err(VigilError::Config(format!(
                "detectors.iqr_multiplier must be non-negative, got {}",
                d.iqr_multiplier
            )));
        }
        if !(d.contamination > 0.0 && d.contamination <= 0.5) {
            return Err(VigilError::Config(format!(
                "detectors.contamination must be in (0, 0.5], got {}",
                d.contamination
            )));
        }
        self.ensemble.validate()?;
        self.drift.validate()?;
        if self.registry.base_dir.as_os_str().is_empty() {
            return Err(VigilError::Config("registry.base_dir must not be empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_drift::HypothesisTest;

    #[test]
    fn test_default_config() {
        let config = VigilConfig::default();
        assert_eq!(config.detectors.z_threshold, 3.0);
        assert_eq!(config.detectors.iqr_multiplier, 1.5);
        assert_eq!(config.ensemble.decision_threshold, 0.5);
        assert_eq!(config.ensemble.weights["zscore"], 0.5);
        assert_eq!(config.ensemble.weights["iqr"], 0.5);
        assert_eq!(config.drift.significance, 0.05);
        assert_eq!(config.drift.projection_rank, 2);
        assert_eq!(config.registry.base_dir, PathBuf::from("models"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vigil.json");
        std::fs::write(
            &path,
            r#"{
                "drift": { "significance": 0.01, "test": "ttest" },
                "ensemble": { "decision_threshold": 0.7 },
                "registry": { "base_dir": "/var/lib/vigil", "drift_history": "drift.json" }
            }"#,
        )
        .unwrap();
        let config = VigilConfig::load(path.to_str()).unwrap();
        assert_eq!(config.drift.significance, 0.01);
        assert_eq!(config.drift.test, HypothesisTest::StudentT);
        assert_eq!(config.drift.moment_threshold, 0.05);
        assert_eq!(config.ensemble.decision_threshold, 0.7);
        assert_eq!(config.ensemble.weights.len(), 2);
        assert_eq!(
            config.registry.drift_history_path(),
            Some(PathBuf::from("/var/lib/vigil/drift.json"))
        );
    }

    #[test]
    fn test_missing_file_is_optional() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let config = VigilConfig::load(path.to_str()).unwrap();
        assert_eq!(config.detectors, DetectorSettings::default());
    }

    #[test]
    fn test_out_of_range_values_are_rejected() {
        let mut config = VigilConfig::default();
        config.detectors.contamination = 0.7;
        assert!(matches!(config.validate(), Err(VigilError::Config(_))));

        let mut config = VigilConfig::default();
        config.drift.significance = 1.5;
        assert!(matches!(config.validate(), Err(VigilError::Drift(_))));

        let mut config = VigilConfig::default();
        config.ensemble.weights.insert("zscore".into(), -1.0);
        assert!(matches!(config.validate(), Err(VigilError::Detect(_))));
    }

    #[test]
    fn test_logging_defaults() {
        let logging = LoggingConfig::default();
        assert_eq!(logging.level, "info");
        assert!(!logging.json);
        assert!(logging.timestamps);
    }
}
