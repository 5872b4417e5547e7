use serde::{Deserialize, Serialize};

use crate::error::{DriftError, DriftResult};
use crate::{
    DEFAULT_HISTORY_CAPACITY, DEFAULT_MOMENT_THRESHOLD, DEFAULT_PROJECTION_RANK,
    DEFAULT_PROJECTION_THRESHOLD, DEFAULT_SIGNIFICANCE,
};

/// Two-sample test used by the hypothesis technique.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HypothesisTest {
    #[default]
    #[serde(alias = "ks")]
    KolmogorovSmirnov,
    /// Pooled-variance t-test.
    #[serde(alias = "ttest")]
    StudentT,
    /// Unequal-variance t-test.
    WelchT,
}

/// Which techniques a comparison runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TechniqueSet {
    pub hypothesis: bool,
    pub moments: bool,
    pub projection: bool,
}

impl Default for TechniqueSet {
    fn default() -> Self {
        Self {
            hypothesis: true,
            moments: true,
            projection: true,
        }
    }
}

impl TechniqueSet {
    /// Whether at least one technique is enabled.
    pub fn any(&self) -> bool {
        self.hypothesis || self.moments || self.projection
    }
}

/// Drift monitor thresholds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriftConfig {
    pub test: HypothesisTest,
    /// p-value below which the hypothesis technique flags drift.
    pub significance: f64,
    /// Relative mean/std difference above which the moment technique flags.
    pub moment_threshold: f64,
    /// Centroid distance in projected space above which projection flags.
    pub projection_threshold: f64,
    pub projection_rank: usize,
    pub techniques: TechniqueSet,
    /// Maximum retained history entries.
    pub history_capacity: usize,
}

impl Default for DriftConfig {
    fn default() -> Self {
        Self {
            test: HypothesisTest::default(),
            significance: DEFAULT_SIGNIFICANCE,
            moment_threshold: DEFAULT_MOMENT_THRESHOLD,
            projection_threshold: DEFAULT_PROJECTION_THRESHOLD,
            projection_rank: DEFAULT_PROJECTION_RANK,
            techniques: TechniqueSet::default(),
            history_capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

impl DriftConfig {
    /// Reject thresholds and sizes outside their valid ranges.
    pub fn validate(&self) -> DriftResult<()> {
        if !(self.significance > 0.0 && self.significance < 1.0) {
            return Err(DriftError::invalid(
                "significance",
                format!("{} is outside (0, 1)", self.significance),
            ));
        }
        for (name, value) in [
            ("moment_threshold", self.moment_threshold),
            ("projection_threshold", self.projection_threshold),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(DriftError::invalid(
                    name,
                    format!("{} must be finite and non-negative", value),
                ));
            }
        }
        if self.projection_rank == 0 {
            return Err(DriftError::invalid("projection_rank", "must be at least 1"));
        }
        if self.history_capacity == 0 {
            return Err(DriftError::invalid("history_capacity", "must be at least 1"));
        }
        if !self.techniques.any() {
            return Err(DriftError::invalid("techniques", "at least one technique must be enabled"));
        }
        Ok(())
    }
}
