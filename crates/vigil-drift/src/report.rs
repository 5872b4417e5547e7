use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::history::DriftHistoryEntry;
use crate::techniques::{HypothesisOutcome, MomentOutcome, ProjectionOutcome};

/// Drift record for one feature.
///
/// Each technique's raw output is kept next to the fused flag; a technique
/// that was not run is `None`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeatureDrift {
    pub feature: String,
    pub index: usize,
    pub hypothesis: Option<HypothesisOutcome>,
    pub moments: Option<MomentOutcome>,
    /// Share of the projected centroid displacement owed to this feature.
    pub projection_share: Option<f64>,
    pub projection_flagged: bool,
    /// Logical OR of every technique's flag.
    pub drift_detected: bool,
}

/// Global flag per technique, before fusion.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechniqueFlags {
    pub hypothesis: bool,
    pub moments: bool,
    pub projection: bool,
}

/// Position and optional timestamp of a temporal window.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WindowInfo {
    pub index: usize,
    pub label: Option<DateTime<Utc>>,
    pub sample_count: usize,
}

/// Result of comparing one current dataset with the reference.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DriftReport {
    pub features: Vec<FeatureDrift>,
    /// Indices (reference feature order) of drifted features.
    pub drifted_features: Vec<usize>,
    /// `true` iff `drifted_features` is non-empty.
    pub global_drift: bool,
    /// Share of features flagged, in `[0, 1]`.
    pub drift_fraction: f64,
    pub technique_flags: TechniqueFlags,
    pub projection: Option<ProjectionOutcome>,
    pub window: Option<WindowInfo>,
}

impl DriftReport {
    /// Per-feature outcome by name.
    pub fn feature(&self, name: &str) -> Option<&FeatureDrift> {
        self.features.iter().find(|f| f.feature == name)
    }

    /// Features where any enabled technique detected drift.
    pub fn drifted_feature_names(&self) -> Vec<&str> {
        self.drifted_features
            .iter()
            .filter_map(|&i| self.features.get(i).map(|f| f.feature.as_str()))
            .collect()
    }
}

/// Per-window reports plus the monitor's retained history after the run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TemporalDriftReport {
    pub windows: Vec<DriftReport>,
    pub history: Vec<DriftHistoryEntry>,
}

impl TemporalDriftReport {
    /// Indices of windows with global drift.
    pub fn drifted_windows(&self) -> Vec<usize> {
        self.windows
            .iter()
            .enumerate()
            .filter_map(|(i, r)| r.global_drift.then_some(i))
            .collect()
    }
}
