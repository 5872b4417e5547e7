//! The detector contract shared by built-in and plugin detectors.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{DetectError, DetectResult};
use crate::sample::SampleSet;

// ── Trait ────────────────────────────────────────────────────────────────

/// Pluggable anomaly detector over one feature of a sample set.
///
/// Implementations are stateless per call so a single instance can be
/// shared across threads. Flags and scores are aligned with the original
/// sample positions; a missing observation gets `false` and `None`.
pub trait Detector: Send + Sync {
    /// Registry key of this detector.
    fn name(&self) -> &str;

    /// Score every sample of `params.feature`.
    fn detect(&self, samples: &SampleSet, params: &DetectorParams) -> DetectResult<DetectorResult>;
}

// ── Parameters ──────────────────────────────────────────────────────────

/// Per-call detector parameters.
///
/// `threshold` and `contamination` override the detector's configured
/// values for this call only; `extra` carries plugin-specific knobs.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectorParams {
    pub feature: String,
    #[serde(default)]
    pub threshold: Option<f64>,
    #[serde(default)]
    pub contamination: Option<f64>,
    #[serde(default)]
    pub extra: BTreeMap<String, f64>,
}

impl DetectorParams {
    /// Parameters targeting one feature, with detector defaults.
    pub fn for_feature(feature: impl Into<String>) -> Self {
        Self {
            feature: feature.into(),
            ..Self::default()
        }
    }

    /// Override the detector threshold for this call.
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = Some(threshold);
        self
    }

    /// Override the expected anomaly share for this call.
    pub fn with_contamination(mut self, contamination: f64) -> Self {
        self.contamination = Some(contamination);
        self
    }

    /// Attach a detector-specific numeric setting.
    pub fn with_extra(mut self, key: impl Into<String>, value: f64) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

// ── Result ──────────────────────────────────────────────────────────────

/// How a detector's raw scores map onto the shared `[0, 1]` scale.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum ScoreScale {
    /// Scores already lie in `[0, 1]`, 1 = most anomalous.
    Unit,
    /// Non-negative raw scores whose decision boundary is the given value.
    Threshold(f64),
}

impl ScoreScale {
    /// Map a raw score to `[0, 1]`.
    ///
    /// `Threshold(t)` uses `s / (s + t)`, which puts the detector's own
    /// boundary at 0.5 and sends infinite scores to 1.
    pub fn normalize(&self, raw: f64) -> f64 {
        match *self {
            ScoreScale::Unit => raw.clamp(0.0, 1.0),
            ScoreScale::Threshold(t) => {
                let s = raw.max(0.0);
                if s.is_infinite() {
                    1.0
                } else if t <= 0.0 {
                    if s > 0.0 {
                        1.0
                    } else {
                        0.0
                    }
                } else {
                    s / (s + t)
                }
            }
        }
    }
}

/// Per-sample verdict of one detector.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetectorResult {
    pub flags: Vec<bool>,
    pub scores: Vec<Option<f64>>,
    pub scale: ScoreScale,
}

impl DetectorResult {
    /// Number of samples the result covers.
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Positions of flagged samples.
    pub fn flagged_indices(&self) -> Vec<usize> {
        self.flags
            .iter()
            .enumerate()
            .filter_map(|(i, &f)| f.then_some(i))
            .collect()
    }

    /// Scores on the shared `[0, 1]` scale.
    pub fn normalized_scores(&self) -> Vec<Option<f64>> {
        self.scores
            .iter()
            .map(|s| s.map(|raw| self.scale.normalize(raw)))
            .collect()
    }

    /// Check alignment with the sample set and, for `Unit` results, range.
    pub fn validate(&self, detector: &str, sample_count: usize) -> DetectResult<()> {
        for (what, len) in [("flags", self.flags.len()), ("scores", self.scores.len())] {
            if len != sample_count {
                return Err(DetectError::LengthMismatch {
                    subject: format!("{} of detector '{}'", what, detector),
                    expected: sample_count,
                    actual: len,
                });
            }
        }
        if self.scale == ScoreScale::Unit {
            for (index, score) in self.scores.iter().enumerate() {
                if let Some(s) = *score {
                    if !(0.0..=1.0).contains(&s) {
                        return Err(DetectError::ScoreOutOfRange {
                            detector: detector.to_string(),
                            index,
                            score: s,
                        });
                    }
                }
            }
        }
        Ok(())
    }
}
