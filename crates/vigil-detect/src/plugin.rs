//! Adapter for opaque model-based scorers.
//!
//! Density, isolation, reconstruction-error and neighbour scorers are
//! served by external collaborators. `ScoredDetector` wraps any such scorer
//! so that its output honours the detector contract: scores min-max
//! normalised into `[0, 1]` (1 = most anomalous) and flags cut at the
//! contamination quantile.

use std::fmt;

use vigil_stats::{contamination_cutoff, min_max_normalize};

use crate::detector::{Detector, DetectorParams, DetectorResult, ScoreScale};
use crate::error::{DetectError, DetectResult};
use crate::sample::SampleSet;

/// Default expected share of outliers for model-based detectors.
pub const DEFAULT_CONTAMINATION: f64 = 0.05;

/// Raw per-sample scores from an external model. `None` = not scored.
pub type ScoreFn =
    dyn Fn(&SampleSet, &DetectorParams) -> DetectResult<Vec<Option<f64>>> + Send + Sync;

/// Adapts an opaque scorer into a [0, 1] score plus contamination flags.
pub struct ScoredDetector {
    name: String,
    scorer: Box<ScoreFn>,
    contamination: f64,
    lower_is_anomalous: bool,
}

impl ScoredDetector {
    /// Wrap `scorer`, whose higher raw scores mean more anomalous.
    pub fn new<F>(name: impl Into<String>, scorer: F) -> Self
    where
        F: Fn(&SampleSet, &DetectorParams) -> DetectResult<Vec<Option<f64>>>
            + Send
            + Sync
            + 'static,
    {
        Self {
            name: name.into(),
            scorer: Box::new(scorer),
            contamination: DEFAULT_CONTAMINATION,
            lower_is_anomalous: false,
        }
    }

    /// For scorers where a *lower* raw value means more anomalous
    /// (isolation path lengths, likelihoods).
    pub fn inverted(mut self) -> Self {
        self.lower_is_anomalous = true;
        self
    }

    /// Expected share of anomalies used for the flag cutoff.
    pub fn with_contamination(mut self, contamination: f64) -> Self {
        self.contamination = contamination;
        self
    }
}

impl fmt::Debug for ScoredDetector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScoredDetector")
            .field("name", &self.name)
            .field("contamination", &self.contamination)
            .field("lower_is_anomalous", &self.lower_is_anomalous)
            .finish()
    }
}

impl Detector for ScoredDetector {
    fn name(&self) -> &str {
        &self.name
    }

    fn detect(&self, samples: &SampleSet, params: &DetectorParams) -> DetectResult<DetectorResult> {
        let raw = (self.scorer)(samples, params)?;
        if raw.len() != samples.len() {
            return Err(DetectError::LengthMismatch {
                subject: format!("scores of detector '{}'", self.name),
                expected: samples.len(),
                actual: raw.len(),
            });
        }

        // Non-finite raw scores are treated as unscored.
        let raw: Vec<Option<f64>> = raw
            .into_iter()
            .map(|s| s.filter(|v| v.is_finite()))
            .collect();
        let present: Vec<f64> = raw.iter().flatten().copied().collect();
        if present.is_empty() {
            return Err(DetectError::InsufficientData {
                feature: params.feature.clone(),
                needed: 1,
                got: 0,
            });
        }

        let mut unit = min_max_normalize(&present).map_err(|e| DetectError::stats(&params.feature, e))?;
        if self.lower_is_anomalous {
            unit.iter_mut().for_each(|s| *s = 1.0 - *s);
        }
        let contamination = params.contamination.unwrap_or(self.contamination);
        let cutoff = contamination_cutoff(&unit, contamination)
            .map_err(|e| DetectError::invalid("contamination", e.to_string()))?;

        let mut next = unit.into_iter();
        let mut flags = Vec::with_capacity(raw.len());
        let mut scores = Vec::with_capacity(raw.len());
        for slot in &raw {
            match slot.and_then(|_| next.next()) {
                Some(score) => {
                    flags.push(score > cutoff);
                    scores.push(Some(score));
                }
                None => {
                    flags.push(false);
                    scores.push(None);
                }
            }
        }
        Ok(DetectorResult {
            flags,
            scores,
            scale: ScoreScale::Unit,
        })
    }
}

/// A named detector whose backing model is not loaded.
///
/// Always reports [`DetectError::Unavailable`]; lets a configuration name a
/// model-based detector before its serving collaborator is wired in.
#[derive(Clone, Debug)]
pub struct UnavailableDetector {
    name: String,
    reason: String,
}

impl UnavailableDetector {
    /// A detector that always reports itself unavailable.
    pub fn new(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

impl Detector for UnavailableDetector {
    fn name(&self) -> &str {
        &self.name
    }

    fn detect(&self, _samples: &SampleSet, _params: &DetectorParams) -> DetectResult<DetectorResult> {
        Err(DetectError::Unavailable {
            detector: self.name.clone(),
            reason: self.reason.clone(),
        })
    }
}
