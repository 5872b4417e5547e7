//! Weighted ensemble combiner.
//!
//! ## Architecture
//!
//! ```text
//!   SampleSet + DetectorParams
//!       │
//!       ▼
//!   DetectorRegistry::run(configured names)
//!       │  results (available)        skipped (absent / degenerate / unavailable)
//!       ▼
//!   combine(results, EnsembleConfig)
//!       │  per sample: Σ wᵢ·scoreᵢ / Σ wᵢ over detectors that scored it
//!       ▼
//!   EnsembleVerdict { probability ≥ decision_threshold }
//! ```
//!
//! The configuration is immutable per call; which detectors are available
//! is decided fresh on every call and never written back.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::builtin::{IqrDetector, ZScoreDetector};
use crate::detector::{DetectorParams, DetectorResult};
use crate::error::{DetectError, DetectResult};
use crate::registry::{DetectorRegistry, Skipped};
use crate::sample::SampleSet;

/// Default probability at or above which a sample is anomalous.
pub const DEFAULT_DECISION_THRESHOLD: f64 = 0.5;

/// Detector weights and the final decision threshold.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnsembleConfig {
    pub weights: BTreeMap<String, f64>,
    pub decision_threshold: f64,
}

impl Default for EnsembleConfig {
    fn default() -> Self {
        Self {
            weights: BTreeMap::from([
                (ZScoreDetector::NAME.to_string(), 0.5),
                (IqrDetector::NAME.to_string(), 0.5),
            ]),
            decision_threshold: DEFAULT_DECISION_THRESHOLD,
        }
    }
}

impl EnsembleConfig {
    /// Weights per detector name, with the default decision threshold.
    pub fn new<I, S>(weights: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        Self {
            weights: weights.into_iter().map(|(k, w)| (k.into(), w)).collect(),
            decision_threshold: DEFAULT_DECISION_THRESHOLD,
        }
    }

    /// Set the probability at or above which a sample is anomalous.
    pub fn with_decision_threshold(mut self, threshold: f64) -> Self {
        self.decision_threshold = threshold;
        self
    }

    /// Require a non-empty weight map of finite, non-negative weights and a
    /// decision threshold in [0, 1].
    pub fn validate(&self) -> DetectResult<()> {
        if self.weights.is_empty() {
            return Err(DetectError::invalid("weights", "at least one detector weight is required"));
        }
        for (name, w) in &self.weights {
            if !(w.is_finite() && *w >= 0.0) {
                return Err(DetectError::invalid(
                    format!("weights.{}", name),
                    format!("{} must be finite and non-negative", w),
                ));
            }
        }
        if !(0.0..=1.0).contains(&self.decision_threshold) {
            return Err(DetectError::invalid(
                "decision_threshold",
                format!("{} is outside [0, 1]", self.decision_threshold),
            ));
        }
        Ok(())
    }

    /// Names with a positive weight, in key order.
    pub fn active_detectors(&self) -> Vec<&str> {
        self.weights
            .iter()
            .filter(|(_, w)| **w > 0.0)
            .map(|(k, _)| k.as_str())
            .collect()
    }
}

/// Final per-sample anomaly decision.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnsembleVerdict {
    pub flags: Vec<bool>,
    /// `None` where no contributing detector scored the sample.
    pub probabilities: Vec<Option<f64>>,
    /// Call-level weights after renormalisation over available detectors.
    pub weights_used: BTreeMap<String, f64>,
}

impl EnsembleVerdict {
    /// Number of samples judged anomalous.
    pub fn anomaly_count(&self) -> usize {
        self.flags.iter().filter(|&&f| f).count()
    }

    /// Positions of samples judged anomalous.
    pub fn anomaly_indices(&self) -> Vec<usize> {
        self.flags
            .iter()
            .enumerate()
            .filter_map(|(i, &f)| f.then_some(i))
            .collect()
    }
}

/// Merge detector results into one probability and verdict per sample.
///
/// Only detectors that produced a result *and* carry a positive weight
/// contribute; their weights are renormalised to sum to 1. Results whose
/// name has no configured weight are ignored. With no contributing
/// detector the call fails with [`DetectError::NoDetectorsAvailable`].
pub fn combine(
    results: &BTreeMap<String, DetectorResult>,
    config: &EnsembleConfig,
) -> DetectResult<EnsembleVerdict> {
    let contributing: Vec<(&str, f64, &DetectorResult)> = results
        .iter()
        .filter_map(|(name, result)| {
            config
                .weights
                .get(name)
                .filter(|&&w| w > 0.0)
                .map(|&w| (name.as_str(), w, result))
        })
        .collect();

    let Some(&(_, _, first)) = contributing.first() else {
        return Err(DetectError::NoDetectorsAvailable {
            configured: config.weights.keys().cloned().collect(),
            skipped: Vec::new(),
        });
    };
    let n = first.len();
    for (name, _, result) in &contributing {
        result.validate(name, n)?;
    }

    let total: f64 = contributing.iter().map(|(_, w, _)| w).sum();
    let weights_used: BTreeMap<String, f64> = contributing
        .iter()
        .map(|(name, w, _)| (name.to_string(), w / total))
        .collect();
    if contributing.len() < config.active_detectors().len() {
        debug!(
            available = contributing.len(),
            configured = config.active_detectors().len(),
            ?weights_used,
            "renormalised ensemble weights over available detectors"
        );
    }

    let normalized: Vec<(f64, Vec<Option<f64>>)> = contributing
        .iter()
        .map(|(_, w, r)| (*w, r.normalized_scores()))
        .collect();

    let mut flags = Vec::with_capacity(n);
    let mut probabilities = Vec::with_capacity(n);
    for i in 0..n {
        let (num, den) = normalized
            .iter()
            .filter_map(|(w, scores)| scores[i].map(|s| (w * s, *w)))
            .fold((0.0, 0.0), |(num, den), (ws, w)| (num + ws, den + w));
        let p = (den > 0.0).then(|| num / den);
        flags.push(p.map_or(false, |p| p >= config.decision_threshold));
        probabilities.push(p);
    }

    Ok(EnsembleVerdict {
        flags,
        probabilities,
        weights_used,
    })
}

// ── Orchestrator ────────────────────────────────────────────────────────

/// Verdict plus which detectors took part.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnsembleOutcome {
    pub verdict: EnsembleVerdict,
    pub used: Vec<String>,
    pub skipped: Vec<Skipped>,
}

/// Runs the configured detectors from a registry and combines them.
#[derive(Clone, Debug)]
pub struct AnomalyEnsemble {
    registry: DetectorRegistry,
    config: EnsembleConfig,
}

impl AnomalyEnsemble {
    /// Build an ensemble after validating `config`.
    pub fn new(registry: DetectorRegistry, config: EnsembleConfig) -> DetectResult<Self> {
        config.validate()?;
        Ok(Self { registry, config })
    }

    pub fn config(&self) -> &EnsembleConfig {
        &self.config
    }

    pub fn registry(&self) -> &DetectorRegistry {
        &self.registry
    }

    /// Run every positively weighted detector and combine what they return.
    pub fn evaluate(
        &self,
        samples: &SampleSet,
        params: &DetectorParams,
    ) -> DetectResult<EnsembleOutcome> {
        let run = self
            .registry
            .run(self.config.active_detectors(), samples, params)?;
        let verdict = match combine(&run.results, &self.config) {
            Ok(v) => v,
            Err(DetectError::NoDetectorsAvailable { configured, .. }) => {
                return Err(DetectError::NoDetectorsAvailable {
                    configured,
                    skipped: run.skipped,
                });
            }
            Err(e) => return Err(e),
        };
        debug!(
            feature = %params.feature,
            anomalies = verdict.anomaly_count(),
            samples = samples.len(),
            "ensemble evaluated"
        );
        Ok(EnsembleOutcome {
            used: verdict.weights_used.keys().cloned().collect(),
            verdict,
            skipped: run.skipped,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::ScoreScale;
    use crate::plugin::UnavailableDetector;
    use crate::registry::SkipReason;
    use proptest::prelude::*;

    fn unit(scores: &[f64]) -> DetectorResult {
        DetectorResult {
            flags: scores.iter().map(|&s| s > 0.5).collect(),
            scores: scores.iter().map(|&s| Some(s)).collect(),
            scale: ScoreScale::Unit,
        }
    }

    #[test]
    fn unavailable_detector_weight_is_renormalised() {
        let config = EnsembleConfig::new([("A", 0.6), ("B", 0.4)]);
        let results = BTreeMap::from([("A".to_string(), unit(&[0.3, 0.8]))]);
        let v = combine(&results, &config).unwrap();
        assert!((v.probabilities[0].unwrap() - 0.3).abs() < 1e-12);
        assert!((v.probabilities[1].unwrap() - 0.8).abs() < 1e-12);
        assert_eq!(v.flags, vec![false, true]);
        assert_eq!(v.weights_used["A"], 1.0);
        assert!(!v.weights_used.contains_key("B"));
    }

    #[test]
    fn weighted_average_of_available_detectors() {
        let config = EnsembleConfig::new([("A", 0.6), ("B", 0.4)]);
        let results = BTreeMap::from([
            ("A".to_string(), unit(&[1.0, 0.0])),
            ("B".to_string(), unit(&[0.0, 1.0])),
        ]);
        let v = combine(&results, &config).unwrap();
        assert!((v.probabilities[0].unwrap() - 0.6).abs() < 1e-12);
        assert!((v.probabilities[1].unwrap() - 0.4).abs() < 1e-12);
        assert_eq!(v.anomaly_indices(), vec![0]);
    }

    #[test]
    fn no_available_detector_is_an_error() {
        let config = EnsembleConfig::new([("A", 1.0)]);
        let err = combine(&BTreeMap::new(), &config).unwrap_err();
        assert!(matches!(err, DetectError::NoDetectorsAvailable { .. }));
    }

    #[test]
    fn unconfigured_results_are_ignored() {
        let config = EnsembleConfig::new([("A", 1.0)]);
        let results = BTreeMap::from([
            ("A".to_string(), unit(&[0.2])),
            ("rogue".to_string(), unit(&[1.0])),
        ]);
        let v = combine(&results, &config).unwrap();
        assert_eq!(v.probabilities, vec![Some(0.2)]);
    }

    #[test]
    fn missing_scores_renormalise_per_sample() {
        let config = EnsembleConfig::new([("A", 0.5), ("B", 0.5)]);
        let b = DetectorResult {
            flags: vec![false, false],
            scores: vec![Some(0.0), None],
            scale: ScoreScale::Unit,
        };
        let results = BTreeMap::from([("A".to_string(), unit(&[0.4, 0.9])), ("B".to_string(), b)]);
        let v = combine(&results, &config).unwrap();
        assert!((v.probabilities[0].unwrap() - 0.2).abs() < 1e-12);
        assert!((v.probabilities[1].unwrap() - 0.9).abs() < 1e-12);
    }

    #[test]
    fn mismatched_result_lengths_are_rejected() {
        let config = EnsembleConfig::new([("A", 0.5), ("B", 0.5)]);
        let results = BTreeMap::from([
            ("A".to_string(), unit(&[0.4, 0.9])),
            ("B".to_string(), unit(&[0.1])),
        ]);
        assert!(matches!(
            combine(&results, &config),
            Err(DetectError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn config_validation() {
        assert!(EnsembleConfig::default().validate().is_ok());
        assert!(EnsembleConfig::new([("A", -1.0)]).validate().is_err());
        assert!(EnsembleConfig::new([("A", 1.0)])
            .with_decision_threshold(1.5)
            .validate()
            .is_err());
        assert!(EnsembleConfig::new(Vec::<(String, f64)>::new()).validate().is_err());
    }

    #[test]
    fn ensemble_reports_skipped_when_nothing_runs() {
        let mut registry = DetectorRegistry::new();
        registry.register(UnavailableDetector::new("lstm", "not trained"));
        let ensemble =
            AnomalyEnsemble::new(registry, EnsembleConfig::new([("lstm", 1.0)])).unwrap();
        let samples = SampleSet::new().with_feature("t", vec![1.0, 2.0]).unwrap();
        let err = ensemble
            .evaluate(&samples, &DetectorParams::for_feature("t"))
            .unwrap_err();
        match err {
            DetectError::NoDetectorsAvailable { configured, skipped } => {
                assert_eq!(configured, vec!["lstm".to_string()]);
                assert_eq!(skipped[0].reason, SkipReason::Unavailable("not trained".into()));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn ensemble_flags_spike_with_builtins() {
        let mut values: Vec<f64> = (0..40).map(|i| 20.0 + (i % 4) as f64 * 0.25).collect();
        values[17] = 45.0;
        let samples = SampleSet::new().with_feature("temperature", values).unwrap();
        let ensemble =
            AnomalyEnsemble::new(DetectorRegistry::with_builtins(), EnsembleConfig::default())
                .unwrap();
        let outcome = ensemble
            .evaluate(&samples, &DetectorParams::for_feature("temperature"))
            .unwrap();
        assert_eq!(outcome.verdict.anomaly_indices(), vec![17]);
        assert_eq!(outcome.used, vec!["iqr".to_string(), "zscore".to_string()]);
        assert!(outcome.skipped.is_empty());
    }

    proptest! {
        #[test]
        fn zero_weight_detector_never_moves_probability(
            a in prop::collection::vec(0.0f64..=1.0, 1..32),
            seed in prop::collection::vec(0.0f64..=1.0, 32),
            alt in prop::collection::vec(0.0f64..=1.0, 32),
        ) {
            let n = a.len();
            let config = EnsembleConfig::new([("A", 0.7), ("Z", 0.0)]);
            let with = |z: &[f64]| {
                let results = BTreeMap::from([
                    ("A".to_string(), unit(&a)),
                    ("Z".to_string(), unit(&z[..n])),
                ]);
                combine(&results, &config).unwrap()
            };
            prop_assert_eq!(with(&seed).probabilities, with(&alt).probabilities);
        }
    }
}
