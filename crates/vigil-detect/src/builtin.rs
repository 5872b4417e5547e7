//! Built-in detectors computed directly on the statistics primitives.
//!
//! ```text
//!   feature values (present only)
//!       │
//!       ├──► ZScoreDetector  |x - μ| / σ  >  threshold
//!       └──► IqrDetector     x ∉ [Q1 - k·IQR, Q3 + k·IQR]
//!             │
//!             ▼
//!       flags + raw scores re-aligned to the original sample positions
//! ```

use vigil_stats::{zscores, IqrBounds, DEFAULT_IQR_MULTIPLIER};

use crate::detector::{Detector, DetectorParams, DetectorResult, ScoreScale};
use crate::error::{DetectError, DetectResult};
use crate::sample::{Feature, SampleSet};

/// Default z-score threshold.
pub const DEFAULT_Z_THRESHOLD: f64 = 3.0;

/// Scatter per-present-value outputs back onto the full sample axis.
fn realign(feature: &Feature, per_present: &[(bool, f64)], scale: ScoreScale) -> DetectorResult {
    let mut flags = Vec::with_capacity(feature.values.len());
    let mut scores = Vec::with_capacity(feature.values.len());
    let mut next = per_present.iter();
    for value in &feature.values {
        match value.and_then(|_| next.next()) {
            Some(&(flag, score)) => {
                flags.push(flag);
                scores.push(Some(score));
            }
            None => {
                flags.push(false);
                scores.push(None);
            }
        }
    }
    DetectorResult {
        flags,
        scores,
        scale,
    }
}

fn positive_param(name: &str, value: f64) -> DetectResult<f64> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(DetectError::invalid(
            name,
            format!("{} must be finite and non-negative", value),
        ))
    }
}

// ── Z-score ─────────────────────────────────────────────────────────────

/// Flags samples whose absolute standard score exceeds a threshold.
///
/// Raw score: `|z|`. A feature with zero spread fails with
/// [`DetectError::DegenerateDistribution`].
#[derive(Clone, Debug)]
pub struct ZScoreDetector {
    pub threshold: f64,
}

impl ZScoreDetector {
    pub const NAME: &'static str = "zscore";

    /// Flag samples whose |z| exceeds `threshold`.
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }
}

impl Default for ZScoreDetector {
    fn default() -> Self {
        Self::new(DEFAULT_Z_THRESHOLD)
    }
}

impl Detector for ZScoreDetector {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn detect(&self, samples: &SampleSet, params: &DetectorParams) -> DetectResult<DetectorResult> {
        let threshold = positive_param("threshold", params.threshold.unwrap_or(self.threshold))?;
        let feature = samples.feature(&params.feature)?;
        let z = zscores(&feature.present()).map_err(|e| DetectError::stats(&feature.name, e))?;
        let per_present: Vec<(bool, f64)> = z
            .into_iter()
            .map(|z| (z.abs() > threshold, z.abs()))
            .collect();
        Ok(realign(feature, &per_present, ScoreScale::Threshold(threshold)))
    }
}

// ── IQR ─────────────────────────────────────────────────────────────────

/// Flags samples outside the Tukey fences.
///
/// Raw score: distance outside `[Q1, Q3]` in IQR units. A zero IQR gives
/// zero-width fences, so every value off the quartile box is flagged.
#[derive(Clone, Debug)]
pub struct IqrDetector {
    pub multiplier: f64,
}

impl IqrDetector {
    pub const NAME: &'static str = "iqr";

    /// Fences at `multiplier` IQRs beyond the quartiles.
    pub fn new(multiplier: f64) -> Self {
        Self { multiplier }
    }
}

impl Default for IqrDetector {
    fn default() -> Self {
        Self::new(DEFAULT_IQR_MULTIPLIER)
    }
}

impl Detector for IqrDetector {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn detect(&self, samples: &SampleSet, params: &DetectorParams) -> DetectResult<DetectorResult> {
        let multiplier =
            positive_param("multiplier", params.threshold.unwrap_or(self.multiplier))?;
        let feature = samples.feature(&params.feature)?;
        let present = feature.present();
        let bounds =
            IqrBounds::compute(&present, multiplier).map_err(|e| DetectError::stats(&feature.name, e))?;
        let per_present: Vec<(bool, f64)> = present
            .iter()
            .map(|&v| (!bounds.contains(v), bounds.excess(v)))
            .collect();
        Ok(realign(feature, &per_present, ScoreScale::Threshold(multiplier)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn set(values: Vec<f64>) -> SampleSet {
        SampleSet::new().with_feature("temperature", values).unwrap()
    }

    fn params() -> DetectorParams {
        DetectorParams::for_feature("temperature")
    }

    fn with_spike() -> Vec<f64> {
        let mut v: Vec<f64> = (0..30).map(|i| 20.0 + (i % 5) as f64 * 0.1).collect();
        v.push(35.0);
        v
    }

    #[test]
    fn zscore_flags_spike() {
        let r = ZScoreDetector::default().detect(&set(with_spike()), &params()).unwrap();
        assert_eq!(r.flagged_indices(), vec![30]);
        assert_eq!(r.scale, ScoreScale::Threshold(3.0));
    }

    #[test]
    fn zscore_constant_feature_is_degenerate() {
        let err = ZScoreDetector::default()
            .detect(&set(vec![7.0; 10]), &params())
            .unwrap_err();
        assert!(matches!(err, DetectError::DegenerateDistribution { ref feature, .. } if feature == "temperature"));
    }

    #[test]
    fn flags_stay_aligned_with_missing_values() {
        let mut v = with_spike();
        v.insert(3, f64::NAN);
        v.insert(10, f64::NAN);
        let r = ZScoreDetector::default().detect(&set(v), &params()).unwrap();
        assert_eq!(r.len(), 33);
        assert_eq!(r.scores[3], None);
        assert_eq!(r.scores[10], None);
        assert!(!r.flags[3]);
        assert_eq!(r.flagged_indices(), vec![32]);
    }

    #[test]
    fn threshold_param_overrides_default() {
        let r = ZScoreDetector::default()
            .detect(&set(with_spike()), &params().with_threshold(100.0))
            .unwrap();
        assert!(r.flagged_indices().is_empty());
    }

    #[test]
    fn iqr_flags_values_outside_fences() {
        let mut v: Vec<f64> = (1..=9).map(f64::from).collect();
        v.push(14.0);
        v.push(-20.0);
        let r = IqrDetector::default().detect(&set(v), &params()).unwrap();
        assert_eq!(r.flagged_indices(), vec![10]);
    }

    #[test]
    fn iqr_zero_width_fences_flag_every_other_value() {
        let r = IqrDetector::default()
            .detect(&set(vec![5.0, 5.0, 5.0, 5.0, 5.0, 6.0, 4.0]), &params())
            .unwrap();
        assert_eq!(r.flagged_indices(), vec![5, 6]);
        assert_eq!(r.normalized_scores()[5], Some(1.0));
    }

    #[test]
    fn iqr_score_boundary_matches_flags() {
        let mut v: Vec<f64> = (1..=9).map(f64::from).collect();
        v.push(30.0);
        let r = IqrDetector::default().detect(&set(v), &params()).unwrap();
        for (flag, score) in r.flags.iter().zip(r.normalized_scores()) {
            let score = score.unwrap();
            assert_eq!(*flag, score > 0.5, "score {score}");
        }
    }

    #[test]
    fn missing_feature_is_reported() {
        let err = IqrDetector::default()
            .detect(&set(vec![1.0, 2.0]), &DetectorParams::for_feature("humidity"))
            .unwrap_err();
        assert_eq!(err, DetectError::FeatureNotFound("humidity".into()));
    }

    #[test]
    fn all_missing_feature_is_insufficient() {
        let err = IqrDetector::default()
            .detect(&set(vec![f64::NAN, f64::NAN]), &params())
            .unwrap_err();
        assert!(matches!(err, DetectError::InsufficientData { got: 0, .. }));
    }

    proptest! {
        #[test]
        fn zscore_flags_invariant_under_shift_and_scale(
            base in prop::collection::vec(-100.0f64..100.0, 8..64),
            spike in 200.0f64..2000.0,
            shift in -1000.0f64..1000.0,
            scale in 0.1f64..100.0,
        ) {
            let mut values = base;
            values.push(spike);
            let detector = ZScoreDetector::default();
            let original = detector.detect(&set(values.clone()), &params()).unwrap();
            let moved: Vec<f64> = values.iter().map(|v| v * scale + shift).collect();
            let transformed = detector.detect(&set(moved), &params()).unwrap();
            for i in 0..values.len() {
                let z = original.scores[i].unwrap();
                // Skip scores sitting on the boundary, where rounding decides.
                if (z - DEFAULT_Z_THRESHOLD).abs() > 1e-6 {
                    prop_assert_eq!(original.flags[i], transformed.flags[i]);
                }
            }
        }
    }
}
