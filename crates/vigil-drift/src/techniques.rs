//! The three drift techniques, each reported with its raw output.
//!
//! ```text
//!   hypothesis   KS / Student t / Welch t   p < significance
//!   moments      Δmean, Δstd (relative)     either > moment_threshold
//!   projection   centroid distance on the   distance > projection_threshold
//!                reference principal axes
//! ```

use serde::{Deserialize, Serialize};
use vigil_stats::{
    centroid, euclidean_distance, ks_two_sample, mean, std_dev, t_test, PrincipalAxes,
    StandardScaler,
};

use crate::config::HypothesisTest;
use crate::error::{DriftError, DriftResult};

// ── Hypothesis test ─────────────────────────────────────────────────────

/// Two-sample test statistic and p-value for one feature.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HypothesisOutcome {
    pub test: HypothesisTest,
    pub statistic: f64,
    pub p_value: f64,
    pub significance: f64,
    pub drift_detected: bool,
}

/// Test whether `reference` and `current` share a distribution.
pub fn hypothesis_test(
    feature: &str,
    reference: &[f64],
    current: &[f64],
    test: HypothesisTest,
    significance: f64,
) -> DriftResult<HypothesisOutcome> {
    let outcome = match test {
        HypothesisTest::KolmogorovSmirnov => ks_two_sample(reference, current),
        HypothesisTest::StudentT => t_test(reference, current, true),
        HypothesisTest::WelchT => t_test(reference, current, false),
    }
    .map_err(|e| DriftError::stats(format!("hypothesis test on '{}'", feature), e))?;
    Ok(HypothesisOutcome {
        test,
        statistic: outcome.statistic,
        p_value: outcome.p_value,
        significance,
        drift_detected: outcome.p_value < significance,
    })
}

// ── Moment distance ─────────────────────────────────────────────────────

/// Relative mean and standard deviation differences for one feature.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MomentOutcome {
    pub reference_mean: f64,
    pub current_mean: f64,
    pub reference_std: f64,
    pub current_std: f64,
    /// Relative mean difference (absolute when the reference mean is 0).
    pub mean_diff: f64,
    /// Relative std difference (absolute when the reference std is 0).
    pub std_diff: f64,
    pub threshold: f64,
    pub drift_detected: bool,
}

/// `|cur - ref| / |ref|`, or `|cur - ref|` when `ref` is exactly zero.
pub fn relative_difference(reference: f64, current: f64) -> f64 {
    let diff = (current - reference).abs();
    if reference == 0.0 {
        diff
    } else {
        diff / reference.abs()
    }
}

/// Compare mean and standard deviation against the reference.
pub fn moment_distance(
    feature: &str,
    reference: &[f64],
    current: &[f64],
    threshold: f64,
) -> DriftResult<MomentOutcome> {
    let ctx = |side: &str| format!("{} moments of '{}'", side, feature);
    let reference_mean = mean(reference).map_err(|e| DriftError::stats(ctx("reference"), e))?;
    let reference_std = std_dev(reference).map_err(|e| DriftError::stats(ctx("reference"), e))?;
    let current_mean = mean(current).map_err(|e| DriftError::stats(ctx("current"), e))?;
    let current_std = std_dev(current).map_err(|e| DriftError::stats(ctx("current"), e))?;

    let mean_diff = relative_difference(reference_mean, current_mean);
    let std_diff = relative_difference(reference_std, current_std);
    Ok(MomentOutcome {
        reference_mean,
        current_mean,
        reference_std,
        current_std,
        mean_diff,
        std_diff,
        threshold,
        drift_detected: mean_diff > threshold || std_diff > threshold,
    })
}

// ── Projection ──────────────────────────────────────────────────────────

/// Principal axes fitted once on standardised reference rows.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProjectionModel {
    pub scaler: StandardScaler,
    pub axes: PrincipalAxes,
    /// Column means of the standardised reference rows.
    reference_mean: Vec<f64>,
    pub reference_centroid: Vec<f64>,
}

/// Centroid shift in the fitted projected space.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProjectionOutcome {
    pub distance: f64,
    pub threshold: f64,
    pub drift_detected: bool,
    pub reference_centroid: Vec<f64>,
    pub current_centroid: Vec<f64>,
    pub explained_variance_ratio: Vec<f64>,
    /// Per-feature share of the centroid displacement, summing to 1
    /// (all zeros when the centroids coincide).
    pub feature_shares: Vec<f64>,
    /// Features whose share is at least the mean share; empty unless drift.
    pub attributed_features: Vec<usize>,
}

impl ProjectionModel {
    /// Fit on complete reference rows.
    pub fn fit(rows: &[Vec<f64>], rank: usize) -> DriftResult<Self> {
        let scaler =
            StandardScaler::fit(rows).map_err(|e| DriftError::stats("projection reference", e))?;
        let standardised = scaler
            .transform(rows)
            .map_err(|e| DriftError::stats("projection reference", e))?;
        let axes = PrincipalAxes::fit(&standardised, rank)
            .map_err(|e| DriftError::stats("projection reference", e))?;
        let reference_mean =
            centroid(&standardised).map_err(|e| DriftError::stats("projection reference", e))?;
        let projected = axes
            .project(&standardised)
            .map_err(|e| DriftError::stats("projection reference", e))?;
        let reference_centroid =
            centroid(&projected).map_err(|e| DriftError::stats("projection reference", e))?;
        Ok(Self {
            scaler,
            axes,
            reference_mean,
            reference_centroid,
        })
    }

    /// Project `rows` and measure their centroid against the reference.
    pub fn compare(&self, rows: &[Vec<f64>], threshold: f64) -> DriftResult<ProjectionOutcome> {
        let standardised = self
            .scaler
            .transform(rows)
            .map_err(|e| DriftError::stats("projection current", e))?;
        let current_mean =
            centroid(&standardised).map_err(|e| DriftError::stats("projection current", e))?;
        let projected = self
            .axes
            .project(&standardised)
            .map_err(|e| DriftError::stats("projection current", e))?;
        let current_centroid =
            centroid(&projected).map_err(|e| DriftError::stats("projection current", e))?;
        let distance = euclidean_distance(&self.reference_centroid, &current_centroid)
            .map_err(|e| DriftError::stats("projection current", e))?;
        let drift_detected = distance > threshold;

        // Contribution of feature i: |Δz_i| · ‖loadings of i‖.
        let contributions: Vec<f64> = current_mean
            .iter()
            .zip(&self.reference_mean)
            .enumerate()
            .map(|(i, (c, r))| {
                let loading = self
                    .axes
                    .components
                    .iter()
                    .map(|axis| axis[i] * axis[i])
                    .sum::<f64>()
                    .sqrt();
                (c - r).abs() * loading
            })
            .collect();
        let total: f64 = contributions.iter().sum();
        let feature_shares: Vec<f64> = if total > 0.0 {
            contributions.iter().map(|c| c / total).collect()
        } else {
            vec![0.0; contributions.len()]
        };
        let attributed_features = if drift_detected && total > 0.0 {
            let mean_share = 1.0 / feature_shares.len() as f64;
            feature_shares
                .iter()
                .enumerate()
                .filter(|(_, s)| **s > 0.0 && **s >= mean_share)
                .map(|(i, _)| i)
                .collect()
        } else {
            Vec::new()
        };

        Ok(ProjectionOutcome {
            distance,
            threshold,
            drift_detected,
            reference_centroid: self.reference_centroid.clone(),
            current_centroid,
            explained_variance_ratio: self.axes.explained_variance_ratio.clone(),
            feature_shares,
            attributed_features,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_difference_falls_back_to_absolute_at_zero() {
        assert_eq!(relative_difference(0.0, 0.5), 0.5);
        assert_eq!(relative_difference(2.0, 3.0), 0.5);
        assert_eq!(relative_difference(-2.0, -3.0), 0.5);
        assert_eq!(relative_difference(0.0, 0.0), 0.0);
    }

    #[test]
    fn moments_flag_shift() {
        let reference: Vec<f64> = (0..100).map(|i| 10.0 + (i % 10) as f64).collect();
        let current: Vec<f64> = reference.iter().map(|v| v + 5.0).collect();
        let m = moment_distance("temperature", &reference, &current, 0.05).unwrap();
        assert!(m.drift_detected);
        assert!(m.mean_diff > 0.3);
        assert!(m.std_diff.abs() < 1e-9);
    }

    #[test]
    fn moments_of_constant_reference_use_absolute_std_difference() {
        let m = moment_distance("status", &[1.0, 1.0, 1.0], &[1.0, 1.0, 1.0], 0.05).unwrap();
        assert!(!m.drift_detected);
        assert_eq!(m.std_diff, 0.0);
        let m = moment_distance("status", &[1.0, 1.0], &[0.0, 2.0], 0.05).unwrap();
        assert!(m.std_diff.is_finite());
        assert!(m.drift_detected);
    }

    #[test]
    fn hypothesis_uses_configured_test() {
        let reference: Vec<f64> = (0..50).map(f64::from).collect();
        let current: Vec<f64> = (100..150).map(f64::from).collect();
        for test in [
            HypothesisTest::KolmogorovSmirnov,
            HypothesisTest::StudentT,
            HypothesisTest::WelchT,
        ] {
            let h = hypothesis_test("t", &reference, &current, test, 0.05).unwrap();
            assert_eq!(h.test, test);
            assert!(h.drift_detected, "{test:?} p = {}", h.p_value);
        }
    }

    #[test]
    fn t_test_needs_two_values() {
        let err = hypothesis_test("t", &[1.0], &[1.0, 2.0], HypothesisTest::StudentT, 0.05)
            .unwrap_err();
        assert!(matches!(err, DriftError::InsufficientData { needed: 2, got: 1, .. }));
    }

    fn grid(shift_a: f64, shift_b: f64) -> Vec<Vec<f64>> {
        (0..60)
            .map(|i| {
                let t = i as f64;
                vec![t.sin() + shift_a, (t * 0.37).cos() * 2.0 + shift_b, t % 7.0]
            })
            .collect()
    }

    #[test]
    fn projection_of_reference_itself_has_zero_distance() {
        let rows = grid(0.0, 0.0);
        let model = ProjectionModel::fit(&rows, 2).unwrap();
        let out = model.compare(&rows, 0.05).unwrap();
        assert_eq!(out.distance, 0.0);
        assert!(!out.drift_detected);
        assert!(out.attributed_features.is_empty());
        assert_eq!(out.explained_variance_ratio.len(), 2);
    }

    #[test]
    fn projection_attributes_shifted_feature() {
        let model = ProjectionModel::fit(&grid(0.0, 0.0), 3).unwrap();
        let out = model.compare(&grid(3.0, 0.0), 0.05).unwrap();
        assert!(out.drift_detected);
        assert!(out.distance > 0.05);
        assert_eq!(out.attributed_features, vec![0]);
        let share_sum: f64 = out.feature_shares.iter().sum();
        assert!((share_sum - 1.0).abs() < 1e-9);
    }
}
