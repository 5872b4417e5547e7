//! Score normalisation helpers for model-based detectors.

use crate::descriptive::quantile;
use crate::error::{StatsError, StatsResult};

/// Rescale to `[0, 1]`. A constant input maps to all zeros.
pub fn min_max_normalize(values: &[f64]) -> StatsResult<Vec<f64>> {
    if values.is_empty() {
        return Err(StatsError::EmptyInput("min_max_normalize"));
    }
    let (lo, hi) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let span = hi - lo;
    if span <= 0.0 {
        return Ok(vec![0.0; values.len()]);
    }
    Ok(values.iter().map(|v| (v - lo) / span).collect())
}

/// Score above which the top `contamination` share of samples lies.
///
/// Samples with a score strictly greater than the returned cutoff are
/// outliers. `contamination` must lie in `(0, 0.5]`.
pub fn contamination_cutoff(scores: &[f64], contamination: f64) -> StatsResult<f64> {
    if !(contamination > 0.0 && contamination <= 0.5) {
        return Err(StatsError::InvalidParameter {
            name: "contamination",
            detail: format!("{} is outside (0, 0.5]", contamination),
        });
    }
    quantile(scores, 1.0 - contamination)
}
