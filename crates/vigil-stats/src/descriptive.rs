//! Descriptive statistics over a single feature.
//!
//! All functions take the *present* values of a feature; callers strip
//! missing observations before handing a slice in. Variance and standard
//! deviation are population moments (ddof = 0) and quantiles use linear
//! interpolation between closest ranks.

use serde::{Deserialize, Serialize};

use crate::error::{StatsError, StatsResult};

/// Arithmetic mean.
pub fn mean(values: &[f64]) -> StatsResult<f64> {
    if values.is_empty() {
        return Err(StatsError::EmptyInput("mean"));
    }
    Ok(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population variance (divides by `n`).
pub fn variance(values: &[f64]) -> StatsResult<f64> {
    let m = mean(values)?;
    Ok(values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64)
}

/// Population standard deviation.
pub fn std_dev(values: &[f64]) -> StatsResult<f64> {
    Ok(variance(values)?.sqrt())
}

/// Quantile `q` in `[0, 1]`, linearly interpolated between closest ranks.
pub fn quantile(values: &[f64], q: f64) -> StatsResult<f64> {
    if values.is_empty() {
        return Err(StatsError::EmptyInput("quantile"));
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    quantile_sorted(&sorted, q)
}

/// Quantile of an already ascending-sorted slice.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> StatsResult<f64> {
    if sorted.is_empty() {
        return Err(StatsError::EmptyInput("quantile"));
    }
    if !(0.0..=1.0).contains(&q) {
        return Err(StatsError::InvalidParameter {
            name: "q",
            detail: format!("{} is outside [0, 1]", q),
        });
    }
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Ok(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Standardise every value: `(x - mean) / std`.
///
/// Fails with [`StatsError::DegenerateDistribution`] when the spread is zero
/// relative to the magnitude of the data, instead of dividing by zero.
pub fn zscores(values: &[f64]) -> StatsResult<Vec<f64>> {
    let summary = Summary::of(values)?;
    if summary.is_degenerate() {
        return Err(StatsError::DegenerateDistribution(format!(
            "standard deviation {:e} over {} values",
            summary.std_dev, summary.count
        )));
    }
    Ok(values
        .iter()
        .map(|v| (v - summary.mean) / summary.std_dev)
        .collect())
}

// ── Summary ─────────────────────────────────────────────────────────────

/// First and second moments plus range of a feature.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub count: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

impl Summary {
    /// Summarise `values`; fails on empty input.
    pub fn of(values: &[f64]) -> StatsResult<Self> {
        let mean = mean(values)?;
        let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
        let (min, max) = values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });
        Ok(Self {
            count: values.len(),
            mean,
            std_dev: var.sqrt(),
            min,
            max,
        })
    }

    /// Whether the spread is indistinguishable from rounding noise.
    pub fn is_degenerate(&self) -> bool {
        let magnitude = self.min.abs().max(self.max.abs());
        self.std_dev == 0.0 || self.std_dev <= f64::EPSILON * magnitude
    }
}

// ── IQR bounds ──────────────────────────────────────────────────────────

/// Default Tukey fence multiplier.
pub const DEFAULT_IQR_MULTIPLIER: f64 = 1.5;

/// Tukey fences `[Q1 - k·IQR, Q3 + k·IQR]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct IqrBounds {
    pub q1: f64,
    pub q3: f64,
    pub iqr: f64,
    pub lower: f64,
    pub upper: f64,
}

impl IqrBounds {
    /// Compute fences over the values. A zero IQR yields zero-width fences.
    pub fn compute(values: &[f64], multiplier: f64) -> StatsResult<Self> {
        if !(multiplier >= 0.0 && multiplier.is_finite()) {
            return Err(StatsError::InvalidParameter {
                name: "multiplier",
                detail: format!("{} must be finite and non-negative", multiplier),
            });
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let q1 = quantile_sorted(&sorted, 0.25)?;
        let q3 = quantile_sorted(&sorted, 0.75)?;
        let iqr = q3 - q1;
        Ok(Self {
            q1,
            q3,
            iqr,
            lower: q1 - multiplier * iqr,
            upper: q3 + multiplier * iqr,
        })
    }

    /// Whether `value` lies within the fences, inclusive.
    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }

    /// Distance outside the quartile box, in IQR units (0 inside `[Q1, Q3]`).
    ///
    /// With a zero IQR any value off the box is infinitely far.
    pub fn excess(&self, value: f64) -> f64 {
        let outside = if value < self.q1 {
            self.q1 - value
        } else if value > self.q3 {
            value - self.q3
        } else {
            0.0
        };
        if outside == 0.0 {
            0.0
        } else if self.iqr > 0.0 {
            outside / self.iqr
        } else {
            f64::INFINITY
        }
    }
}
