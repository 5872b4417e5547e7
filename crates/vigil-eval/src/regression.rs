use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{check_lengths, EvalError, EvalResult};
use crate::MetricMap;

/// Error metrics for numeric predictions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegressionMetrics {
    pub mae: f64,
    pub mse: f64,
    pub rmse: f64,
    /// 1.0 for a perfect fit of a constant target, 0.0 for an imperfect one.
    pub r2: f64,
}

impl RegressionMetrics {
    /// Compute metrics over paired truth and prediction values.
    pub fn compute(truth: &[f64], predicted: &[f64]) -> EvalResult<Self> {
        check_lengths("predictions", truth.len(), predicted.len())?;
        if truth.iter().chain(predicted).any(|v| !v.is_finite()) {
            return Err(EvalError::InvalidParameter {
                name: "values",
                detail: "regression inputs must be finite".into(),
            });
        }
        let n = truth.len() as f64;
        let (abs_sum, sq_sum) = truth
            .iter()
            .zip(predicted)
            .fold((0.0, 0.0), |(a, s), (t, p)| {
                let e = t - p;
                (a + e.abs(), s + e * e)
            });
        let mean = vigil_stats::mean(truth)?;
        let total: f64 = truth.iter().map(|t| (t - mean).powi(2)).sum();
        let r2 = if total == 0.0 {
            if sq_sum == 0.0 {
                1.0
            } else {
                0.0
            }
        } else {
            1.0 - sq_sum / total
        };
        let mse = sq_sum / n;
        Ok(Self {
            mae: abs_sum / n,
            mse,
            rmse: mse.sqrt(),
            r2,
        })
    }

    /// Metrics keyed by name, ready to store with a model version.
    pub fn to_metric_map(&self) -> MetricMap {
        [
            ("mae", self.mae),
            ("mse", self.mse),
            ("rmse", self.rmse),
            ("r2", self.r2),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), Value::from(v)))
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn textbook_values() {
        let m = RegressionMetrics::compute(&[3.0, -0.5, 2.0, 7.0], &[2.5, 0.0, 2.0, 8.0]).unwrap();
        assert_eq!(m.mae, 0.5);
        assert_eq!(m.mse, 0.375);
        assert!((m.rmse - 0.375f64.sqrt()).abs() < 1e-15);
        assert!((m.r2 - 0.948_608_137_044_967_9).abs() < 1e-12);
    }

    #[test]
    fn constant_target() {
        assert_eq!(RegressionMetrics::compute(&[2.0, 2.0], &[2.0, 2.0]).unwrap().r2, 1.0);
        assert_eq!(RegressionMetrics::compute(&[2.0, 2.0], &[2.0, 3.0]).unwrap().r2, 0.0);
    }

    #[test]
    fn rejects_bad_input() {
        assert!(RegressionMetrics::compute(&[], &[]).is_err());
        assert!(RegressionMetrics::compute(&[1.0, f64::NAN], &[1.0, 1.0]).is_err());
    }

    #[test]
    fn metric_map_keys() {
        let m = RegressionMetrics::compute(&[1.0, 2.0], &[1.0, 2.5]).unwrap();
        let map = m.to_metric_map();
        let keys: Vec<&str> = map.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["mae", "mse", "r2", "rmse"]);
    }
}
