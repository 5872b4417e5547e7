//! Expanding-window folds for time-ordered data.
//!
//! ```text
//!   n = 10, n_splits = 3, gap = 1
//!   fold 0: train [0, 3)  · gap ·  test [4, 6)
//!   fold 1: train [0, 5)  · gap ·  test [6, 8)
//!   fold 2: train [0, 7)  · gap ·  test [8, 10)
//! ```

use std::collections::BTreeSet;
use std::ops::Range;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{EvalError, EvalResult};
use crate::MetricMap;

/// One train/test split; train always precedes test.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fold {
    pub index: usize,
    pub train: Range<usize>,
    pub test: Range<usize>,
}

/// Expanding-window splitter for time-ordered samples.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSeriesSplit {
    pub n_splits: usize,
    /// Samples dropped between the end of training and the start of testing.
    pub gap: usize,
}

impl Default for TimeSeriesSplit {
    fn default() -> Self {
        Self {
            n_splits: crate::DEFAULT_SPLITS,
            gap: 0,
        }
    }
}

impl TimeSeriesSplit {
    /// Splitter producing `n_splits` folds with no gap.
    pub fn new(n_splits: usize) -> Self {
        Self { n_splits, gap: 0 }
    }

    /// Drop `gap` samples between each train and test block.
    pub fn with_gap(mut self, gap: usize) -> Self {
        self.gap = gap;
        self
    }

    /// Folds over `n` time-ordered samples.
    ///
    /// Test blocks have equal size `n / (n_splits + 1)` and tile the tail of
    /// the series; each training range ends `gap` samples before its test
    /// block.
    pub fn split(&self, n: usize) -> EvalResult<Vec<Fold>> {
        if self.n_splits < 2 {
            return Err(EvalError::InvalidParameter {
                name: "n_splits",
                detail: format!("need at least 2 splits, got {}", self.n_splits),
            });
        }
        let n_folds = self.n_splits + 1;
        if n < n_folds {
            return Err(EvalError::InsufficientData {
                needed: n_folds,
                got: n,
            });
        }
        let test_size = n / n_folds;
        let first_test = n - self.n_splits * test_size;
        if first_test <= self.gap {
            return Err(EvalError::InsufficientData {
                needed: self.gap + self.n_splits * test_size + 1,
                got: n,
            });
        }

        let folds: Vec<Fold> = (0..self.n_splits)
            .map(|index| {
                let test_start = first_test + index * test_size;
                Fold {
                    index,
                    train: 0..test_start - self.gap,
                    test: test_start..test_start + test_size,
                }
            })
            .collect();
        debug!(n, n_splits = self.n_splits, gap = self.gap, test_size, "built time-series folds");
        Ok(folds)
    }
}

/// Mean and population standard deviation of every numeric metric across
/// folds, keyed `<metric>_mean` and `<metric>_std`.
///
/// A metric missing from some folds is summarised over the folds that
/// carry it.
pub fn summarize_folds(folds: &[MetricMap]) -> EvalResult<MetricMap> {
    let keys: BTreeSet<&String> = folds
        .iter()
        .flat_map(|m| m.iter())
        .filter(|(_, v)| v.is_number())
        .map(|(k, _)| k)
        .collect();

    let mut summary = MetricMap::new();
    for key in keys {
        let values: Vec<f64> = folds
            .iter()
            .filter_map(|m| m.get(key).and_then(Value::as_f64))
            .collect();
        summary.insert(format!("{}_mean", key), Value::from(vigil_stats::mean(&values)?));
        summary.insert(format!("{}_std", key), Value::from(vigil_stats::std_dev(&values)?));
    }
    Ok(summary)
}
