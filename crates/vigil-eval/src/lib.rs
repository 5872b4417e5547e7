//! # vigil-eval
//!
//! Scores a detector against labelled data and produces the flat metrics
//! document a model registry stores alongside each version.
//!
//! ```text
//!   labels + predictions ──► ClassificationMetrics ─┐
//!   targets + estimates  ──► RegressionMetrics     ─┼─► MetricMap ─► registry
//!   per-fold MetricMaps  ──► summarize_folds       ─┘
//! ```

#![deny(unsafe_code)]

pub mod classification;
pub mod error;
pub mod regression;
pub mod split;

use std::collections::BTreeMap;

pub use classification::{roc_auc, ClassificationMetrics, ConfusionMatrix};
pub use error::{EvalError, EvalResult};
pub use regression::RegressionMetrics;
pub use split::{summarize_folds, Fold, TimeSeriesSplit};

/// Metric name → JSON value; the same shape the model registry stores.
pub type MetricMap = BTreeMap<String, serde_json::Value>;

/// Default number of temporal folds.
pub const DEFAULT_SPLITS: usize = 5;
