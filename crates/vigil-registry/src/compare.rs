use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::index::Metrics;

/// Relative change of a metric between two versions.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PercentChange {
    Finite(f64),
    /// The first version's value was exactly zero.
    Unbounded,
}

impl PercentChange {
    /// Numeric value; `Unbounded` is positive infinity.
    pub fn as_f64(&self) -> f64 {
        match *self {
            PercentChange::Finite(v) => v,
            PercentChange::Unbounded => f64::INFINITY,
        }
    }
}

/// One metric in two versions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetricComparison {
    pub value_a: f64,
    pub value_b: f64,
    /// `value_b - value_a`.
    pub absolute_diff: f64,
    pub percent_diff: PercentChange,
}

impl MetricComparison {
    /// Compare `value_a` (before) with `value_b` (after).
    pub fn between(value_a: f64, value_b: f64) -> Self {
        let absolute_diff = value_b - value_a;
        let percent_diff = if value_a == 0.0 {
            PercentChange::Unbounded
        } else {
            PercentChange::Finite(absolute_diff / value_a * 100.0)
        };
        Self {
            value_a,
            value_b,
            absolute_diff,
            percent_diff,
        }
    }
}

/// Compare the numeric metrics present in both maps.
///
/// Keys only one side has, and non-numeric values (booleans included),
/// are left out.
pub fn compare_metrics(a: &Metrics, b: &Metrics) -> BTreeMap<String, MetricComparison> {
    a.iter()
        .filter_map(|(key, va)| {
            let vb = b.get(key)?;
            if !(va.is_number() && vb.is_number()) {
                return None;
            }
            Some((key.clone(), MetricComparison::between(va.as_f64()?, vb.as_f64()?)))
        })
        .collect()
}
