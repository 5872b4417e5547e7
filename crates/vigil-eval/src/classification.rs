//! Binary classification metrics, anomaly as the positive class.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{check_lengths, EvalError, EvalResult};
use crate::MetricMap;

/// Counts of a binary confusion matrix.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub true_negatives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
    pub true_positives: usize,
}

impl ConfusionMatrix {
    /// Tally labels; anomalies are the positive class.
    pub fn from_labels(truth: &[bool], predicted: &[bool]) -> Self {
        truth
            .iter()
            .zip(predicted)
            .fold(Self::default(), |mut m, (&t, &p)| {
                match (t, p) {
                    (false, false) => m.true_negatives += 1,
                    (false, true) => m.false_positives += 1,
                    (true, false) => m.false_negatives += 1,
                    (true, true) => m.true_positives += 1,
                }
                m
            })
    }

    /// Number of labelled samples.
    pub fn total(&self) -> usize {
        self.true_negatives + self.false_positives + self.false_negatives + self.true_positives
    }

    /// `[[tn, fp], [fn, tp]]`, rows are truth.
    pub fn as_rows(&self) -> [[usize; 2]; 2] {
        [
            [self.true_negatives, self.false_positives],
            [self.false_negatives, self.true_positives],
        ]
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// Binary classification quality for the anomaly class.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClassificationMetrics {
    pub accuracy: f64,
    /// 0 when nothing was predicted positive.
    pub precision: f64,
    /// 0 when there are no positives in the truth.
    pub recall: f64,
    pub f1: f64,
    pub confusion: ConfusionMatrix,
    /// Present only when scores were given and both classes occur.
    pub roc_auc: Option<f64>,
}

impl ClassificationMetrics {
    /// Compute metrics; ROC-AUC only when `scores` are given.
    pub fn compute(
        truth: &[bool],
        predicted: &[bool],
        scores: Option<&[f64]>,
    ) -> EvalResult<Self> {
        check_lengths("predictions", truth.len(), predicted.len())?;
        let confusion = ConfusionMatrix::from_labels(truth, predicted);
        let tp = confusion.true_positives;
        let precision = ratio(tp, tp + confusion.false_positives);
        let recall = ratio(tp, tp + confusion.false_negatives);
        let f1 = if precision + recall == 0.0 {
            0.0
        } else {
            2.0 * precision * recall / (precision + recall)
        };
        let roc_auc = match scores {
            Some(scores) => {
                check_lengths("scores", truth.len(), scores.len())?;
                roc_auc(truth, scores)?
            }
            None => None,
        };
        Ok(Self {
            accuracy: ratio(tp + confusion.true_negatives, confusion.total()),
            precision,
            recall,
            f1,
            confusion,
            roc_auc,
        })
    }

    /// Flat metrics document, ready for a model registry.
    pub fn to_metric_map(&self) -> MetricMap {
        let mut map = MetricMap::new();
        map.insert("accuracy".into(), Value::from(self.accuracy));
        map.insert("precision".into(), Value::from(self.precision));
        map.insert("recall".into(), Value::from(self.recall));
        map.insert("f1".into(), Value::from(self.f1));
        map.insert("true_negatives".into(), Value::from(self.confusion.true_negatives));
        map.insert("false_positives".into(), Value::from(self.confusion.false_positives));
        map.insert("false_negatives".into(), Value::from(self.confusion.false_negatives));
        map.insert("true_positives".into(), Value::from(self.confusion.true_positives));
        if let Some(auc) = self.roc_auc {
            map.insert("roc_auc".into(), Value::from(auc));
        }
        map
    }
}

/// Area under the ROC curve as the Mann-Whitney rank statistic.
///
/// Tied scores share their average rank. `None` when only one class is
/// present.
pub fn roc_auc(truth: &[bool], scores: &[f64]) -> EvalResult<Option<f64>> {
    check_lengths("scores", truth.len(), scores.len())?;
    if let Some(bad) = scores.iter().find(|s| !s.is_finite()) {
        return Err(EvalError::InvalidParameter {
            name: "scores",
            detail: format!("non-finite score {}", bad),
        });
    }
    let positives = truth.iter().filter(|&&t| t).count();
    let negatives = truth.len() - positives;
    if positives == 0 || negatives == 0 {
        return Ok(None);
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));
    let mut ranks = vec![0.0; scores.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && scores[order[end]] == scores[order[start]] {
            end += 1;
        }
        // Ranks are 1-based; the tie group spans start+1..=end.
        let average = (start + 1 + end) as f64 / 2.0;
        for &i in &order[start..end] {
            ranks[i] = average;
        }
        start = end;
    }

    let positive_rank_sum: f64 = truth
        .iter()
        .zip(&ranks)
        .filter(|(t, _)| **t)
        .map(|(_, r)| *r)
        .sum();
    let p = positives as f64;
    let u = positive_rank_sum - p * (p + 1.0) / 2.0;
    Ok(Some(u / (p * negatives as f64)))
}
