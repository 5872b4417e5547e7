//! Tabular sample sets: named numeric features of equal length with
//! representable missing values.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::error::{DetectError, DetectResult};

/// One named feature column. `None` marks a missing observation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

impl Feature {
    /// Present values, in sample order.
    pub fn present(&self) -> Vec<f64> {
        self.values.iter().flatten().copied().collect()
    }

    /// Number of missing values.
    pub fn missing_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_none()).count()
    }
}

/// Ordered observations for one or more named features.
///
/// All features share one length. NaN inputs are stored as missing.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SampleSet {
    features: Vec<Feature>,
    len: usize,
}

impl SampleSet {
    /// An empty sample set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(name, values)` pairs.
    pub fn from_columns<I, S>(columns: I) -> DetectResult<Self>
    where
        I: IntoIterator<Item = (S, Vec<f64>)>,
        S: Into<String>,
    {
        columns
            .into_iter()
            .try_fold(Self::new(), |set, (name, values)| set.with_feature(name, values))
    }

    /// Add a fully observed feature (NaN entries become missing).
    pub fn with_feature(self, name: impl Into<String>, values: Vec<f64>) -> DetectResult<Self> {
        let values = values
            .into_iter()
            .map(|v| if v.is_nan() { None } else { Some(v) })
            .collect();
        self.with_optional_feature(name, values)
    }

    /// Add a feature with explicit missing values.
    pub fn with_optional_feature(
        mut self,
        name: impl Into<String>,
        values: Vec<Option<f64>>,
    ) -> DetectResult<Self> {
        let name = name.into();
        if self.features.iter().any(|f| f.name == name) {
            return Err(DetectError::invalid(
                "feature",
                format!("duplicate feature name '{}'", name),
            ));
        }
        let values: Vec<Option<f64>> = values
            .into_iter()
            .map(|v| v.filter(|x| !x.is_nan()))
            .collect();
        if self.features.is_empty() {
            self.len = values.len();
        } else if values.len() != self.len {
            return Err(DetectError::LengthMismatch {
                subject: format!("feature '{}'", name),
                expected: self.len,
                actual: values.len(),
            });
        }
        self.features.push(Feature { name, values });
        Ok(self)
    }

    /// Number of samples (rows).
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of features.
    pub fn feature_count(&self) -> usize {
        self.features.len()
    }

    /// Feature names in insertion order.
    pub fn feature_names(&self) -> Vec<&str> {
        self.features.iter().map(|f| f.name.as_str()).collect()
    }

    /// All features in insertion order.
    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    /// Look up a feature by name.
    pub fn feature(&self, name: &str) -> DetectResult<&Feature> {
        self.features
            .iter()
            .find(|f| f.name == name)
            .ok_or_else(|| DetectError::FeatureNotFound(name.to_string()))
    }

    /// Column position of a feature.
    pub fn feature_index(&self, name: &str) -> Option<usize> {
        self.features.iter().position(|f| f.name == name)
    }

    /// Present values of one feature.
    pub fn present(&self, name: &str) -> DetectResult<Vec<f64>> {
        Ok(self.feature(name)?.present())
    }

    /// Rows where every feature is present (listwise deletion), in order.
    pub fn complete_rows(&self) -> Vec<Vec<f64>> {
        (0..self.len)
            .filter_map(|i| {
                self.features
                    .iter()
                    .map(|f| f.values[i])
                    .collect::<Option<Vec<f64>>>()
            })
            .collect()
    }

    /// Rows `range` of every feature as a new set.
    pub fn slice(&self, range: Range<usize>) -> DetectResult<Self> {
        if range.start > range.end || range.end > self.len {
            return Err(DetectError::invalid(
                "range",
                format!("{:?} outside 0..{}", range, self.len),
            ));
        }
        Ok(Self {
            features: self
                .features
                .iter()
                .map(|f| Feature {
                    name: f.name.clone(),
                    values: f.values[range.clone()].to_vec(),
                })
                .collect(),
            len: range.len(),
        })
    }

    /// Split into consecutive windows of `size` rows; the last may be shorter.
    pub fn windows(&self, size: usize) -> DetectResult<Vec<Self>> {
        if size == 0 {
            return Err(DetectError::invalid("size", "window size must be positive"));
        }
        (0..self.len)
            .step_by(size)
            .map(|start| self.slice(start..(start + size).min(self.len)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sensors() -> SampleSet {
        SampleSet::from_columns([
            ("temperature", vec![20.0, 21.0, f64::NAN, 23.0]),
            ("humidity", vec![40.0, 41.0, 42.0, 43.0]),
        ])
        .unwrap()
    }

    #[test]
    fn nan_is_stored_as_missing() {
        let set = sensors();
        let temp = set.feature("temperature").unwrap();
        assert_eq!(temp.values[2], None);
        assert_eq!(temp.missing_count(), 1);
        assert_eq!(temp.present(), vec![20.0, 21.0, 23.0]);
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        let err = sensors().with_feature("pressure", vec![1.0]).unwrap_err();
        assert!(matches!(
            err,
            DetectError::LengthMismatch {
                expected: 4,
                actual: 1,
                ..
            }
        ));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        assert!(sensors().with_feature("humidity", vec![0.0; 4]).is_err());
    }

    #[test]
    fn unknown_feature_is_reported() {
        assert_eq!(
            sensors().feature("vibration").unwrap_err(),
            DetectError::FeatureNotFound("vibration".into())
        );
    }

    #[test]
    fn complete_rows_drop_incomplete_observations() {
        let rows = sensors().complete_rows();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2], vec![23.0, 43.0]);
    }

    #[test]
    fn windows_cover_all_rows() {
        let set = sensors();
        let windows = set.windows(3).unwrap();
        assert_eq!(windows.len(), 2);
        assert_eq!(windows[0].len(), 3);
        assert_eq!(windows[1].len(), 1);
        assert_eq!(windows[1].feature("humidity").unwrap().values, vec![Some(43.0)]);
        assert!(set.windows(0).is_err());
    }
}
