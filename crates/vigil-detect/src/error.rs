use thiserror::Error;
use vigil_stats::StatsError;

use crate::registry::Skipped;

/// Errors from detectors, the detector registry and the ensemble combiner.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DetectError {
    #[error("degenerate distribution in feature '{feature}': {detail}")]
    DegenerateDistribution { feature: String, detail: String },

    #[error("no detectors available (configured: {configured:?}, skipped: {})", skipped.len())]
    NoDetectorsAvailable {
        configured: Vec<String>,
        skipped: Vec<Skipped>,
    },

    #[error("length mismatch for {subject}: expected {expected}, got {actual}")]
    LengthMismatch {
        subject: String,
        expected: usize,
        actual: usize,
    },

    #[error("feature not found: {0}")]
    FeatureNotFound(String),

    #[error("invalid parameter {name}: {detail}")]
    InvalidParameter { name: String, detail: String },

    #[error("detector '{detector}' produced score {score} at index {index}, outside [0, 1]")]
    ScoreOutOfRange {
        detector: String,
        index: usize,
        score: f64,
    },

    #[error("detector '{detector}' unavailable: {reason}")]
    Unavailable { detector: String, reason: String },

    #[error("insufficient data in feature '{feature}': need {needed}, got {got}")]
    InsufficientData {
        feature: String,
        needed: usize,
        got: usize,
    },

    #[error("statistics failure in feature '{feature}': {source}")]
    Stats {
        feature: String,
        #[source]
        source: StatsError,
    },
}

impl DetectError {
    /// Attach feature context to a primitive failure.
    pub fn stats(feature: &str, err: StatsError) -> Self {
        match err {
            StatsError::DegenerateDistribution(detail) => DetectError::DegenerateDistribution {
                feature: feature.to_string(),
                detail,
            },
            StatsError::EmptyInput(_) => DetectError::InsufficientData {
                feature: feature.to_string(),
                needed: 1,
                got: 0,
            },
            StatsError::InsufficientData { needed, got } => DetectError::InsufficientData {
                feature: feature.to_string(),
                needed,
                got,
            },
            source => DetectError::Stats {
                feature: feature.to_string(),
                source,
            },
        }
    }

    /// Shorthand for `InvalidParameter`.
    pub fn invalid(name: impl Into<String>, detail: impl Into<String>) -> Self {
        DetectError::InvalidParameter {
            name: name.into(),
            detail: detail.into(),
        }
    }
}

/// Convenience type alias for detection results.
pub type DetectResult<T> = Result<T, DetectError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degenerate_stats_error_keeps_feature_name() {
        let e = DetectError::stats(
            "temperature",
            StatsError::DegenerateDistribution("std 0".into()),
        );
        assert!(matches!(e, DetectError::DegenerateDistribution { ref feature, .. } if feature == "temperature"));
        assert!(e.to_string().contains("temperature"));
    }

    #[test]
    fn empty_input_becomes_insufficient_data() {
        let e = DetectError::stats("humidity", StatsError::EmptyInput("mean"));
        assert_eq!(
            e,
            DetectError::InsufficientData {
                feature: "humidity".into(),
                needed: 1,
                got: 0
            }
        );
    }

    #[test]
    fn error_display_messages() {
        let e = DetectError::ScoreOutOfRange {
            detector: "isolation".into(),
            index: 4,
            score: 1.2,
        };
        assert!(e.to_string().contains("isolation"));

        let e = DetectError::NoDetectorsAvailable {
            configured: vec!["zscore".into()],
            skipped: vec![],
        };
        assert!(e.to_string().contains("zscore"));
    }
}
