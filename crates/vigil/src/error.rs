//! Engine-level error type.
//!
//! Each component crate keeps its own error enum; this one only wraps them
//! so callers of the assembled engine can use a single `?`.

use thiserror::Error;

use vigil_detect::DetectError;
use vigil_drift::DriftError;
use vigil_eval::EvalError;
use vigil_registry::RegistryError;
use vigil_stats::StatsError;

/// Engine errors
#[derive(Debug, Error)]
pub enum VigilError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Stats(#[from] StatsError),

    #[error(transparent)]
    Detect(#[from] DetectError),

    #[error(transparent)]
    Drift(#[from] DriftError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Eval(#[from] EvalError),
}

impl From<config::ConfigError> for VigilError {
    fn from(err: config::ConfigError) -> Self {
        VigilError::Config(err.to_string())
    }
}

pub type VigilResult<T> = std::result::Result<T, VigilError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn component_errors_keep_their_message() {
        let err: VigilError = RegistryError::VersionNotFound("rf_20240301_120000".into()).into();
        assert_eq!(err.to_string(), "Version not found: rf_20240301_120000");

        let err: VigilError = DetectError::FeatureNotFound("pressure".into()).into();
        assert!(matches!(err, VigilError::Detect(DetectError::FeatureNotFound(_))));
    }

    #[test]
    fn config_error_display() {
        let err = VigilError::Config("missing field".into());
        assert_eq!(err.to_string(), "Configuration error: missing field");
    }
}
