use thiserror::Error;
use vigil_detect::DetectError;
use vigil_stats::StatsError;

/// Errors from the drift monitor and its history store.
#[derive(Debug, Error)]
pub enum DriftError {
    #[error("feature '{0}' missing from current data")]
    FeatureNotFound(String),

    #[error("insufficient data for {context}: need {needed}, got {got}")]
    InsufficientData {
        context: String,
        needed: usize,
        got: usize,
    },

    #[error("invalid drift parameter {name}: {detail}")]
    InvalidParameter { name: String, detail: String },

    #[error("statistics failure in {context}: {source}")]
    Stats {
        context: String,
        #[source]
        source: StatsError,
    },

    #[error("sample set error: {0}")]
    Sample(#[from] DetectError),

    #[error("history persistence error: {0}")]
    Persistence(String),

    #[error("history serialization error: {0}")]
    Serialization(String),

    #[error("lock acquisition failed")]
    LockError,
}

impl DriftError {
    /// Attach context (feature or technique) to a primitive failure.
    pub fn stats(context: impl Into<String>, err: StatsError) -> Self {
        let context = context.into();
        match err {
            StatsError::EmptyInput(_) => DriftError::InsufficientData {
                context,
                needed: 1,
                got: 0,
            },
            StatsError::InsufficientData { needed, got } => DriftError::InsufficientData {
                context,
                needed,
                got,
            },
            source => DriftError::Stats { context, source },
        }
    }

    pub fn invalid(name: impl Into<String>, detail: impl Into<String>) -> Self {
        DriftError::InvalidParameter {
            name: name.into(),
            detail: detail.into(),
        }
    }
}

impl From<std::io::Error> for DriftError {
    fn from(e: std::io::Error) -> Self {
        DriftError::Persistence(e.to_string())
    }
}

impl From<serde_json::Error> for DriftError {
    fn from(e: serde_json::Error) -> Self {
        DriftError::Serialization(e.to_string())
    }
}

/// Convenience type alias for drift results.
pub type DriftResult<T> = Result<T, DriftError>;
