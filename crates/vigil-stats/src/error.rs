use thiserror::Error;

/// Errors raised by the statistics primitives.
///
/// Zero IQR and a zero reference mean are defined behaviours of the callers,
/// not errors; only conditions that make a computation meaningless land here.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StatsError {
    #[error("empty input: {0}")]
    EmptyInput(&'static str),

    #[error("degenerate distribution: {0}")]
    DegenerateDistribution(String),

    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("insufficient data: need at least {needed} values, got {got}")]
    InsufficientData { needed: usize, got: usize },

    #[error("invalid parameter {name}: {detail}")]
    InvalidParameter { name: &'static str, detail: String },
}

/// Convenience type alias for statistics results.
pub type StatsResult<T> = Result<T, StatsError>;
