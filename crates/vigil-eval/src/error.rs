use thiserror::Error;

use vigil_stats::StatsError;

/// Evaluation errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EvalError {
    #[error("{subject}: expected {expected} values, got {actual}")]
    LengthMismatch {
        subject: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("empty input: {0}")]
    EmptyInput(&'static str),

    #[error("invalid parameter {name}: {detail}")]
    InvalidParameter { name: &'static str, detail: String },

    #[error("insufficient data: need at least {needed} samples, got {got}")]
    InsufficientData { needed: usize, got: usize },

    #[error(transparent)]
    Stats(#[from] StatsError),
}

/// Result type for evaluation
pub type EvalResult<T> = Result<T, EvalError>;

pub(crate) fn check_lengths(subject: &'static str, expected: usize, actual: usize) -> EvalResult<()> {
    if expected != actual {
        return Err(EvalError::LengthMismatch {
            subject,
            expected,
            actual,
        });
    }
    if expected == 0 {
        return Err(EvalError::EmptyInput(subject));
    }
    Ok(())
}
