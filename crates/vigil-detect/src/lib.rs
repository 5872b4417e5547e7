//! # vigil-detect
//!
//! Per-sample anomaly decisions over tabular sensor data.
//!
//! ## Architecture
//!
//! ```text
//!   SampleSet (named features, missing values allowed)
//!       │
//!       ▼
//!   DetectorRegistry ── name ──► dyn Detector
//!       │                          ├── ZScoreDetector   (built-in)
//!       │                          ├── IqrDetector      (built-in)
//!       │                          └── ScoredDetector   (opaque model scorer)
//!       ▼
//!   DetectorRun { results, skipped }
//!       │
//!       ▼
//!   combine(results, EnsembleConfig) ──► EnsembleVerdict
//! ```
//!
//! ## Guarantees
//!
//! - Flags and scores are aligned with the original sample positions.
//! - A degenerate or unavailable detector is skipped, never zero-filled.
//! - Weights used at combine time sum to 1 over available detectors.
//! - An empty available set is an error, not an all-clear verdict.

#![deny(unsafe_code)]

pub mod builtin;
pub mod detector;
pub mod ensemble;
pub mod error;
pub mod plugin;
pub mod registry;
pub mod sample;

pub use builtin::{IqrDetector, ZScoreDetector, DEFAULT_Z_THRESHOLD};
pub use detector::{Detector, DetectorParams, DetectorResult, ScoreScale};
pub use ensemble::{
    combine, AnomalyEnsemble, EnsembleConfig, EnsembleOutcome, EnsembleVerdict,
    DEFAULT_DECISION_THRESHOLD,
};
pub use error::{DetectError, DetectResult};
pub use plugin::{ScoreFn, ScoredDetector, UnavailableDetector, DEFAULT_CONTAMINATION};
pub use registry::{DetectorRegistry, DetectorRun, SkipReason, Skipped};
pub use sample::{Feature, SampleSet};
