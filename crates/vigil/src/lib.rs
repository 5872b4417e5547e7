//! # vigil
//!
//! Decides whether incoming sensor samples are anomalous and whether the
//! data feeding a detector has drifted, and keeps trained detector
//! artifacts under version control.
//!
//! ## Architecture
//!
//! ```text
//!   VigilConfig::load (defaults → file → VIGIL_* env)
//!        │
//!        ▼
//!   Engine ──► DetectorRegistry ──► AnomalyEnsemble ──► EnsembleVerdict
//!        │
//!        ├──► DriftMonitor(reference) ──► DriftReport / DriftHistory
//!        │
//!        └──► ModelRegistry<codec> ──► versions + current pointer
//!
//!   vigil-eval: ClassificationMetrics / RegressionMetrics ──► registry metrics
//! ```
//!
//! Component crates are re-exported under short names (`vigil::detect`,
//! `vigil::drift`, ...) for callers that need more than the engine.

#![deny(unsafe_code)]

pub mod config;
pub mod engine;
pub mod error;
pub mod telemetry;

pub use vigil_detect as detect;
pub use vigil_drift as drift;
pub use vigil_eval as eval;
pub use vigil_registry as registry;
pub use vigil_stats as stats;

pub use config::{DetectorSettings, LoggingConfig, RegistrySettings, VigilConfig, ENV_PREFIX};
pub use engine::Engine;
pub use error::{VigilError, VigilResult};
pub use telemetry::init_tracing;
