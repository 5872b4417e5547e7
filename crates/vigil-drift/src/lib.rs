//! # vigil-drift
//!
//! Decides, per feature and globally, whether current data has drifted
//! away from a fixed reference dataset.
//!
//! ## Architecture
//!
//! ```text
//!   reference SampleSet ──► ReferenceProfile (fitted once)
//!                               │  present values · scaler · principal axes
//!                               ▼
//!   current / windows ──► hypothesis │ moments │ projection
//!                               │  raw outputs kept per technique
//!                               ▼
//!                         FeatureDrift (OR across techniques)
//!                               ▼
//!                         DriftReport ──► DriftHistory (bounded, optional store)
//! ```

#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod history;
pub mod monitor;
pub mod report;
pub mod techniques;

pub use config::{DriftConfig, HypothesisTest, TechniqueSet};
pub use error::{DriftError, DriftResult};
pub use history::{
    DriftHistory, DriftHistoryEntry, HistoryPersistence, InMemoryHistory, JsonFileHistory,
    TrendPoint,
};
pub use monitor::{compare, DriftMonitor, ReferenceProfile, TimeWindow};
pub use report::{DriftReport, FeatureDrift, TechniqueFlags, TemporalDriftReport, WindowInfo};
pub use techniques::{
    hypothesis_test, moment_distance, relative_difference, HypothesisOutcome, MomentOutcome,
    ProjectionModel, ProjectionOutcome,
};

/// Default p-value threshold for the hypothesis technique.
pub const DEFAULT_SIGNIFICANCE: f64 = 0.05;

/// Default relative-difference threshold for the moment technique.
pub const DEFAULT_MOMENT_THRESHOLD: f64 = 0.05;

/// Default centroid-distance threshold for the projection technique.
pub const DEFAULT_PROJECTION_THRESHOLD: f64 = 0.05;

/// Default number of principal axes.
pub const DEFAULT_PROJECTION_RANK: usize = 2;

/// Default retained history entries.
pub const DEFAULT_HISTORY_CAPACITY: usize = 256;
