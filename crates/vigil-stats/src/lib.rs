//! # vigil-stats
//!
//! Numeric primitives shared by the anomaly detectors and the drift monitor.
//!
//! ```text
//!   descriptive   mean · population std · quantiles · z-scores · IQR fences
//!   hypothesis    two-sample KS · Student / Welch t · special functions
//!   projection    standard scaler · principal axes (Jacobi) · centroids
//!   normalize     min-max · contamination cutoff
//! ```
//!
//! Every function works on the present values of a feature; missing-value
//! handling belongs to the callers.

#![deny(unsafe_code)]

pub mod descriptive;
pub mod error;
pub mod hypothesis;
pub mod normalize;
pub mod projection;

pub use descriptive::{
    mean, quantile, quantile_sorted, std_dev, variance, zscores, IqrBounds, Summary,
    DEFAULT_IQR_MULTIPLIER,
};
pub use error::{StatsError, StatsResult};
pub use hypothesis::{
    kolmogorov_survival, ks_two_sample, regularized_incomplete_beta, student_t_two_sided, t_test,
    TestOutcome,
};
pub use normalize::{contamination_cutoff, min_max_normalize};
pub use projection::{centroid, euclidean_distance, PrincipalAxes, StandardScaler};
