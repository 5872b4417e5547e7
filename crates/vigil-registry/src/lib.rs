//! # vigil-registry
//!
//! Immutable, versioned storage of trained detector artifacts together with
//! their metrics and parameters, plus a single "current" pointer.
//!
//! ## Guarantees
//!
//! - Version ids are unique, including for saves within the same second.
//! - Versions are never modified after save; only `current` moves.
//! - The first version ever saved becomes current.
//! - Metrics round-trip bit-identically.
//! - A reader never observes a partially written version.
//! - Within one process, registries opened on the same directory share a
//!   write lock, so no committed save is dropped from the index.
//!
//! ```text
//!   save(artifact) ─► codec ─► staging dir ─► rename ─► index (commit)
//!   load(id?)      ─► index ─► artifact ─► codec
//! ```

#![deny(unsafe_code)]

pub mod clock;
pub mod codec;
pub mod compare;
pub mod error;
pub mod index;
pub mod registry;

pub use clock::{Clock, ManualClock, SystemClock};
pub use codec::{ArtifactCodec, BytesCodec, JsonCodec};
pub use compare::{compare_metrics, MetricComparison, PercentChange};
pub use error::{RegistryError, RegistryResult};
pub use index::{Metrics, ModelVersion, Parameters, RegistryIndex, VersionRecord};
pub use registry::{ModelRegistry, CONFIG_DIR, INDEX_FILE, MAX_WRITE_ATTEMPTS, VERSIONS_DIR};

/// Default registry root, relative to the working directory.
pub const DEFAULT_BASE_DIR: &str = "models";
