//! Name-keyed detector registry.
//!
//! Adding a detector means registering it here; the combiner only ever sees
//! results keyed by name.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::builtin::{IqrDetector, ZScoreDetector};
use crate::detector::{Detector, DetectorParams, DetectorResult};
use crate::error::{DetectError, DetectResult};
use crate::sample::SampleSet;

/// Why a configured detector produced no result for a call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SkipReason {
    /// No detector registered under the name.
    Absent,
    /// The feature had no usable spread for this detector.
    Degenerate(String),
    /// The detector's backing model could not serve the call.
    Unavailable(String),
}

/// A detector left out of one run, and why.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Skipped {
    pub name: String,
    pub reason: SkipReason,
}

/// Results of the detectors that ran, plus the ones that did not.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DetectorRun {
    pub results: BTreeMap<String, DetectorResult>,
    pub skipped: Vec<Skipped>,
}

/// Detectors by name.
#[derive(Clone, Default)]
pub struct DetectorRegistry {
    detectors: BTreeMap<String, Arc<dyn Detector>>,
}

impl DetectorRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the z-score and IQR detectors with default settings.
    pub fn with_builtins() -> Self {
        Self::with_builtin_settings(ZScoreDetector::default(), IqrDetector::default())
    }

    /// Registry holding the given z-score and IQR detectors.
    pub fn with_builtin_settings(zscore: ZScoreDetector, iqr: IqrDetector) -> Self {
        let mut registry = Self::new();
        registry.register(zscore);
        registry.register(iqr);
        registry
    }

    /// Register a detector under its own name, returning any it replaced.
    pub fn register<D: Detector + 'static>(&mut self, detector: D) -> Option<Arc<dyn Detector>> {
        self.register_shared(Arc::new(detector))
    }

    /// Register an already shared detector, returning any it replaced.
    pub fn register_shared(&mut self, detector: Arc<dyn Detector>) -> Option<Arc<dyn Detector>> {
        let name = detector.name().to_string();
        debug!(detector = %name, "registering detector");
        self.detectors.insert(name, detector)
    }

    /// Remove a detector by name.
    pub fn unregister(&mut self, name: &str) -> Option<Arc<dyn Detector>> {
        self.detectors.remove(name)
    }

    /// Look up a detector by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Detector>> {
        self.detectors.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.detectors.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.detectors.keys().map(String::as_str).collect()
    }

    /// Number of registered detectors.
    pub fn len(&self) -> usize {
        self.detectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detectors.is_empty()
    }

    /// Run the named detectors.
    ///
    /// Absent, degenerate and unavailable detectors are skipped rather than
    /// zero-filled; any other failure aborts the run.
    pub fn run<'a, I>(
        &self,
        names: I,
        samples: &SampleSet,
        params: &DetectorParams,
    ) -> DetectResult<DetectorRun>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut run = DetectorRun::default();
        for name in names {
            let Some(detector) = self.detectors.get(name) else {
                warn!(detector = %name, "detector not registered, skipping");
                run.skipped.push(Skipped {
                    name: name.to_string(),
                    reason: SkipReason::Absent,
                });
                continue;
            };
            match detector.detect(samples, params) {
                Ok(result) => {
                    result.validate(name, samples.len())?;
                    run.results.insert(name.to_string(), result);
                }
                Err(DetectError::DegenerateDistribution { feature, detail }) => {
                    warn!(detector = %name, feature = %feature, %detail, "degenerate feature, skipping detector");
                    run.skipped.push(Skipped {
                        name: name.to_string(),
                        reason: SkipReason::Degenerate(detail),
                    });
                }
                Err(DetectError::Unavailable { reason, .. }) => {
                    warn!(detector = %name, %reason, "detector unavailable, skipping");
                    run.skipped.push(Skipped {
                        name: name.to_string(),
                        reason: SkipReason::Unavailable(reason),
                    });
                }
                Err(other) => return Err(other),
            }
        }
        Ok(run)
    }
}

impl fmt::Debug for DetectorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DetectorRegistry")
            .field("detectors", &self.names())
            .finish()
    }
}
