//! Reference profile and the drift monitor.
//!
//! The reference is fitted once (present values per feature, standardiser
//! and principal axes) and never mutated afterwards, so every window is
//! judged against exactly the same baseline.

use chrono::{DateTime, Utc};
use tracing::{debug, info};
use vigil_detect::SampleSet;

use crate::config::DriftConfig;
use crate::error::{DriftError, DriftResult};
use crate::history::{DriftHistory, HistoryPersistence};
use crate::report::{DriftReport, FeatureDrift, TechniqueFlags, TemporalDriftReport, WindowInfo};
use crate::techniques::{hypothesis_test, moment_distance, ProjectionModel};

/// A current dataset observed over one time window.
#[derive(Clone, Debug, PartialEq)]
pub struct TimeWindow {
    pub label: Option<DateTime<Utc>>,
    pub samples: SampleSet,
}

impl TimeWindow {
    /// An unlabelled window.
    pub fn new(samples: SampleSet) -> Self {
        Self {
            label: None,
            samples,
        }
    }

    /// A window tagged with the time it covers.
    pub fn labelled(label: DateTime<Utc>, samples: SampleSet) -> Self {
        Self {
            label: Some(label),
            samples,
        }
    }
}

// ── Reference profile ───────────────────────────────────────────────────

#[derive(Clone, Debug)]
struct ReferenceFeature {
    name: String,
    present: Vec<f64>,
}

/// Everything fitted from the reference dataset.
#[derive(Clone, Debug)]
pub struct ReferenceProfile {
    features: Vec<ReferenceFeature>,
    projection: Option<ProjectionModel>,
}

impl ReferenceProfile {
    /// Fit per-feature values and, when enabled, the projection.
    pub fn fit(reference: &SampleSet, config: &DriftConfig) -> DriftResult<Self> {
        if reference.feature_count() == 0 {
            return Err(DriftError::InsufficientData {
                context: "reference features".into(),
                needed: 1,
                got: 0,
            });
        }
        let features = reference
            .features()
            .iter()
            .map(|f| ReferenceFeature {
                name: f.name.clone(),
                present: f.present(),
            })
            .collect();
        let projection = if config.techniques.projection {
            Some(ProjectionModel::fit(
                &reference.complete_rows(),
                config.projection_rank,
            )?)
        } else {
            None
        };
        Ok(Self {
            features,
            projection,
        })
    }

    /// Reference feature names in column order.
    pub fn feature_names(&self) -> Vec<&str> {
        self.features.iter().map(|f| f.name.as_str()).collect()
    }

    /// Fitted projection, absent when the technique is disabled.
    pub fn projection(&self) -> Option<&ProjectionModel> {
        self.projection.as_ref()
    }

    /// Judge `current` against the reference.
    pub fn compare(&self, current: &SampleSet, config: &DriftConfig) -> DriftResult<DriftReport> {
        let mut columns = Vec::with_capacity(self.features.len());
        for reference in &self.features {
            let feature = current
                .feature(&reference.name)
                .map_err(|_| DriftError::FeatureNotFound(reference.name.clone()))?;
            columns.push(feature);
        }

        let projection = match &self.projection {
            Some(model) => {
                let rows: Vec<Vec<f64>> = (0..current.len())
                    .filter_map(|i| {
                        columns
                            .iter()
                            .map(|f| f.values[i])
                            .collect::<Option<Vec<f64>>>()
                    })
                    .collect();
                if rows.is_empty() {
                    return Err(DriftError::InsufficientData {
                        context: "complete current rows for projection".into(),
                        needed: 1,
                        got: 0,
                    });
                }
                Some(model.compare(&rows, config.projection_threshold)?)
            }
            None => None,
        };

        let mut features = Vec::with_capacity(self.features.len());
        for (index, (reference, column)) in self.features.iter().zip(&columns).enumerate() {
            let present = column.present();
            let hypothesis = if config.techniques.hypothesis {
                Some(hypothesis_test(
                    &reference.name,
                    &reference.present,
                    &present,
                    config.test,
                    config.significance,
                )?)
            } else {
                None
            };
            let moments = if config.techniques.moments {
                Some(moment_distance(
                    &reference.name,
                    &reference.present,
                    &present,
                    config.moment_threshold,
                )?)
            } else {
                None
            };
            let projection_share = projection.as_ref().map(|p| p.feature_shares[index]);
            let projection_flagged = projection
                .as_ref()
                .is_some_and(|p| p.attributed_features.contains(&index));

            let drift_detected = hypothesis.as_ref().is_some_and(|h| h.drift_detected)
                || moments.as_ref().is_some_and(|m| m.drift_detected)
                || projection_flagged;
            if drift_detected {
                info!(
                    feature = %reference.name,
                    p_value = hypothesis.as_ref().map(|h| h.p_value),
                    mean_diff = moments.as_ref().map(|m| m.mean_diff),
                    projection_flagged,
                    "drift detected"
                );
            }
            features.push(FeatureDrift {
                feature: reference.name.clone(),
                index,
                hypothesis,
                moments,
                projection_share,
                projection_flagged,
                drift_detected,
            });
        }

        let technique_flags = TechniqueFlags {
            hypothesis: features
                .iter()
                .any(|f| f.hypothesis.as_ref().is_some_and(|h| h.drift_detected)),
            moments: features
                .iter()
                .any(|f| f.moments.as_ref().is_some_and(|m| m.drift_detected)),
            projection: projection.as_ref().is_some_and(|p| p.drift_detected),
        };
        let drifted_features: Vec<usize> = features
            .iter()
            .filter(|f| f.drift_detected)
            .map(|f| f.index)
            .collect();
        let drift_fraction = drifted_features.len() as f64 / features.len() as f64;

        Ok(DriftReport {
            global_drift: !drifted_features.is_empty(),
            drifted_features,
            drift_fraction,
            technique_flags,
            projection,
            features,
            window: None,
        })
    }
}

/// One-shot comparison of `current` against `reference`.
pub fn compare(
    reference: &SampleSet,
    current: &SampleSet,
    config: &DriftConfig,
) -> DriftResult<DriftReport> {
    config.validate()?;
    ReferenceProfile::fit(reference, config)?.compare(current, config)
}

// ── Monitor ─────────────────────────────────────────────────────────────

/// Drift monitor over a fixed reference, with bounded history.
pub struct DriftMonitor {
    reference: SampleSet,
    profile: ReferenceProfile,
    config: DriftConfig,
    history: DriftHistory,
    persistence: Option<Box<dyn HistoryPersistence>>,
}

impl DriftMonitor {
    /// Validate `config` and fit the reference once.
    pub fn new(reference: SampleSet, config: DriftConfig) -> DriftResult<Self> {
        config.validate()?;
        let profile = ReferenceProfile::fit(&reference, &config)?;
        Ok(Self {
            history: DriftHistory::new(config.history_capacity),
            reference,
            profile,
            config,
            persistence: None,
        })
    }

    /// Attach a history store, restoring whatever it already holds.
    pub fn with_persistence(mut self, store: Box<dyn HistoryPersistence>) -> DriftResult<Self> {
        let stored = store.load()?;
        debug!(entries = stored.len(), "restored drift history");
        self.history = DriftHistory::restore(self.config.history_capacity, stored);
        self.persistence = Some(store);
        Ok(self)
    }

    pub fn reference(&self) -> &SampleSet {
        &self.reference
    }

    pub fn config(&self) -> &DriftConfig {
        &self.config
    }

    pub fn profile(&self) -> &ReferenceProfile {
        &self.profile
    }

    /// Summaries of every window monitored so far.
    pub fn history(&self) -> &DriftHistory {
        &self.history
    }

    /// Compare one current dataset. Does not touch the history.
    pub fn compare(&self, current: &SampleSet) -> DriftResult<DriftReport> {
        self.profile.compare(current, &self.config)
    }

    /// Judge each window independently against the reference.
    ///
    /// All windows are evaluated before any history is written, and the
    /// updated history replaces the old one only once the store accepts it.
    /// A failing window or a failing save leaves the history unchanged.
    pub fn monitor_windows(&mut self, windows: &[TimeWindow]) -> DriftResult<TemporalDriftReport> {
        let mut reports = Vec::with_capacity(windows.len());
        for (index, window) in windows.iter().enumerate() {
            let mut report = self.profile.compare(&window.samples, &self.config)?;
            report.window = Some(WindowInfo {
                index,
                label: window.label,
                sample_count: window.samples.len(),
            });
            debug!(
                window = index,
                samples = window.samples.len(),
                global_drift = report.global_drift,
                drift_fraction = report.drift_fraction,
                "window processed"
            );
            reports.push(report);
        }

        let mut history = self.history.clone();
        for report in &reports {
            history.record(report);
        }
        if let Some(store) = &self.persistence {
            store.save(&history.entries())?;
        }
        self.history = history;

        Ok(TemporalDriftReport {
            windows: reports,
            history: self.history.entries(),
        })
    }
}
