//! Assembles the components from one [`VigilConfig`].

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use vigil_detect::{
    AnomalyEnsemble, Detector, DetectorParams, DetectorRegistry, DetectResult, EnsembleOutcome,
    IqrDetector, SampleSet, ScoredDetector, ZScoreDetector,
};
use vigil_drift::{DriftMonitor, JsonFileHistory};
use vigil_eval::ClassificationMetrics;
use vigil_registry::{ArtifactCodec, ModelRegistry};

use crate::config::VigilConfig;
use crate::error::VigilResult;

/// Configured detectors plus factories for the stateful components.
#[derive(Clone, Debug)]
pub struct Engine {
    config: VigilConfig,
    detectors: DetectorRegistry,
}

impl Engine {
    /// Validate `config` and register the built-in detectors with its settings.
    pub fn new(config: VigilConfig) -> VigilResult<Self> {
        config.validate()?;
        let detectors = DetectorRegistry::with_builtin_settings(
            ZScoreDetector::new(config.detectors.z_threshold),
            IqrDetector::new(config.detectors.iqr_multiplier),
        );
        debug!(detectors = ?detectors.names(), "engine assembled");
        Ok(Self { config, detectors })
    }

    /// Configuration the engine was built from.
    pub fn config(&self) -> &VigilConfig {
        &self.config
    }

    /// Registered detectors.
    pub fn detectors(&self) -> &DetectorRegistry {
        &self.detectors
    }

    /// Register an additional detector, replacing one of the same name.
    pub fn register_detector<D: Detector + 'static>(&mut self, detector: D) {
        let name = detector.name().to_string();
        if self.detectors.register(detector).is_some() {
            info!(detector = %name, "detector replaced");
        }
    }

    /// Register an external model scorer under `name`, cut at the configured
    /// contamination.
    pub fn register_scorer<F>(&mut self, name: &str, scorer: F)
    where
        F: Fn(&SampleSet, &DetectorParams) -> DetectResult<Vec<Option<f64>>>
            + Send
            + Sync
            + 'static,
    {
        let detector =
            ScoredDetector::new(name, scorer).with_contamination(self.config.detectors.contamination);
        self.detectors.register_shared(Arc::new(detector));
    }

    /// Ensemble over the registered detectors with the configured weights.
    pub fn ensemble(&self) -> VigilResult<AnomalyEnsemble> {
        Ok(AnomalyEnsemble::new(
            self.detectors.clone(),
            self.config.ensemble.clone(),
        )?)
    }

    /// Ensemble decision for one feature.
    pub fn detect(&self, samples: &SampleSet, feature: &str) -> VigilResult<EnsembleOutcome> {
        self.detect_with(samples, &DetectorParams::for_feature(feature))
    }

    /// Run the ensemble with explicit detector parameters.
    pub fn detect_with(
        &self,
        samples: &SampleSet,
        params: &DetectorParams,
    ) -> VigilResult<EnsembleOutcome> {
        Ok(self.ensemble()?.evaluate(samples, params)?)
    }

    /// Score the ensemble against known labels.
    ///
    /// Samples without a probability count as normal with score 0.
    pub fn evaluate_detection(
        &self,
        samples: &SampleSet,
        params: &DetectorParams,
        truth: &[bool],
    ) -> VigilResult<ClassificationMetrics> {
        let outcome = self.detect_with(samples, params)?;
        let scores: Vec<f64> = outcome
            .verdict
            .probabilities
            .iter()
            .map(|p| p.unwrap_or(0.0))
            .collect();
        Ok(ClassificationMetrics::compute(
            truth,
            &outcome.verdict.flags,
            Some(&scores),
        )?)
    }

    /// Drift monitor over `reference`, persisting history when configured.
    pub fn drift_monitor(&self, reference: SampleSet) -> VigilResult<DriftMonitor> {
        let monitor = DriftMonitor::new(reference, self.config.drift.clone())?;
        match self.config.registry.drift_history_path() {
            Some(path) => {
                debug!(path = %path.display(), "drift history persisted to file");
                Ok(monitor.with_persistence(Box::new(JsonFileHistory::new(path)))?)
            }
            None => Ok(monitor),
        }
    }

    /// Model registry rooted at the configured base directory.
    pub fn model_registry<C: ArtifactCodec>(&self, codec: C) -> VigilResult<ModelRegistry<C>> {
        self.model_registry_at(&self.config.registry.base_dir, codec)
    }

    /// Open a model registry rooted at `base`.
    pub fn model_registry_at<C: ArtifactCodec>(
        &self,
        base: &Path,
        codec: C,
    ) -> VigilResult<ModelRegistry<C>> {
        Ok(ModelRegistry::open(base, codec)?)
    }
}
