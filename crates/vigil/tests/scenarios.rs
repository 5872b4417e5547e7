//! End-to-end scenarios across detection, drift, evaluation and registry.

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

use vigil::detect::{DetectorParams, EnsembleConfig, SampleSet, UnavailableDetector};
use vigil::drift::TimeWindow;
use vigil::eval::{summarize_folds, TimeSeriesSplit};
use vigil::registry::{BytesCodec, JsonCodec, ManualClock, ModelRegistry, RegistryError};
use vigil::{Engine, VigilConfig, VigilError};

fn gaussian(seed: u64, n: usize, mu: f64, sigma: f64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let dist = Normal::new(mu, sigma).unwrap();
    (0..n).map(|_| dist.sample(&mut rng)).collect()
}

fn engine_in(dir: &std::path::Path) -> Engine {
    let mut config = VigilConfig::default();
    config.registry.base_dir = dir.join("models");
    Engine::new(config).unwrap()
}

#[test]
fn temperature_mean_shift_is_reported() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let engine = engine_in(dir.path());
    let reference = SampleSet::new().with_feature("temperature", gaussian(11, 1000, 0.0, 1.0))?;
    let current = SampleSet::new().with_feature("temperature", gaussian(12, 1000, 0.5, 1.0))?;

    let monitor = engine.drift_monitor(reference)?;
    let report = monitor.compare(&current)?;
    let temperature = report.feature("temperature").expect("feature reported");

    assert!(temperature.drift_detected);
    assert!(temperature.moments.as_ref().expect("moments ran").drift_detected);
    assert!(temperature.hypothesis.as_ref().expect("test ran").p_value < 0.05);
    assert!(report.global_drift);
    Ok(())
}

#[test]
fn unavailable_detector_weight_is_renormalised_away() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let mut config = VigilConfig::default();
    config.registry.base_dir = dir.path().to_path_buf();
    config.ensemble = EnsembleConfig::new([("model_a", 0.6), ("model_b", 0.4)]);
    let mut engine = Engine::new(config)?;
    engine.register_scorer("model_a", |samples, params| {
        Ok(samples
            .feature(&params.feature)?
            .values
            .iter()
            .map(|v| v.map(f64::abs))
            .collect())
    });
    engine.register_detector(UnavailableDetector::new("model_b", "serving endpoint down"));

    let samples = SampleSet::new().with_feature("vibration", vec![1.0, 2.0, 3.0, 4.0, 100.0])?;
    let outcome = engine.detect(&samples, "vibration")?;

    assert_eq!(outcome.used, vec!["model_a".to_string()]);
    assert_eq!(outcome.skipped.len(), 1);
    assert_eq!(outcome.verdict.weights_used["model_a"], 1.0);
    for (i, v) in [1.0, 2.0, 3.0, 4.0, 100.0].iter().enumerate() {
        let expected = (v - 1.0) / 99.0;
        let p = outcome.verdict.probabilities[i].expect("scored");
        assert!((p - expected).abs() < 1e-12, "sample {i}: {p} vs {expected}");
    }
    assert_eq!(outcome.verdict.anomaly_indices(), vec![4]);
    Ok(())
}

#[test]
fn all_detectors_unavailable_is_an_error() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let mut config = VigilConfig::default();
    config.registry.base_dir = dir.path().to_path_buf();
    config.ensemble = EnsembleConfig::new([("model_b", 1.0)]);
    let mut engine = Engine::new(config)?;
    engine.register_detector(UnavailableDetector::new("model_b", "not trained"));

    let samples = SampleSet::new().with_feature("vibration", vec![1.0, 2.0, 3.0])?;
    let err = engine.detect(&samples, "vibration").unwrap_err();
    assert!(matches!(
        err,
        VigilError::Detect(vigil::detect::DetectError::NoDetectorsAvailable { ref skipped, .. })
            if skipped.len() == 1
    ));
    Ok(())
}

#[test]
fn registry_current_pointer_lifecycle() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 6, 1, 8, 30, 0).unwrap()));
    let registry = engine_in(dir.path())
        .model_registry(BytesCodec)?
        .with_clock(clock.clone());

    let first = registry.save(&b"artifact-1".to_vec(), "rf", None, None)?;
    assert_eq!(registry.current_id()?, Some(first.clone()));

    clock.advance(Duration::seconds(1));
    let second = registry.save(&b"artifact-2".to_vec(), "rf", None, None)?;
    assert_ne!(first, second);
    assert_eq!(registry.current_id()?, Some(first));
    assert_eq!(registry.load(None)?, b"artifact-1".to_vec());

    registry.set_current(&second)?;
    assert_eq!(registry.load(None)?, b"artifact-2".to_vec());
    registry.set_current(&second)?;
    assert_eq!(registry.load(None)?, b"artifact-2".to_vec());

    assert!(matches!(
        registry.load(Some("rf_19990101_000000")),
        Err(RegistryError::VersionNotFound(_))
    ));
    Ok(())
}

#[test]
fn fold_metrics_are_stored_with_the_ensemble_version() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let engine = engine_in(dir.path());

    let spikes = [40, 70, 100, 115];
    let values: Vec<f64> = (0..120)
        .map(|i| {
            if spikes.contains(&i) {
                60.0
            } else {
                10.0 + (i % 5) as f64 * 0.1
            }
        })
        .collect();
    let truth: Vec<bool> = (0..120).map(|i| spikes.contains(&i)).collect();
    let samples = SampleSet::new().with_feature("pressure", values)?;
    let params = DetectorParams::for_feature("pressure");

    let mut per_fold = Vec::new();
    for fold in TimeSeriesSplit::new(3).split(samples.len())? {
        let test = samples.slice(fold.test.clone())?;
        let metrics = engine.evaluate_detection(&test, &params, &truth[fold.test.clone()])?;
        per_fold.push(metrics.to_metric_map());
    }
    let summary = summarize_folds(&per_fold)?;
    assert_eq!(summary["f1_mean"], serde_json::Value::from(1.0));
    assert_eq!(summary["f1_std"], serde_json::Value::from(0.0));

    let registry = engine.model_registry(JsonCodec::<EnsembleConfig>::new())?;
    let id = registry.save(
        &engine.config().ensemble,
        "ensemble",
        Some(summary.clone()),
        None,
    )?;
    let version = registry.get_version(&id)?;
    assert_eq!(version.record.metrics, Some(summary));
    assert_eq!(registry.load(None)?, engine.config().ensemble);
    Ok(())
}

#[test]
fn shifted_windows_are_flagged_and_recorded() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let mut config = VigilConfig::default();
    config.registry.base_dir = dir.path().to_path_buf();
    config.registry.drift_history = Some("history.json".into());
    let engine = Engine::new(config)?;

    let reference = SampleSet::new().with_feature("temperature", gaussian(21, 300, 20.0, 1.0))?;
    let mut series = gaussian(22, 200, 20.0, 1.0);
    series.extend(gaussian(23, 200, 23.0, 1.0));
    let current = SampleSet::new().with_feature("temperature", series)?;

    let start = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
    let windows: Vec<TimeWindow> = current
        .windows(100)?
        .into_iter()
        .enumerate()
        .map(|(i, w)| TimeWindow::labelled(start + Duration::hours(i as i64), w))
        .collect();

    let mut monitor = engine.drift_monitor(reference.clone())?;
    let temporal = monitor.monitor_windows(&windows)?;
    assert_eq!(temporal.windows.len(), 4);
    assert!(temporal.windows[2].global_drift);
    assert!(temporal.windows[3].global_drift);
    assert_eq!(monitor.history().len(), 4);

    // A fresh monitor picks the stored history back up.
    let restored = engine.drift_monitor(reference)?;
    assert_eq!(restored.history().len(), 4);
    assert_eq!(
        restored.history().iter().last().and_then(|e| e.label),
        Some(start + Duration::hours(3))
    );
    Ok(())
}
