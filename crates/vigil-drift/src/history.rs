//! Bounded drift history and its persistence.
//!
//! The history is append-only: entries are never edited, and once the ring
//! is full the oldest entry is evicted. `HistoryPersistence` lets the
//! history survive restarts; writes to `JsonFileHistory` are atomic
//! (write to `.tmp`, then rename).

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DriftError, DriftResult};
use crate::report::DriftReport;

/// Summary of one monitored window.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DriftHistoryEntry {
    /// Monotonic across the life of a history, including restored entries.
    pub sequence: u64,
    pub label: Option<DateTime<Utc>>,
    pub recorded_at: DateTime<Utc>,
    pub global_drift: bool,
    pub drift_fraction: f64,
    pub drifted_features: Vec<String>,
    pub projection_distance: Option<f64>,
}

/// One point of the drift-fraction series.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub sequence: u64,
    pub label: Option<DateTime<Utc>>,
    pub drift_fraction: f64,
    pub global_drift: bool,
}

/// Bounded, append-only log of window summaries; oldest entries fall off.
#[derive(Clone, Debug, PartialEq)]
pub struct DriftHistory {
    entries: VecDeque<DriftHistoryEntry>,
    capacity: usize,
    next_sequence: u64,
}

impl DriftHistory {
    /// An empty history holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            next_sequence: 0,
        }
    }

    /// Rebuild from persisted entries, keeping the most recent `capacity`.
    pub fn restore(capacity: usize, entries: Vec<DriftHistoryEntry>) -> Self {
        let mut history = Self::new(capacity);
        history.next_sequence = entries.iter().map(|e| e.sequence + 1).max().unwrap_or(0);
        let skip = entries.len().saturating_sub(history.capacity);
        history.entries.extend(entries.into_iter().skip(skip));
        history
    }

    /// Append a summary of `report`, evicting the oldest entry when full.
    pub fn record(&mut self, report: &DriftReport) -> &DriftHistoryEntry {
        let entry = DriftHistoryEntry {
            sequence: self.next_sequence,
            label: report.window.as_ref().and_then(|w| w.label),
            recorded_at: Utc::now(),
            global_drift: report.global_drift,
            drift_fraction: report.drift_fraction,
            drifted_features: report
                .drifted_feature_names()
                .into_iter()
                .map(str::to_string)
                .collect(),
            projection_distance: report.projection.as_ref().map(|p| p.distance),
        };
        self.next_sequence += 1;
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
        // Just pushed, so never empty.
        &self.entries[self.entries.len() - 1]
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &DriftHistoryEntry> {
        self.entries.iter()
    }

    /// Entries, oldest first.
    pub fn entries(&self) -> Vec<DriftHistoryEntry> {
        self.entries.iter().cloned().collect()
    }

    /// Number of retained entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drift-fraction series for plotting collaborators.
    pub fn trend(&self) -> Vec<TrendPoint> {
        self.entries
            .iter()
            .map(|e| TrendPoint {
                sequence: e.sequence,
                label: e.label,
                drift_fraction: e.drift_fraction,
                global_drift: e.global_drift,
            })
            .collect()
    }
}

// ── Persistence ─────────────────────────────────────────────────────────

/// Storage for drift history across restarts.
pub trait HistoryPersistence: Send + Sync {
    /// Replace the stored history.
    fn save(&self, entries: &[DriftHistoryEntry]) -> DriftResult<()>;

    /// Stored history, oldest first. Empty when nothing was saved yet.
    fn load(&self) -> DriftResult<Vec<DriftHistoryEntry>>;
}

/// History stored as one JSON document.
pub struct JsonFileHistory {
    path: PathBuf,
}

impl JsonFileHistory {
    /// History stored as JSON at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HistoryPersistence for JsonFileHistory {
    fn save(&self, entries: &[DriftHistoryEntry]) -> DriftResult<()> {
        let json = serde_json::to_string_pretty(entries)?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let tmp_path = self.path.with_extension("tmp");
        std::fs::write(&tmp_path, json)?;
        std::fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }

    fn load(&self) -> DriftResult<Vec<DriftHistoryEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let contents = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&contents)?)
    }
}

/// In-memory history store (for testing).
#[derive(Default)]
pub struct InMemoryHistory {
    data: Mutex<Vec<DriftHistoryEntry>>,
}

impl InMemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HistoryPersistence for InMemoryHistory {
    fn save(&self, entries: &[DriftHistoryEntry]) -> DriftResult<()> {
        let mut data = self.data.lock().map_err(|_| DriftError::LockError)?;
        *data = entries.to_vec();
        Ok(())
    }

    fn load(&self) -> DriftResult<Vec<DriftHistoryEntry>> {
        let data = self.data.lock().map_err(|_| DriftError::LockError)?;
        Ok(data.clone())
    }
}
