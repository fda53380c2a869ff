//! Snapshot storage.
//!
//! Gap snapshots are filed by day key (`Journée_YYYYMMDD`) and hour key
//! (`HH:00`). Hour keys are zero-padded so lexicographic order is
//! chronological; "previous" always means the greatest stored hour key
//! strictly below the one asked for.
//!
//! - [`json_file::JsonFileStore`]: one JSON document on disk, rewritten
//!   atomically on every save.
//! - [`memory::MemoryStore`]: no persistence, for tests.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use ecarts_core::error::Result;
use ecarts_core::models::Snapshot;
use ecarts_core::time_utils::{validate_day_key, validate_hour_key};
use serde::{Deserialize, Serialize};

pub mod json_file;
pub mod memory;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;

/// Key-value store of snapshots addressed by day and hour.
pub trait SnapshotStore {
    /// Store `snapshot` under (`day`, `hour`), replacing any existing entry.
    fn save_snapshot(&mut self, day: &str, hour: &str, snapshot: &Snapshot) -> Result<()>;

    fn snapshot(&self, day: &str, hour: &str) -> Option<Snapshot>;

    /// Hour keys stored for `day`, in order.
    fn hour_keys(&self, day: &str) -> Vec<String>;

    /// All day keys with stored data, in order.
    fn days(&self) -> Vec<String>;

    /// Timestamp of the most recent save.
    fn last_analysis(&self) -> Option<DateTime<Utc>>;

    /// Most recent snapshot of `day` with its hour key.
    fn latest_snapshot(&self, day: &str) -> Option<(String, Snapshot)> {
        let hour = self.hour_keys(day).pop()?;
        let snapshot = self.snapshot(day, &hour)?;
        Some((hour, snapshot))
    }

    /// Snapshot immediately preceding `hour` within `day`.
    ///
    /// `hour` itself does not need to be stored.
    fn previous_snapshot(&self, day: &str, hour: &str) -> Option<Snapshot> {
        let previous = self
            .hour_keys(day)
            .into_iter()
            .filter(|key| key.as_str() < hour)
            .next_back()?;
        self.snapshot(day, &previous)
    }

    /// Every snapshot of `day` in hour order.
    fn day_history(&self, day: &str) -> Vec<(String, Snapshot)> {
        self.hour_keys(day)
            .into_iter()
            .filter_map(|hour| self.snapshot(day, &hour).map(|s| (hour, s)))
            .collect()
    }
}

// ── Shared document ───────────────────────────────────────────────────────────

/// Bookkeeping kept next to the snapshots.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreMeta {
    #[serde(default)]
    pub last_analysis: Option<DateTime<Utc>>,
    /// Unrecognised keys, kept so rewriting a file does not drop them.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// The full storage document: `{ "historique": {...}, "config": {...} }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryDocument {
    #[serde(default)]
    pub historique: BTreeMap<String, BTreeMap<String, Snapshot>>,
    #[serde(default)]
    pub config: StoreMeta,
}

impl HistoryDocument {
    pub(crate) fn insert(&mut self, day: &str, hour: &str, snapshot: &Snapshot) -> Result<()> {
        validate_day_key(day)?;
        validate_hour_key(hour)?;
        self.historique
            .entry(day.to_string())
            .or_default()
            .insert(hour.to_string(), snapshot.clone());
        self.config.last_analysis = Some(snapshot.timestamp);
        Ok(())
    }

    pub(crate) fn get(&self, day: &str, hour: &str) -> Option<Snapshot> {
        self.historique.get(day)?.get(hour).cloned()
    }

    pub(crate) fn hour_keys(&self, day: &str) -> Vec<String> {
        self.historique
            .get(day)
            .map(|hours| hours.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub(crate) fn days(&self) -> Vec<String> {
        self.historique.keys().cloned().collect()
    }
}
