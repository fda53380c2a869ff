use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use ecarts_core::error::{EcartsError, Result};
use ecarts_core::models::Snapshot;
use tracing::{debug, warn};

use super::{HistoryDocument, SnapshotStore};

/// Snapshot store backed by a single JSON file.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    document: HistoryDocument,
}

impl JsonFileStore {
    /// Open the store at `path`.
    ///
    /// A missing file starts an empty history. A file that cannot be read or
    /// parsed is logged and also starts empty; it is overwritten on the next
    /// save.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let document = Self::load_document(&path);
        Self { path, document }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load_document(path: &Path) -> HistoryDocument {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("no history file at {}; starting empty", path.display());
                return HistoryDocument::default();
            }
            Err(e) => {
                warn!("Failed to read history file {}: {}", path.display(), e);
                return HistoryDocument::default();
            }
        };

        match serde_json::from_str(&content) {
            Ok(doc) => doc,
            Err(e) => {
                warn!("Failed to parse history file {}: {}", path.display(), e);
                HistoryDocument::default()
            }
        }
    }

    /// Atomically write `document`, creating parent directories if needed.
    fn persist(&self, document: &HistoryDocument) -> Result<()> {
        let write_err = |source| EcartsError::FileWrite {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(write_err)?;
            }
        }

        let json = serde_json::to_string_pretty(document)?;

        // Write to a temp file then rename for atomicity.
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, &json).map_err(write_err)?;
        std::fs::rename(&tmp, &self.path).map_err(write_err)?;

        debug!("history saved to {}", self.path.display());
        Ok(())
    }
}

impl SnapshotStore for JsonFileStore {
    fn save_snapshot(&mut self, day: &str, hour: &str, snapshot: &Snapshot) -> Result<()> {
        // Only commit to memory once the file holds the new snapshot.
        let mut updated = self.document.clone();
        updated.insert(day, hour, snapshot)?;
        self.persist(&updated)?;
        self.document = updated;
        Ok(())
    }

    fn snapshot(&self, day: &str, hour: &str) -> Option<Snapshot> {
        self.document.get(day, hour)
    }

    fn hour_keys(&self, day: &str) -> Vec<String> {
        self.document.hour_keys(day)
    }

    fn days(&self) -> Vec<String> {
        self.document.days()
    }

    fn last_analysis(&self) -> Option<DateTime<Utc>> {
        self.document.config.last_analysis
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use ecarts_core::models::SnapshotGaps;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    const DAY: &str = "Journée_20240115";

    fn snapshot(hour: u32, max_gap: i64) -> Snapshot {
        let mut gaps = BTreeMap::new();
        gaps.insert(
            "Pair".to_string(),
            SnapshotGaps {
                max_gap,
                gaps: vec![1, max_gap],
            },
        );
        Snapshot {
            timestamp: Utc.with_ymd_and_hms(2024, 1, 15, hour, 0, 0).unwrap(),
            gaps,
        }
    }

    #[test]
    fn test_open_missing_file_is_empty() {
        let tmp = TempDir::new().expect("tempdir");
        let store = JsonFileStore::open(tmp.path().join("ecarts_data.json"));
        assert!(store.days().is_empty());
        assert!(store.last_analysis().is_none());
    }

    #[test]
    fn test_open_corrupt_file_is_empty() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp.path().join("ecarts_data.json");
        std::fs::write(&path, "{not json").unwrap();
        let store = JsonFileStore::open(&path);
        assert!(store.days().is_empty());
    }

    #[test]
    fn test_save_persists_and_reloads() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp.path().join("nested").join("ecarts_data.json");

        let mut store = JsonFileStore::open(&path);
        store.save_snapshot(DAY, "14:00", &snapshot(14, 5)).expect("save");
        assert!(path.exists());
        assert!(!path.with_extension("json.tmp").exists());

        let reopened = JsonFileStore::open(&path);
        assert_eq!(reopened.snapshot(DAY, "14:00"), Some(snapshot(14, 5)));
        assert_eq!(reopened.last_analysis(), Some(snapshot(14, 5).timestamp));
    }

    #[test]
    fn test_previous_for_unstored_hour() {
        let tmp = TempDir::new().expect("tempdir");
        let mut store = JsonFileStore::open(tmp.path().join("ecarts_data.json"));
        store.save_snapshot(DAY, "14:00", &snapshot(14, 5)).unwrap();

        assert_eq!(store.previous_snapshot(DAY, "15:00"), Some(snapshot(14, 5)));
        assert!(store.previous_snapshot(DAY, "14:00").is_none());
    }

    #[test]
    fn test_document_layout() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp.path().join("ecarts_data.json");
        let mut store = JsonFileStore::open(&path);
        store.save_snapshot(DAY, "09:00", &snapshot(9, 4)).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["historique"][DAY]["09:00"]["gaps"]["Pair"]["max_gap"], 4);
        assert!(raw["config"]["last_analysis"].is_string());
    }

    #[test]
    fn test_unknown_config_keys_survive_rewrite() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp.path().join("ecarts_data.json");
        std::fs::write(
            &path,
            r#"{"historique": {}, "config": {"dest_channel": -100123, "last_analysis": null}}"#,
        )
        .unwrap();

        let mut store = JsonFileStore::open(&path);
        store.save_snapshot(DAY, "10:00", &snapshot(10, 2)).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["config"]["dest_channel"], -100123);
    }

    #[test]
    fn test_failed_write_leaves_memory_unchanged() {
        let tmp = TempDir::new().expect("tempdir");
        let blocker = tmp.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();
        // Parent "directory" is a regular file, so the write cannot succeed.
        let mut store = JsonFileStore::open(blocker.join("ecarts_data.json"));

        let err = store.save_snapshot(DAY, "14:00", &snapshot(14, 5)).unwrap_err();
        assert!(matches!(err, EcartsError::FileWrite { .. }));
        assert!(store.snapshot(DAY, "14:00").is_none());
        assert!(store.previous_snapshot(DAY, "15:00").is_none());
        assert!(store.last_analysis().is_none());
    }

    #[test]
    fn test_save_rejects_bad_hour_key() {
        let tmp = TempDir::new().expect("tempdir");
        let mut store = JsonFileStore::open(tmp.path().join("ecarts_data.json"));
        let err = store.save_snapshot(DAY, "9:00", &snapshot(9, 1)).unwrap_err();
        assert!(matches!(err, EcartsError::InvalidHourKey(_)));
    }
}
