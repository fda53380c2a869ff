use chrono::{DateTime, Utc};
use ecarts_core::error::Result;
use ecarts_core::models::Snapshot;

use super::{HistoryDocument, SnapshotStore};

/// In-memory snapshot store; nothing survives the process.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    document: HistoryDocument,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotStore for MemoryStore {
    fn save_snapshot(&mut self, day: &str, hour: &str, snapshot: &Snapshot) -> Result<()> {
        self.document.insert(day, hour, snapshot)
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
