use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The ordered ID sequence extracted for one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryIds {
    /// Category name, as configured.
    pub name: String,
    /// IDs in the order they appeared in the report.
    pub ids: Vec<i64>,
}

/// Structured result of parsing one statistics report.
///
/// Only produced for accepted reports; every essential category is present.
/// Categories keep configuration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedReport {
    /// Value of the "Total jeux analysés" line, or 0 when absent.
    pub total_games: u64,
    pub categories: Vec<CategoryIds>,
}

impl ParsedReport {
    /// IDs for `name`, or `None` when the category was not found.
    pub fn get(&self, name: &str) -> Option<&[i64]> {
        self.categories
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.ids.as_slice())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.categories.iter().any(|c| c.name == name)
    }

    /// Names of all categories present, in order.
    pub fn category_names(&self) -> Vec<&str> {
        self.categories.iter().map(|c| c.name.as_str()).collect()
    }
}

/// Gap statistics for one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryGaps {
    pub name: String,
    /// Display glyph from the category configuration.
    pub glyph: String,
    pub ids: Vec<i64>,
    pub count: usize,
    /// `ids[i + 1] - ids[i]` for every consecutive pair.
    pub gaps: Vec<i64>,
    /// Largest entry of `gaps`, or 0 when `gaps` is empty.
    pub max_gap: i64,
}

/// Per-category gap statistics derived from a [`ParsedReport`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GapReport {
    pub entries: Vec<CategoryGaps>,
}

impl GapReport {
    pub fn get(&self, name: &str) -> Option<&CategoryGaps> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CategoryGaps> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ── Snapshot ──────────────────────────────────────────────────────────────────

/// Stored gap data for one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotGaps {
    pub max_gap: i64,
    #[serde(default)]
    pub gaps: Vec<i64>,
}

/// Point-in-time capture of a [`GapReport`], stored under a day and hour key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// When the snapshot was taken (UTC).
    pub timestamp: DateTime<Utc>,
    /// Category name → gap data. Empty when the stored entry carried none.
    #[serde(default)]
    pub gaps: BTreeMap<String, SnapshotGaps>,
}

impl Snapshot {
    /// Capture `report` at `timestamp`.
    pub fn from_report(report: &GapReport, timestamp: DateTime<Utc>) -> Self {
        let gaps = report
            .iter()
            .map(|entry| {
                (
                    entry.name.clone(),
                    SnapshotGaps {
                        max_gap: entry.max_gap,
                        gaps: entry.gaps.clone(),
                    },
                )
            })
            .collect();
        Self { timestamp, gaps }
    }

    pub fn has_gap_data(&self) -> bool {
        !self.gaps.is_empty()
    }
}

// ── Comparison ────────────────────────────────────────────────────────────────

/// Direction of a category's max gap relative to the previous snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Same,
    Increased,
    Decreased,
}

impl Trend {
    /// Classify `current` against `previous`.
    pub fn classify(previous: i64, current: i64) -> Self {
        match current.cmp(&previous) {
            std::cmp::Ordering::Equal => Trend::Same,
            std::cmp::Ordering::Greater => Trend::Increased,
            std::cmp::Ordering::Less => Trend::Decreased,
        }
    }

    /// Glyph used in formatted messages.
    pub fn symbol(&self) -> &'static str {
        match self {
            Trend::Same => "🟰",
            Trend::Increased => "📈",
            Trend::Decreased => "📉",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryComparison {
    pub category: String,
    pub previous_max: i64,
    pub current_max: i64,
    pub trend: Trend,
}

/// Hour-over-hour comparison for the categories present on both sides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comparison {
    pub entries: Vec<CategoryComparison>,
}

impl Comparison {
    pub fn get(&self, category: &str) -> Option<&CategoryComparison> {
        self.entries.iter().find(|e| e.category == category)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
