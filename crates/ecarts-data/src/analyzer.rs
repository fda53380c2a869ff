//! Gap analysis over parsed reports.
//!
//! Computes consecutive differences per category and compares the result
//! against a previously stored [`Snapshot`].

use ecarts_core::categories::CategoryConfig;
use ecarts_core::models::{
    CategoryComparison, CategoryGaps, Comparison, GapReport, ParsedReport, Snapshot, Trend,
};
use tracing::debug;

// ── GapAnalyzer ───────────────────────────────────────────────────────────────

/// Derives [`GapReport`]s and hour-over-hour [`Comparison`]s.
#[derive(Debug, Clone)]
pub struct GapAnalyzer {
    config: CategoryConfig,
}

impl GapAnalyzer {
    pub fn new(config: CategoryConfig) -> Self {
        Self { config }
    }

    /// Gap statistics for every category present in `report`.
    ///
    /// IDs are taken in the order given; nothing is re-sorted. Configured
    /// categories missing from the report are not synthesised.
    pub fn analyze(&self, report: &ParsedReport) -> GapReport {
        let entries = report
            .categories
            .iter()
            .map(|category| {
                let (gaps, max_gap) = calculate_gaps(&category.ids);
                CategoryGaps {
                    name: category.name.clone(),
                    glyph: self.config.glyph(&category.name).to_string(),
                    ids: category.ids.clone(),
                    count: category.ids.len(),
                    gaps,
                    max_gap,
                }
            })
            .collect::<Vec<_>>();

        debug!(categories = entries.len(), "gap analysis complete");
        GapReport { entries }
    }

    /// Compare `current` with the previous snapshot.
    ///
    /// Returns `None` when there is no previous snapshot or it carries no gap
    /// data. Categories present on only one side are omitted.
    pub fn compare(&self, current: &GapReport, previous: Option<&Snapshot>) -> Option<Comparison> {
        let previous = previous.filter(|p| p.has_gap_data())?;

        let entries = current
            .iter()
            .filter_map(|entry| {
                let prev = previous.gaps.get(&entry.name)?;
                Some(CategoryComparison {
                    category: entry.name.clone(),
                    previous_max: prev.max_gap,
                    current_max: entry.max_gap,
                    trend: Trend::classify(prev.max_gap, entry.max_gap),
                })
            })
            .collect();

        Some(Comparison { entries })
    }
}

impl Default for GapAnalyzer {
    fn default() -> Self {
        Self::new(CategoryConfig::default())
    }
}

/// Consecutive differences `ids[i + 1] - ids[i]` and their maximum.
///
/// Sequences shorter than two yield no gaps and a maximum of 0.
pub fn calculate_gaps(ids: &[i64]) -> (Vec<i64>, i64) {
    let gaps: Vec<i64> = ids.windows(2).map(|w| w[1] - w[0]).collect();
    let max_gap = gaps.iter().copied().max().unwrap_or(0);
    (gaps, max_gap)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
