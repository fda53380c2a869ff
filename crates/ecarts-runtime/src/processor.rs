//! One-report pipeline.
//!
//! Gates on the sentinel marker, parses, analyses, compares with the
//! previous hour's snapshot, stores the new snapshot and formats the bilan.
//! Reports are handled strictly one at a time.

use chrono::{DateTime, Utc};
use ecarts_core::categories::CategoryConfig;
use ecarts_core::error::Result;
use ecarts_core::formatting::{format_bilan, format_history};
use ecarts_core::models::{CategoryIds, Comparison, GapReport, ParsedReport, Snapshot};
use ecarts_core::time_utils::{day_key, day_label, hour_key, hour_label, Clock};
use ecarts_data::analyzer::GapAnalyzer;
use ecarts_data::parser::ReportParser;
use ecarts_data::store::SnapshotStore;

/// Default number of consecutive rejections before warning about format drift.
pub const DEFAULT_REJECTION_ALERT: u32 = 3;

// ── Public types ──────────────────────────────────────────────────────────────

/// A published gap summary.
#[derive(Debug, Clone)]
pub struct Bilan {
    pub day_key: String,
    pub hour_key: String,
    pub total_games: u64,
    pub report: GapReport,
    /// `None` when no earlier snapshot exists for the day.
    pub comparison: Option<Comparison>,
    /// Formatted message ready for delivery.
    pub message: String,
}

/// What happened to one incoming message.
#[derive(Debug, Clone)]
pub enum ProcessOutcome {
    /// No sentinel marker: not a statistics report.
    Ignored,
    /// A statistics report missing essential categories.
    Rejected { consecutive: u32 },
    Published(Bilan),
}

// ── ReportProcessor ───────────────────────────────────────────────────────────

pub struct ReportProcessor {
    parser: ReportParser,
    analyzer: GapAnalyzer,
    store: Box<dyn SnapshotStore + Send>,
    clock: Clock,
    rejection_alert: u32,
    consecutive_rejections: u32,
}

impl ReportProcessor {
    /// Create a processor.
    ///
    /// `rejection_alert` is the number of consecutive rejected reports after
    /// which a format-drift warning is logged (values below 1 are treated as 1).
    pub fn new(
        config: CategoryConfig,
        store: Box<dyn SnapshotStore + Send>,
        clock: Clock,
        rejection_alert: u32,
    ) -> Self {
        Self {
            parser: ReportParser::new(config.clone()),
            analyzer: GapAnalyzer::new(config),
            store,
            clock,
            rejection_alert: rejection_alert.max(1),
            consecutive_rejections: 0,
        }
    }

    pub fn config(&self) -> &CategoryConfig {
        self.parser.config()
    }

    pub fn store(&self) -> &dyn SnapshotStore {
        self.store.as_ref()
    }

    pub fn consecutive_rejections(&self) -> u32 {
        self.consecutive_rejections
    }

    /// Process `text` received now.
    pub fn process(&mut self, text: &str) -> Result<ProcessOutcome> {
        self.process_at(text, Utc::now())
    }

    /// Process `text` as if received at `now`.
    pub fn process_at(&mut self, text: &str, now: DateTime<Utc>) -> Result<ProcessOutcome> {
        if !self.parser.has_sentinel(text) {
            tracing::debug!("message ignored: no sentinel marker");
            return Ok(ProcessOutcome::Ignored);
        }

        let Some(parsed) = self.parser.parse(text) else {
            return Ok(self.record_rejection());
        };
        self.consecutive_rejections = 0;

        let local = self.clock.to_local(now);
        let day = day_key(local, self.config().day_rollover_hour);
        let hour = hour_key(local);

        let report = self.analyzer.analyze(&parsed);
        let previous = self.store.previous_snapshot(&day, &hour);
        let comparison = self.analyzer.compare(&report, previous.as_ref());

        self.store
            .save_snapshot(&day, &hour, &Snapshot::from_report(&report, now))?;

        let message = format_bilan(
            &report,
            parsed.total_games,
            &hour_label(local),
            &day_label(&day),
            comparison.as_ref(),
        );

        tracing::info!(
            day = %day,
            hour = %hour,
            categories = report.len(),
            compared = comparison.is_some(),
            "bilan published"
        );

        Ok(ProcessOutcome::Published(Bilan {
            day_key: day,
            hour_key: hour,
            total_games: parsed.total_games,
            report,
            comparison,
            message,
        }))
    }

    /// Formatted history for `day`, or for the current day when `None`.
    pub fn history(&self, day: Option<&str>) -> String {
        self.history_at(day, Utc::now())
    }

    pub fn history_at(&self, day: Option<&str>, now: DateTime<Utc>) -> String {
        let day = match day {
            Some(d) => d.to_string(),
            None => day_key(self.clock.to_local(now), self.config().day_rollover_hour),
        };
        let entries = self.store.day_history(&day);
        format_history(&day_label(&day), &entries, self.config())
    }

    /// Analyse and format the built-in sample report without storing it.
    pub fn sample_bilan(&self, now: DateTime<Utc>) -> String {
        let parsed = sample_report();
        let report = self.analyzer.analyze(&parsed);
        let local = self.clock.to_local(now);
        let day = day_key(local, self.config().day_rollover_hour);
        format_bilan(
            &report,
            parsed.total_games,
            &hour_label(local),
            &day_label(&day),
            None,
        )
    }

    fn record_rejection(&mut self) -> ProcessOutcome {
        self.consecutive_rejections += 1;
        if self.consecutive_rejections % self.rejection_alert == 0 {
            tracing::warn!(
                consecutive = self.consecutive_rejections,
                "repeated reports missing essential categories; the upstream format \
                 may have changed and category patterns may need updating"
            );
        }
        ProcessOutcome::Rejected {
            consecutive: self.consecutive_rejections,
        }
    }
}

// ── Sample data ───────────────────────────────────────────────────────────────

/// A 60-game report covering the nine default categories.
pub fn sample_report() -> ParsedReport {
    let categories: [(&str, &[i64]); 9] = [
        ("3/2", &[1330, 1342, 1352, 1361, 1366, 1370, 1374, 1375]),
        (
            "3/3",
            &[
                1322, 1323, 1325, 1329, 1332, 1335, 1337, 1338, 1340, 1349, 1350, 1351, 1353, 1354,
                1355, 1356, 1357, 1358, 1359, 1362, 1363, 1369, 1372, 1377, 1378, 1379,
            ],
        ),
        (
            "2/2",
            &[
                1321, 1324, 1326, 1327, 1328, 1331, 1336, 1339, 1341, 1345, 1346, 1348, 1367, 1368,
                1373, 1376, 1380,
            ],
        ),
        ("2/3", &[1333, 1334, 1343, 1344, 1347, 1360, 1364, 1365, 1371]),
        (
            "Victoire Joueur",
            &[
                1322, 1330, 1333, 1335, 1336, 1339, 1341, 1343, 1344, 1345, 1347, 1349, 1351, 1355,
                1358, 1362, 1363, 1364, 1367, 1369, 1371, 1373, 1375, 1377, 1378, 1379, 1380,
            ],
        ),
        (
            "Victoire Banquier",
            &[
                1321, 1323, 1325, 1326, 1327, 1328, 1329, 1331, 1334, 1337, 1338, 1340, 1342, 1346,
                1348, 1350, 1352, 1353, 1356, 1357, 1359, 1360, 1361, 1365, 1366, 1370, 1374, 1376,
            ],
        ),
        ("Match Nul", &[1324, 1332, 1354, 1368, 1372]),
        (
            "Pair",
            &[
                1321, 1323, 1324, 1326, 1327, 1331, 1332, 1334, 1335, 1337, 1338, 1340, 1341, 1344,
                1348, 1349, 1350, 1353, 1354, 1357, 1359, 1362, 1365, 1367, 1368, 1369, 1370, 1372,
                1376, 1377, 1378,
            ],
        ),
        (
            "Impair",
            &[
                1322, 1325, 1328, 1329, 1330, 1333, 1336, 1339, 1342, 1343, 1345, 1346, 1347, 1351,
                1352, 1355, 1356, 1358, 1360, 1361, 1363, 1364, 1366, 1371, 1373, 1374, 1375, 1379,
                1380,
            ],
        ),
    ];

    ParsedReport {
        total_games: 60,
        categories: categories
            .iter()
            .map(|(name, ids)| CategoryIds {
                name: name.to_string(),
                ids: ids.to_vec(),
            })
            .collect(),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
