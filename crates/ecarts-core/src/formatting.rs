//! Message formatting for published gap summaries ("bilans") and history.

use crate::categories::CategoryConfig;
use crate::models::{CategoryGaps, Comparison, GapReport, Snapshot, Trend};

/// Rendered gap lists at or above this width are truncated.
const GAP_LIST_MAX_WIDTH: usize = 50;

/// Number of gaps kept when a gap list is truncated.
const GAP_LIST_TRUNCATED_LEN: usize = 10;

/// Number of categories shown in the ranking at the end of a bilan.
const TOP_GAPS_SHOWN: usize = 3;

/// Render a gap list as `[a, b, c]`, truncating long lists.
///
/// # Examples
///
/// ```
/// use ecarts_core::formatting::format_gap_list;
///
/// assert_eq!(format_gap_list(&[2, 3]), "[2, 3]");
/// assert_eq!(format_gap_list(&[]), "[]");
/// ```
pub fn format_gap_list(gaps: &[i64]) -> String {
    let full = render_list(gaps);
    if full.chars().count() < GAP_LIST_MAX_WIDTH {
        return full;
    }
    let head = &gaps[..gaps.len().min(GAP_LIST_TRUNCATED_LEN)];
    format!("{}...", render_list(head))
}

/// French label for a trend.
pub fn trend_label(trend: Trend) -> &'static str {
    match trend {
        Trend::Same => "identique",
        Trend::Increased => "en hausse",
        Trend::Decreased => "en baisse",
    }
}

/// Format the published summary for one analysed report.
///
/// Categories appear in report order, followed by a ranking of the largest
/// max gaps.
pub fn format_bilan(
    report: &GapReport,
    total_games: u64,
    hour_label: &str,
    day_label: &str,
    comparison: Option<&Comparison>,
) -> String {
    let mut message = format!(
        "💐✨ BILAN DES ÉCARTS - ANALYSE COMPLÈTE ✨💐\n\n\
         🕐 Heure d'analyse: **{}**\n\
         📊 Total jeux analysés: **{}**\n\
         📅 {}\n\n",
        hour_label, total_games, day_label
    );

    for entry in report.iter() {
        message.push_str(&format_category(entry, comparison));
        message.push('\n');
    }

    let ranking = rank_by_max_gap(report);
    if !ranking.is_empty() {
        message.push_str("🏆 TOP ÉCARTS\n");
        for (i, entry) in ranking.iter().take(TOP_GAPS_SHOWN).enumerate() {
            message.push_str(&format!(
                "{}. {} {}: {}\n",
                i + 1,
                entry.glyph,
                entry.name,
                entry.max_gap
            ));
        }
    }

    message
}

/// Format the stored snapshots of one day, one block per hour key.
///
/// Categories are listed in configuration order; names unknown to `config`
/// follow in alphabetical order without a glyph.
pub fn format_history(day_label: &str, entries: &[(String, Snapshot)], config: &CategoryConfig) -> String {
    if entries.is_empty() {
        return format!("📭 Aucune donnée pour {}\n", day_label);
    }

    let mut message = format!("📜 HISTORIQUE - {}\n", day_label);
    for (hour, snapshot) in entries {
        message.push_str(&format!("\n🕐 {}\n", hour));

        for spec in &config.categories {
            if let Some(gaps) = snapshot.gaps.get(&spec.name) {
                message.push_str(&format!(
                    "   {} {}: {}\n",
                    spec.glyph, spec.name, gaps.max_gap
                ));
            }
        }
        for (name, gaps) in &snapshot.gaps {
            if config.spec(name).is_none() {
                message.push_str(&format!("   {}: {}\n", name, gaps.max_gap));
            }
        }
    }
    message
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn render_list(values: &[i64]) -> String {
    let items: Vec<String> = values.iter().map(|v| v.to_string()).collect();
    format!("[{}]", items.join(", "))
}

fn format_category(entry: &CategoryGaps, comparison: Option<&Comparison>) -> String {
    let mut block = format!(
        "{} **{}**\n   Numéros: {} | Écart max: **{}**\n   Écarts: {}\n",
        entry.glyph,
        entry.name,
        entry.count,
        entry.max_gap,
        format_gap_list(&entry.gaps)
    );
    if let Some(cmp) = comparison.and_then(|c| c.get(&entry.name)) {
        block.push_str(&format!(
            "   {} Tendance: {} → {} ({})\n",
            cmp.trend.symbol(),
            cmp.previous_max,
            cmp.current_max,
            trend_label(cmp.trend)
        ));
    }
    block
}

/// Entries sorted by max gap descending; ties keep report order.
fn rank_by_max_gap(report: &GapReport) -> Vec<&CategoryGaps> {
    let mut ranked: Vec<&CategoryGaps> = report.iter().collect();
    ranked.sort_by(|a, b| b.max_gap.cmp(&a.max_gap));
    ranked
}

// ── Tests ──────────────────────────────────────────────────────────────────────
