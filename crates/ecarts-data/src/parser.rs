//! Statistics report parser.
//!
//! Turns a decorated, human-formatted report into per-category ID sequences.
//! Each category is located by an ordered list of extraction strategies of
//! decreasing structural assumption; the first one that yields a result wins.
//! All strategies share the same section-termination rules:
//!
//! * blank lines and light separator rows (`-----`, `─────`, `=====`) are skipped;
//! * a heavy rule (8 or more `━`) ends the section;
//! * a line opening a new block (`┏` or `╔`) ends the section;
//! * a "Liste des numéros" header other than the one being read ends the section.
//!
//! Patterns only match as whole terms: `PAIR` does not match inside `IMPAIR`
//! and `2/2` does not match inside the date `15/12/2024`.

use ecarts_core::categories::{CategoryConfig, CategorySpec};
use ecarts_core::models::{CategoryIds, ParsedReport};
use regex::Regex;
use tracing::{debug, info, warn};

/// Phrase introducing a list of IDs.
const LIST_HEADER: &str = "liste des numéros";

/// Minimum number of `━` making a heavy rule.
const HEAVY_RULE_MIN: usize = 8;

/// Minimum width of a light separator row.
const SEPARATOR_MIN_WIDTH: usize = 5;

const SEPARATOR_CHARS: &[char] = &['━', '─', '—', '-', '=', '═', '*', '│', '┃', ' ', '\t'];

/// Characters that keep a text line from ending a configuration-block list.
const STRUCTURAL_CHARS: &[char] = &['#', '─', '━', '-'];

// ── Line classification ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineKind {
    /// Empty or a light separator; skipped inside a section.
    Skip,
    /// Heavy rule or new block; ends any section.
    SectionEnd,
    Content,
}

fn classify_line(line: &str) -> LineKind {
    let stripped = line.trim();
    if stripped.is_empty() {
        return LineKind::Skip;
    }
    if is_heavy_rule(stripped) || is_block_start(stripped) {
        return LineKind::SectionEnd;
    }
    if is_separator(stripped) {
        return LineKind::Skip;
    }
    LineKind::Content
}

fn is_heavy_rule(stripped: &str) -> bool {
    stripped.matches('━').count() >= HEAVY_RULE_MIN
}

fn is_block_start(stripped: &str) -> bool {
    stripped.starts_with('┏') || stripped.starts_with('╔')
}

fn is_separator(stripped: &str) -> bool {
    stripped.chars().count() >= SEPARATOR_MIN_WIDTH
        && stripped.chars().all(|c| SEPARATOR_CHARS.contains(&c))
}

fn is_list_header(line: &str) -> bool {
    line.to_lowercase().contains(LIST_HEADER)
}

/// Characters that glue a pattern to a longer word, number or fraction.
fn is_term_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '/'
}

/// `true` when `term` occurs in `line` and is not part of a longer term.
///
/// Edges of `term` that are themselves term characters must be bordered by
/// a non-term character or the end of the line.
fn contains_term(line: &str, term: &str) -> bool {
    let (Some(first), Some(last)) = (term.chars().next(), term.chars().next_back()) else {
        return false;
    };
    line.match_indices(term).any(|(start, _)| {
        let before = line[..start].chars().next_back();
        let after = line[start + term.len()..].chars().next();
        let open = !is_term_char(first) || !before.is_some_and(is_term_char);
        let close = !is_term_char(last) || !after.is_some_and(is_term_char);
        open && close
    })
}

/// A line of prose: has word characters but no ID or structural markers.
fn is_free_text(stripped: &str) -> bool {
    stripped.chars().any(|c| c.is_alphanumeric() || c == '_')
        && !stripped.contains(STRUCTURAL_CHARS)
}

// ── Strategies ────────────────────────────────────────────────────────────────

/// A single way of locating a category's IDs from one of its patterns.
///
/// `None` means "not found here, try the next strategy"; `Some(vec![])` means
/// the category was located but listed no IDs.
type Strategy = fn(&ReportParser, &[&str], &str) -> Option<Vec<i64>>;

const STRATEGIES: &[(&str, Strategy)] = &[
    ("list header", ReportParser::extract_after_header),
    ("configuration block", ReportParser::extract_after_config_header),
    ("direct pattern", ReportParser::extract_fallback),
];

// ── ReportParser ──────────────────────────────────────────────────────────────

/// Parses complete statistics reports according to a [`CategoryConfig`].
#[derive(Debug, Clone)]
pub struct ReportParser {
    config: CategoryConfig,
    id_token: Regex,
    total_patterns: Vec<Regex>,
}

impl ReportParser {
    pub fn new(config: CategoryConfig) -> Self {
        let total_patterns = [
            r"(?i)Total jeux analysés\s*:\s*(\d+)",
            r"(?i)Total jeux?\s*:\s*(\d+)",
            r"(?i)Total\s*:\s*(\d+)",
        ]
        .iter()
        .map(|p| Regex::new(p).expect("regex is valid"))
        .collect();

        Self {
            config,
            id_token: Regex::new(r"#N(\d+)").expect("regex is valid"),
            total_patterns,
        }
    }

    pub fn config(&self) -> &CategoryConfig {
        &self.config
    }

    /// `true` when `text` carries the sentinel marker of a complete report.
    pub fn has_sentinel(&self, text: &str) -> bool {
        text.contains(&self.config.sentinel)
    }

    /// Parse a report.
    ///
    /// Returns `None` when the sentinel marker is absent or any essential
    /// category could not be located. Optional categories that are not found
    /// are simply left out of the result.
    pub fn parse(&self, text: &str) -> Option<ParsedReport> {
        if !self.has_sentinel(text) {
            info!("message does not contain \"{}\"; skipping", self.config.sentinel);
            return None;
        }

        let total_games = self.extract_total_games(text);
        debug!(total_games, "total games extracted");

        let lines: Vec<&str> = text.lines().collect();
        let mut categories = Vec::new();
        let mut missing = Vec::new();

        for spec in &self.config.categories {
            match self.extract_from_lines(&lines, spec) {
                Some(ids) => {
                    debug!(category = %spec.name, count = ids.len(), "category found");
                    categories.push(CategoryIds {
                        name: spec.name.clone(),
                        ids,
                    });
                }
                None => {
                    debug!(category = %spec.name, "category not found");
                    missing.push(spec.name.as_str());
                }
            }
        }

        let missing_essential: Vec<&str> = missing
            .iter()
            .copied()
            .filter(|name| self.config.is_essential(name))
            .collect();
        if !missing_essential.is_empty() {
            warn!(missing = ?missing_essential, "essential categories missing; report rejected");
            return None;
        }

        if !missing.is_empty() {
            info!(
                found = categories.len(),
                configured = self.config.categories.len(),
                missing = ?missing,
                "permissive mode: accepting partial report"
            );
        }

        Some(ParsedReport {
            total_games,
            categories,
        })
    }

    /// First "Total ...: N" value, most specific label first; 0 when none
    /// match or the number does not fit.
    pub fn extract_total_games(&self, text: &str) -> u64 {
        for pattern in &self.total_patterns {
            if let Some(caps) = pattern.captures(text) {
                return caps[1].parse().unwrap_or_else(|_| {
                    debug!("total games value {} out of range; using 0", &caps[1]);
                    0
                });
            }
        }
        0
    }

    /// Locate the IDs of one category in `text`.
    pub fn extract_category(&self, text: &str, spec: &CategorySpec) -> Option<Vec<i64>> {
        let lines: Vec<&str> = text.lines().collect();
        self.extract_from_lines(&lines, spec)
    }

    fn extract_from_lines(&self, lines: &[&str], spec: &CategorySpec) -> Option<Vec<i64>> {
        for (strategy_name, strategy) in STRATEGIES {
            for pattern in &spec.patterns {
                if let Some(ids) = strategy(self, lines, pattern) {
                    debug!(
                        category = %spec.name,
                        pattern = %pattern,
                        strategy = strategy_name,
                        "category located"
                    );
                    return Some(ids);
                }
            }
        }
        None
    }

    fn ids_in(&self, line: &str) -> Vec<i64> {
        self.id_token
            .captures_iter(line)
            .filter_map(|caps| match caps[1].parse() {
                Ok(id) => Some(id),
                Err(_) => {
                    warn!("ID token #N{} out of range; skipped", &caps[1]);
                    None
                }
            })
            .collect()
    }

    /// "Liste des numéros - PATTERN" header followed by ID lines.
    fn extract_after_header(&self, lines: &[&str], pattern: &str) -> Option<Vec<i64>> {
        let header = format!("Liste des numéros - {}", pattern);
        let start = lines.iter().position(|line| contains_term(line, &header))?;
        debug!("header \"{}\" found at line {}", header, start);

        let mut ids = Vec::new();
        for (i, line) in lines.iter().enumerate().skip(start + 1) {
            match classify_line(line) {
                LineKind::Skip => continue,
                LineKind::SectionEnd => {
                    debug!("section end (rule or block) at line {}", i);
                    break;
                }
                LineKind::Content => {}
            }
            if is_list_header(line) && !contains_term(line, &header) {
                debug!("section end (next list) at line {}", i);
                break;
            }
            ids.extend(self.ids_in(line));
        }
        Some(ids)
    }

    /// "Configuration: PATTERN" block containing a nested list header.
    fn extract_after_config_header(&self, lines: &[&str], pattern: &str) -> Option<Vec<i64>> {
        let header = format!("Configuration: {}", pattern);
        let start = lines.iter().position(|line| contains_term(line, &header))?;
        debug!("configuration \"{}\" found at line {}", header, start);

        let mut list_start = None;
        for (i, line) in lines.iter().enumerate().skip(start + 1) {
            if is_list_header(line) {
                list_start = Some(i);
                break;
            }
            if is_block_start(line.trim()) {
                debug!("new block before list at line {}", i);
                return None;
            }
        }
        let list_start = list_start?;

        let mut ids = Vec::new();
        for (i, line) in lines.iter().enumerate().skip(list_start + 1) {
            match classify_line(line) {
                LineKind::Skip => continue,
                LineKind::SectionEnd => {
                    debug!("list end (rule or block) at line {}", i);
                    break;
                }
                LineKind::Content => {}
            }
            if is_list_header(line) {
                break;
            }
            let found = self.ids_in(line);
            if found.is_empty() {
                if is_free_text(line.trim()) {
                    debug!("list end (text) at line {}", i);
                    break;
                }
                continue;
            }
            ids.extend(found);
        }
        Some(ids)
    }

    /// Any non-ID line containing the raw pattern, followed by ID lines.
    /// Succeeds only when at least one ID is collected.
    fn extract_fallback(&self, lines: &[&str], pattern: &str) -> Option<Vec<i64>> {
        let start = lines
            .iter()
            .position(|line| contains_term(line, pattern) && !self.id_token.is_match(line))?;

        let mut ids = Vec::new();
        for line in lines.iter().skip(start + 1) {
            match classify_line(line) {
                LineKind::Skip => continue,
                LineKind::SectionEnd => break,
                LineKind::Content => {}
            }
            if is_list_header(line) {
                break;
            }
            ids.extend(self.ids_in(line));
        }

        if ids.is_empty() {
            None
        } else {
            Some(ids)
        }
    }
}

impl Default for ReportParser {
    fn default() -> Self {
        Self::new(CategoryConfig::default())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const RULE: &str = "━━━━━━━━━━━━━━━━";

    fn list_section(pattern: &str, ids: &[i64]) -> String {
        let mut section = format!("📋 Liste des numéros - {}\n", pattern);
        for id in ids {
            section.push_str(&format!("  • #N{}\n", id));
        }
        section.push_str(RULE);
        section.push('\n');
        section
    }

    /// A report with the four essential categories.
    fn essential_report() -> String {
        let mut text = String::from("📊 STATISTIQUES COMPLÈTES\nTotal jeux analysés : 60\n");
        text.push_str(&list_section("VICTOIRE JOUEUR", &[1322, 1330, 1333]));
        text.push_str(&list_section("VICTOIRE BANQUIER", &[1321, 1323]));
        text.push_str(&list_section("PAIR", &[1321, 1323, 1326]));
        text.push_str(&list_section("IMPAIR", &[1322, 1325]));
        text
    }

    fn spec(name: &str, patterns: &[&str]) -> CategorySpec {
        CategorySpec::new(name, patterns, "*")
    }

    // ── Line classification ───────────────────────────────────────────────────

    #[test]
    fn test_classify_heavy_rule_ends_section() {
        assert_eq!(classify_line(RULE), LineKind::SectionEnd);
        assert_eq!(classify_line("┗━━━━━━━━━━━━━━━━┛"), LineKind::SectionEnd);
    }

    #[test]
    fn test_classify_short_heavy_rule_is_separator() {
        assert_eq!(classify_line("━━━━━"), LineKind::Skip);
    }

    #[test]
    fn test_classify_light_separators_skipped() {
        assert_eq!(classify_line("----------"), LineKind::Skip);
        assert_eq!(classify_line("  ──────────  "), LineKind::Skip);
        assert_eq!(classify_line("=========="), LineKind::Skip);
        assert_eq!(classify_line(""), LineKind::Skip);
        assert_eq!(classify_line("   "), LineKind::Skip);
    }

    #[test]
    fn test_classify_short_dash_is_content() {
        assert_eq!(classify_line("---"), LineKind::Content);
    }

    #[test]
    fn test_classify_block_start() {
        assert_eq!(classify_line("┏ Bloc"), LineKind::SectionEnd);
        assert_eq!(classify_line("  ╔═══ Bloc"), LineKind::SectionEnd);
    }

    #[test]
    fn test_contains_term_respects_boundaries() {
        assert!(contains_term("Liste des numéros - PAIR", "PAIR"));
        assert!(contains_term("🔵 PAIR (Chronologique)", "PAIR"));
        assert!(!contains_term("Liste des numéros - IMPAIR", "PAIR"));
        assert!(!contains_term("PAIRES", "PAIR"));
        assert!(contains_term("┃ Configuration: 2/2", "2/2"));
        assert!(!contains_term("Rapport du 15/12/2024", "2/2"));
        assert!(!contains_term("Configuration: 2/23", "Configuration: 2/2"));
        assert!(contains_term("x- PAIR (Chronologique):", "- PAIR (Chronologique)"));
        assert!(!contains_term("PAIR", ""));
    }

    #[test]
    fn test_is_free_text() {
        assert!(is_free_text("Fréquence observée"));
        assert!(!is_free_text("#N1234"));
        assert!(!is_free_text("Série - 3"));
        assert!(!is_free_text("•••"));
    }

    // ── Sentinel and acceptance ───────────────────────────────────────────────

    #[test]
    fn test_parse_without_sentinel_is_none() {
        let parser = ReportParser::default();
        let text = essential_report().replace("STATISTIQUES COMPLÈTES", "STATISTIQUES");
        assert!(parser.parse(&text).is_none());
        assert!(parser.parse("").is_none());
    }

    #[test]
    fn test_parse_essential_report_accepted() {
        let parser = ReportParser::default();
        let report = parser.parse(&essential_report()).expect("accepted");
        assert_eq!(report.total_games, 60);
        assert_eq!(report.get("Pair"), Some(&[1321, 1323, 1326][..]));
        assert_eq!(report.get("Impair"), Some(&[1322, 1325][..]));
        assert_eq!(report.get("Victoire Joueur"), Some(&[1322, 1330, 1333][..]));
        assert_eq!(report.get("Victoire Banquier"), Some(&[1321, 1323][..]));
    }

    #[test]
    fn test_parse_optional_categories_absent() {
        let parser = ReportParser::default();
        let report = parser.parse(&essential_report()).expect("accepted");
        assert!(!report.contains("Match Nul"));
        assert!(!report.contains("3/2"));
        assert_eq!(report.categories.len(), 4);
    }

    #[test]
    fn test_parse_missing_essential_rejected() {
        let parser = ReportParser::default();
        let mut text = String::from("STATISTIQUES COMPLÈTES\n");
        text.push_str(&list_section("VICTOIRE JOUEUR", &[1, 2]));
        text.push_str(&list_section("VICTOIRE BANQUIER", &[3]));
        text.push_str(&list_section("PAIR", &[2]));
        text.push_str(&list_section("MATCH NUL", &[5, 9]));
        text.push_str(&list_section("3/2", &[7]));
        assert!(parser.parse(&text).is_none());
    }

    #[test]
    fn test_parse_keeps_configuration_order() {
        let parser = ReportParser::default();
        let mut text = essential_report();
        text.push_str(&list_section("MATCH NUL", &[1324, 1332]));
        let report = parser.parse(&text).expect("accepted");
        assert_eq!(
            report.category_names(),
            vec!["Victoire Joueur", "Victoire Banquier", "Match Nul", "Pair", "Impair"]
        );
    }

    #[test]
    fn test_parse_empty_essential_section_counts_as_present() {
        let parser = ReportParser::default();
        let text = essential_report().replace(
            &list_section("IMPAIR", &[1322, 1325]),
            &list_section("IMPAIR", &[]),
        );
        let report = parser.parse(&text).expect("accepted");
        assert_eq!(report.get("Impair"), Some(&[][..]));
    }

    // ── Total games ───────────────────────────────────────────────────────────

    #[test]
    fn test_total_games_most_specific_first() {
        let parser = ReportParser::default();
        let text = "Total: 5\nTotal jeux analysés : 60";
        assert_eq!(parser.extract_total_games(text), 60);
    }

    #[test]
    fn test_total_games_case_insensitive_and_generic() {
        let parser = ReportParser::default();
        assert_eq!(parser.extract_total_games("TOTAL JEUX ANALYSÉS:42"), 42);
        assert_eq!(parser.extract_total_games("total jeu :  7"), 7);
        assert_eq!(parser.extract_total_games("Total : 12"), 12);
    }

    #[test]
    fn test_total_games_absent_or_malformed() {
        let parser = ReportParser::default();
        assert_eq!(parser.extract_total_games("Total jeux analysés : beaucoup"), 0);
        assert_eq!(parser.extract_total_games("rien"), 0);
        assert_eq!(
            parser.extract_total_games("Total : 99999999999999999999999"),
            0
        );
    }

    // ── Strategy a: list header ───────────────────────────────────────────────

    #[test]
    fn test_header_section_skips_separators() {
        let parser = ReportParser::default();
        let text = "Liste des numéros - PAIR\n#N10 #N12\n----------\n\n#N15\n━━━━━━━━━━\n#N99";
        let ids = parser.extract_category(text, &spec("Pair", &["PAIR"]));
        assert_eq!(ids, Some(vec![10, 12, 15]));
    }

    #[test]
    fn test_header_section_ends_at_other_list() {
        let parser = ReportParser::default();
        let text = "Liste des numéros - PAIR\n#N10\nListe des numéros - IMPAIR\n#N11";
        let ids = parser.extract_category(text, &spec("Pair", &["PAIR"]));
        assert_eq!(ids, Some(vec![10]));
    }

    #[test]
    fn test_header_section_ends_at_block_start() {
        let parser = ReportParser::default();
        let text = "Liste des numéros - PAIR\n#N10\n┏━━ Configuration: 3/2\n#N11";
        let ids = parser.extract_category(text, &spec("Pair", &["PAIR"]));
        assert_eq!(ids, Some(vec![10]));
    }

    #[test]
    fn test_header_found_without_ids_is_empty() {
        let parser = ReportParser::default();
        let text = "Liste des numéros - PAIR\n(aucun)\n━━━━━━━━━━";
        let ids = parser.extract_category(text, &spec("Pair", &["PAIR"]));
        assert_eq!(ids, Some(vec![]));
    }

    #[test]
    fn test_header_keeps_given_order() {
        let parser = ReportParser::default();
        let text = "Liste des numéros - PAIR\n#N30 #N10 #N20";
        let ids = parser.extract_category(text, &spec("Pair", &["PAIR"]));
        assert_eq!(ids, Some(vec![30, 10, 20]));
    }

    #[test]
    fn test_later_pattern_used_when_first_absent() {
        let parser = ReportParser::default();
        let text = "Liste des numéros - La Main Forte du Joueur\n#N1330 #N1342";
        let ids = parser.extract_category(text, &spec("3/2", &["3/2", "La Main Forte du Joueur"]));
        assert_eq!(ids, Some(vec![1330, 1342]));
    }

    // ── Strategy b: configuration block ───────────────────────────────────────

    #[test]
    fn test_config_block_nested_list() {
        let parser = ReportParser::default();
        let text = "\
┏━━━━━━━━━━━━━━━━━━┓
┃ Configuration: 3/2
┃ Occurrences: 8
La liste des numéros (Chronologique)
#N1330 #N1342
#N1352
Fréquence moyenne
#N9999
";
        let ids = parser.extract_category(text, &spec("3/2", &["3/2"]));
        assert_eq!(ids, Some(vec![1330, 1342, 1352]));
    }

    #[test]
    fn test_config_block_abandoned_at_new_block() {
        let parser = ReportParser::default();
        let text = "\
Configuration: 3/3
Occurrences: 2
┏━━━━━━━━━━━━━━━━━━┓
La liste des numéros (Chronologique)
#N1
";
        // The list belongs to the next block; the fallback also stops there.
        let ids = parser.extract_category(text, &spec("3/3", &["3/3"]));
        assert_eq!(ids, None);
    }

    #[test]
    fn test_config_block_ends_at_heavy_rule() {
        let parser = ReportParser::default();
        let text = "Configuration: 2/2\nLa liste des numéros\n#N5\n- - - - - -\n#N7\n━━━━━━━━━━\n#N9";
        let ids = parser.extract_category(text, &spec("2/2", &["2/2"]));
        assert_eq!(ids, Some(vec![5, 7]));
    }

    // ── Strategy c: fallback ──────────────────────────────────────────────────

    #[test]
    fn test_fallback_direct_pattern() {
        let parser = ReportParser::default();
        let text = "🏆 MATCH NUL (Chronologique)\n#N1324 #N1332\n\n#N1354\n┏ suite\n#N2000";
        let ids = parser.extract_category(text, &spec("Match Nul", &["MATCH NUL"]));
        assert_eq!(ids, Some(vec![1324, 1332, 1354]));
    }

    #[test]
    fn test_fallback_ignores_pattern_on_id_line() {
        let parser = ReportParser::default();
        let text = "MATCH NUL #N1\n#N2";
        let ids = parser.extract_category(text, &spec("Match Nul", &["MATCH NUL"]));
        assert_eq!(ids, None);
    }

    #[test]
    fn test_fallback_without_ids_is_none() {
        let parser = ReportParser::default();
        let text = "MATCH NUL\nrien à signaler\n━━━━━━━━━━";
        let ids = parser.extract_category(text, &spec("Match Nul", &["MATCH NUL"]));
        assert_eq!(ids, None);
    }

    #[test]
    fn test_fallback_does_not_match_inside_longer_word() {
        let parser = ReportParser::default();
        let text = "Liste des numéros - IMPAIR\n#N1322 #N1325\n━━━━━━━━━━";
        let ids = parser.extract_category(text, &spec("Pair", &["- PAIR (Chronologique)", "PAIR"]));
        assert_eq!(ids, None);
    }

    #[test]
    fn test_fallback_does_not_match_inside_date() {
        let parser = ReportParser::default();
        let text = "Rapport du 15/12/2024\n#N1 #N2\n━━━━━━━━━━";
        let ids = parser.extract_category(text, &spec("2/2", &["2/2"]));
        assert_eq!(ids, None);
    }

    #[test]
    fn test_oversized_id_token_skipped() {
        let parser = ReportParser::default();
        let text = "Liste des numéros - PAIR\n#N10 #N99999999999999999999 #N12";
        let ids = parser.extract_category(text, &spec("Pair", &["PAIR"]));
        assert_eq!(ids, Some(vec![10, 12]));
    }

    #[test]
    fn test_header_strategy_preferred_over_fallback() {
        let parser = ReportParser::default();
        let text = "VICTOIRE JOUEUR\n#N1\n━━━━━━━━━━\nListe des numéros - VICTOIRE JOUEUR\n#N5 #N6";
        let ids = parser.extract_category(text, &spec("Victoire Joueur", &["VICTOIRE JOUEUR"]));
        assert_eq!(ids, Some(vec![5, 6]));
    }
}
