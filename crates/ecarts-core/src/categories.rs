//! Category configuration.
//!
//! The set of tracked categories, the patterns that locate them in a report,
//! and the subset that must be present for a report to be accepted are data,
//! loaded once at start-up and passed to the parser and analyser.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{EcartsError, Result};

/// Marker identifying a complete statistics report.
pub const DEFAULT_SENTINEL: &str = "STATISTIQUES COMPLÈTES";

/// Hour at which a new storage day begins (local time).
pub const DEFAULT_DAY_ROLLOVER_HOUR: u32 = 1;

/// Outcome and parity categories required for a report to be accepted.
pub const DEFAULT_ESSENTIAL: &[&str] = &["Victoire Joueur", "Victoire Banquier", "Pair", "Impair"];

/// One tracked category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySpec {
    pub name: String,
    /// Candidate header texts, most specific first.
    pub patterns: Vec<String>,
    /// Display glyph used in formatted messages.
    pub glyph: String,
}

impl CategorySpec {
    pub fn new(name: &str, patterns: &[&str], glyph: &str) -> Self {
        Self {
            name: name.to_string(),
            patterns: patterns.iter().map(|p| p.to_string()).collect(),
            glyph: glyph.to_string(),
        }
    }
}

/// Immutable parser and analyser configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryConfig {
    #[serde(default = "default_sentinel")]
    pub sentinel: String,
    #[serde(default = "default_rollover_hour")]
    pub day_rollover_hour: u32,
    #[serde(default = "default_essential")]
    pub essential: Vec<String>,
    pub categories: Vec<CategorySpec>,
}

fn default_sentinel() -> String {
    DEFAULT_SENTINEL.to_string()
}

fn default_rollover_hour() -> u32 {
    DEFAULT_DAY_ROLLOVER_HOUR
}

fn default_essential() -> Vec<String> {
    DEFAULT_ESSENTIAL.iter().map(|s| s.to_string()).collect()
}

impl Default for CategoryConfig {
    fn default() -> Self {
        Self {
            sentinel: default_sentinel(),
            day_rollover_hour: default_rollover_hour(),
            essential: default_essential(),
            categories: vec![
                CategorySpec::new("3/2", &["3/2", "La Main Forte du Joueur"], "🧡"),
                CategorySpec::new("3/3", &["3/3", "Le Jackpot des Trois Cartes"], "❤️"),
                CategorySpec::new("2/2", &["2/2", "L'Équilibre du Tapis"], "🖤"),
                CategorySpec::new("2/3", &["2/3", "Le Tirage GAGNANT"], "💚"),
                CategorySpec::new("Victoire Joueur", &["VICTOIRE JOUEUR"], "👤"),
                CategorySpec::new("Victoire Banquier", &["VICTOIRE BANQUIER"], "🏦"),
                CategorySpec::new("Match Nul", &["MATCH NUL"], "⚖️"),
                CategorySpec::new("Pair", &["- PAIR (Chronologique)", "PAIR"], "🔵"),
                CategorySpec::new("Impair", &["- IMPAIR (Chronologique)", "IMPAIR"], "🔴"),
            ],
        }
    }
}

/// Result of [`CategoryConfig::validate`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

impl CategoryConfig {
    /// Load and validate a configuration from a JSON file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| EcartsError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config: CategoryConfig = serde_json::from_str(&content)?;

        let report = config.validate();
        for warning in &report.warnings {
            tracing::warn!("{}: {}", path.display(), warning);
        }
        if !report.is_valid() {
            return Err(EcartsError::Config(report.errors.join("; ")));
        }

        debug!(
            categories = config.categories.len(),
            "loaded category configuration from {}",
            path.display()
        );
        Ok(config)
    }

    /// Load from `path` when given, otherwise use the built-in defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load_from(p),
            None => Ok(Self::default()),
        }
    }

    /// Check the configuration for structural problems.
    pub fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::default();

        if self.sentinel.trim().is_empty() {
            report.errors.push("sentinel marker is empty".to_string());
        }
        if self.day_rollover_hour > 23 {
            report.errors.push(format!(
                "day_rollover_hour must be 0-23, got {}",
                self.day_rollover_hour
            ));
        }

        let mut seen = HashSet::new();
        for spec in &self.categories {
            if !seen.insert(spec.name.as_str()) {
                report
                    .errors
                    .push(format!("duplicate category: {}", spec.name));
            }
            if spec.patterns.iter().all(|p| p.trim().is_empty()) {
                report
                    .errors
                    .push(format!("category {} has no patterns", spec.name));
            }
        }

        for name in &self.essential {
            if !seen.contains(name.as_str()) {
                report
                    .errors
                    .push(format!("essential category {} is not configured", name));
            }
        }
        if self.essential.is_empty() {
            report
                .warnings
                .push("no essential categories: every report will be accepted".to_string());
        }

        report
    }

    pub fn spec(&self, name: &str) -> Option<&CategorySpec> {
        self.categories.iter().find(|c| c.name == name)
    }

    pub fn is_essential(&self, name: &str) -> bool {
        self.essential.iter().any(|e| e == name)
    }

    /// Glyph for `name`, or an empty string for unknown categories.
    pub fn glyph(&self, name: &str) -> &str {
        self.spec(name).map(|c| c.glyph.as_str()).unwrap_or("")
    }
}
