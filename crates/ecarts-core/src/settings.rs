use clap::Parser;
use std::path::{Path, PathBuf};

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Parse statistics reports and publish gap summaries
#[derive(Parser, Debug, Clone)]
#[command(
    name = "ecarts",
    about = "Parse statistics reports and publish gap summaries",
    version
)]
pub struct Settings {
    /// Run mode
    #[arg(long, default_value = "once", value_parser = ["once", "watch", "history", "sample"])]
    pub mode: String,

    /// Report file to process in `once` mode (stdin when omitted)
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Directory polled for incoming `.txt` reports in `watch` mode
    #[arg(long, env = "ECARTS_INBOX", default_value = "inbox")]
    pub inbox: PathBuf,

    /// Directory receiving published bilans in `watch` mode
    #[arg(long, env = "ECARTS_OUTBOX", default_value = "outbox")]
    pub outbox: PathBuf,

    /// Inbox polling interval in seconds (1-3600)
    #[arg(long, default_value = "30", value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub interval_secs: u64,

    /// Snapshot storage file
    #[arg(long, env = "ECARTS_DATA_FILE")]
    pub data_file: Option<PathBuf>,

    /// Category configuration file (JSON); built-in categories when omitted
    #[arg(long, env = "ECARTS_CATEGORIES")]
    pub categories: Option<PathBuf>,

    /// Timezone used for day and hour keys (auto-detected if not specified)
    #[arg(long, env = "ECARTS_TIMEZONE", default_value = "auto")]
    pub timezone: String,

    /// Day key shown in `history` mode (current day when omitted)
    #[arg(long)]
    pub day: Option<String>,

    /// Consecutive rejected reports before warning about format drift
    #[arg(long, default_value = "3", value_parser = clap::value_parser!(u32).range(1..))]
    pub rejection_alert: u32,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR"])]
    pub log_level: String,

    /// Log file path
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

impl Settings {
    /// Parse CLI arguments and apply the `--debug` override.
    pub fn load() -> Self {
        Self::load_from_args(std::env::args_os())
    }

    /// Same as [`Settings::load`] with an explicit argument list.
    pub fn load_from_args<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let mut settings = Settings::parse_from(args);
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }
        settings
    }

    /// Storage file to use: `--data-file` when given, otherwise
    /// `~/.ecarts/ecarts_data.json`.
    pub fn data_file_path(&self) -> PathBuf {
        self.data_file
            .clone()
            .unwrap_or_else(|| default_data_file(&home_dir()))
    }
}

/// Root directory for state and logs, `~/.ecarts`.
pub fn app_dir(home: &Path) -> PathBuf {
    home.join(".ecarts")
}

/// Default snapshot storage file under `home`.
pub fn default_data_file(home: &Path) -> PathBuf {
    app_dir(home).join("ecarts_data.json")
}

pub fn home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

// ── Tests ──────────────────────────────────────────────────────────────────────
