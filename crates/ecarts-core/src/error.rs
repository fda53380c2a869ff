use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the gap-analysis crates.
///
/// Report parsing and gap analysis never fail; malformed input resolves to
/// `None`. Only configuration loading and snapshot storage surface errors.
#[derive(Error, Debug)]
pub enum EcartsError {
    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A file could not be written to disk.
    #[error("Failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A JSON document could not be parsed or serialised.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An hour key was not of the form `HH:00`.
    #[error("Invalid hour key: {0}")]
    InvalidHourKey(String),

    /// A day key was not of the form `Journée_YYYYMMDD`.
    #[error("Invalid day key: {0}")]
    InvalidDayKey(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, EcartsError>;
