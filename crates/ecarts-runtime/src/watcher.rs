//! Inbox polling loop.
//!
//! Runs a [`ReportProcessor`] in a tokio task over text files dropped into an
//! inbox directory, writing each published bilan to the outbox and sending a
//! [`WatchEvent`] per file through an `mpsc` channel.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time;

use crate::processor::{ProcessOutcome, ReportProcessor};

/// Extension of files picked up from the inbox.
pub const INBOX_EXTENSION: &str = "txt";

// ── Public types ──────────────────────────────────────────────────────────────

/// Result of handling one inbox file.
#[derive(Debug, Clone)]
pub enum WatchEvent {
    Published {
        source: PathBuf,
        output: PathBuf,
        hour_key: String,
    },
    Ignored {
        source: PathBuf,
    },
    Rejected {
        source: PathBuf,
        consecutive: u32,
    },
    Failed {
        source: PathBuf,
        error: String,
    },
}

impl WatchEvent {
    pub fn source(&self) -> &Path {
        match self {
            WatchEvent::Published { source, .. }
            | WatchEvent::Ignored { source }
            | WatchEvent::Rejected { source, .. }
            | WatchEvent::Failed { source, .. } => source,
        }
    }
}

// ── InboxWatcher ──────────────────────────────────────────────────────────────

pub struct InboxWatcher {
    inbox: PathBuf,
    outbox: PathBuf,
    interval: Duration,
}

impl InboxWatcher {
    pub fn new(inbox: impl Into<PathBuf>, outbox: impl Into<PathBuf>, interval: Duration) -> Self {
        Self {
            inbox: inbox.into(),
            outbox: outbox.into(),
            interval,
        }
    }

    /// Spawn the polling loop.
    ///
    /// The inbox is scanned immediately, then on every interval tick. The
    /// loop exits once the returned receiver is dropped.
    pub fn start(self, processor: ReportProcessor) -> (mpsc::Receiver<WatchEvent>, WatchHandle) {
        let (tx, rx) = mpsc::channel(16);

        let handle = tokio::spawn(async move {
            self.watch_loop(processor, tx).await;
        });

        (rx, WatchHandle { handle })
    }

    // ── Private implementation ────────────────────────────────────────────

    async fn watch_loop(self, mut processor: ReportProcessor, tx: mpsc::Sender<WatchEvent>) {
        let mut interval = time::interval(self.interval);

        loop {
            // First tick completes immediately.
            interval.tick().await;

            if tx.is_closed() {
                tracing::debug!("watch channel closed; exiting loop");
                break;
            }

            for path in scan_inbox(&self.inbox) {
                let event = self.handle_file(&mut processor, &path);
                if tx.send(event).await.is_err() {
                    tracing::debug!("watch receiver dropped; exiting loop");
                    return;
                }
            }
        }
    }

    fn handle_file(&self, processor: &mut ReportProcessor, path: &Path) -> WatchEvent {
        let source = path.to_path_buf();

        let bytes = match std::fs::read(path) {
            Ok(b) => b,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to read inbox file");
                return WatchEvent::Failed {
                    source,
                    error: e.to_string(),
                };
            }
        };
        let text = String::from_utf8_lossy(&bytes);

        let event = match processor.process(&text) {
            Ok(ProcessOutcome::Published(bilan)) => {
                let output = self.outbox.join(output_name(path));
                match write_output(&output, &bilan.message) {
                    Ok(()) => WatchEvent::Published {
                        source: source.clone(),
                        output,
                        hour_key: bilan.hour_key,
                    },
                    Err(e) => {
                        tracing::error!(path = %output.display(), error = %e, "failed to write bilan");
                        WatchEvent::Failed {
                            source: source.clone(),
                            error: e.to_string(),
                        }
                    }
                }
            }
            Ok(ProcessOutcome::Ignored) => WatchEvent::Ignored {
                source: source.clone(),
            },
            Ok(ProcessOutcome::Rejected { consecutive }) => WatchEvent::Rejected {
                source: source.clone(),
                consecutive,
            },
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "failed to process report");
                WatchEvent::Failed {
                    source: source.clone(),
                    error: e.to_string(),
                }
            }
        };

        // Failed files stay in the inbox and are retried on the next scan.
        if !matches!(event, WatchEvent::Failed { .. }) {
            if let Err(e) = std::fs::rename(path, done_path(path)) {
                tracing::warn!(path = %path.display(), error = %e, "failed to mark inbox file done");
            }
        }

        event
    }
}

// ── WatchHandle ───────────────────────────────────────────────────────────────

/// Handle to the background watch task.
pub struct WatchHandle {
    handle: tokio::task::JoinHandle<()>,
}

impl WatchHandle {
    /// Immediately abort the watch loop.
    pub fn abort(&self) {
        self.handle.abort();
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Pending `*.txt` files directly inside `inbox`, sorted by path.
///
/// A missing inbox yields no files.
pub fn scan_inbox(inbox: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(inbox)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry.file_type().is_file()
                && entry
                    .path()
                    .extension()
                    .map(|ext| ext == INBOX_EXTENSION)
                    .unwrap_or(false)
        })
        .map(|entry| entry.into_path())
        .collect();
    files.sort();
    files
}

fn output_name(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("{}.bilan.md", stem)
}

fn done_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!("{}.done", name))
}

fn write_output(path: &Path, message: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, message)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
