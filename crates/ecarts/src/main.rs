mod bootstrap;

use std::io::Read;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use ecarts_core::categories::CategoryConfig;
use ecarts_core::settings::Settings;
use ecarts_core::time_utils::{validate_day_key, Clock};
use ecarts_data::store::JsonFileStore;
use ecarts_runtime::processor::{ProcessOutcome, ReportProcessor};
use ecarts_runtime::watcher::{InboxWatcher, WatchEvent};

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load();

    bootstrap::ensure_directories()?;
    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_deref())?;

    tracing::info!("Écarts v{} starting", env!("CARGO_PKG_VERSION"));

    let config = CategoryConfig::load_or_default(settings.categories.as_deref())?;
    let clock = Clock::new(&settings.timezone);
    let data_file = settings.data_file_path();
    tracing::info!(
        "Mode: {}, Timezone: {}, Data file: {}",
        settings.mode,
        clock.timezone(),
        data_file.display()
    );

    let store = JsonFileStore::open(data_file);
    let mut processor =
        ReportProcessor::new(config, Box::new(store), clock, settings.rejection_alert);

    match settings.mode.as_str() {
        "once" => {
            let text = match &settings.input {
                Some(path) => std::fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))?,
                None => {
                    let mut buf = String::new();
                    std::io::stdin()
                        .read_to_string(&mut buf)
                        .context("reading report from stdin")?;
                    buf
                }
            };

            match processor.process(&text)? {
                ProcessOutcome::Published(bilan) => println!("{}", bilan.message),
                ProcessOutcome::Ignored => {
                    eprintln!("Not a statistics report (sentinel marker missing); nothing published.")
                }
                ProcessOutcome::Rejected { .. } => {
                    eprintln!("Report rejected: essential categories missing; nothing published.")
                }
            }
        }

        "watch" => {
            std::fs::create_dir_all(&settings.inbox)
                .with_context(|| format!("creating inbox {}", settings.inbox.display()))?;
            tracing::info!(
                "Watching {} every {}s; bilans go to {}",
                settings.inbox.display(),
                settings.interval_secs,
                settings.outbox.display()
            );

            let watcher = InboxWatcher::new(
                &settings.inbox,
                &settings.outbox,
                Duration::from_secs(settings.interval_secs),
            );
            let (mut rx, handle) = watcher.start(processor);

            let shutdown = tokio::signal::ctrl_c();
            tokio::pin!(shutdown);

            loop {
                tokio::select! {
                    event = rx.recv() => match event {
                        Some(event) => log_event(&event),
                        None => break,
                    },
                    _ = &mut shutdown => {
                        tracing::info!("Ctrl+C received; stopping inbox watcher");
                        handle.abort();
                        break;
                    }
                }
            }
        }

        "history" => {
            if let Some(day) = &settings.day {
                validate_day_key(day)?;
            }
            print!("{}", processor.history(settings.day.as_deref()));
        }

        "sample" => {
            println!("{}", processor.sample_bilan(Utc::now()));
        }

        unknown => {
            eprintln!("Unknown mode: {}", unknown);
        }
    }

    Ok(())
}

fn log_event(event: &WatchEvent) {
    match event {
        WatchEvent::Published {
            source,
            output,
            hour_key,
        } => tracing::info!(
            "{} → {} ({})",
            source.display(),
            output.display(),
            hour_key
        ),
        WatchEvent::Ignored { source } => {
            tracing::info!("{}: not a statistics report", source.display())
        }
        WatchEvent::Rejected {
            source,
            consecutive,
        } => tracing::warn!(
            "{}: rejected, essential categories missing ({} in a row)",
            source.display(),
            consecutive
        ),
        WatchEvent::Failed { source, error } => {
            tracing::error!("{}: {}", source.display(), error)
        }
    }
}
