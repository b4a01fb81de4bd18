//! dirwatch - report changed and removed files in a set of directories
//!
//! Entry point for the dirwatch binary. Events are written to stdout as JSON
//! lines; logs go to stderr.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

use std::io::Write;
use std::time::Duration;

use clap::Parser;
use dirwatch::observability::init_tracing;
use dirwatch::watcher::driver;
use dirwatch::{Config, FileEvent, FileWatcher, Result};
use tokio_util::sync::CancellationToken;

/// dirwatch - report changed and removed files in a set of directories
#[derive(Parser, Debug)]
#[command(name = "dirwatch")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directories to watch (not recursive)
    #[arg(short, long, env = "DIRWATCH_WATCH_DIRS", value_delimiter = ',', required = true)]
    watch: Vec<std::path::PathBuf>,

    /// Milliseconds between drains of the notification channel
    #[arg(long, env = "DIRWATCH_POLL_INTERVAL_MS", default_value = "100")]
    poll_interval_ms: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "DIRWATCH_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Enable JSON logging output
    #[arg(long, env = "DIRWATCH_LOG_JSON")]
    log_json: bool,
}

/// Writes each event as one JSON line on stdout.
fn print_event(event: FileEvent) {
    let mut stdout = std::io::stdout().lock();
    let written = serde_json::to_writer(&mut stdout, &event)
        .map_err(std::io::Error::from)
        .and_then(|()| writeln!(stdout))
        .and_then(|()| stdout.flush());

    if let Err(e) = written {
        tracing::warn!(error = %e, path = %event.path.display(), "Failed to write event");
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(&cli.log_level, cli.log_json);

    tracing::info!("dirwatch v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = Config {
        watch_dirs: cli.watch,
        poll_interval: Duration::from_millis(cli.poll_interval_ms),
        log_level: cli.log_level,
        log_json: cli.log_json,
    };

    tracing::debug!(?config, "Configuration loaded");

    config.validate()?;

    let mut watcher = FileWatcher::new(config.watched_set())?;
    watcher.start_watching()?;

    if !watcher.is_trigger_active() {
        tracing::warn!("No configured path is an existing directory, nothing to watch");
    }

    let shutdown = CancellationToken::new();
    let ctrl_c = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown requested");
        }
        ctrl_c.cancel();
    });

    let mut sink = print_event;
    let outcome = driver::run(&mut watcher, &mut sink, config.poll_interval, shutdown).await;

    let stopped = watcher.stop_watching();
    let stats = watcher.stats();
    tracing::info!(
        changed = stats.files_changed,
        removed = stats.files_removed,
        overflows = stats.queue_overflows,
        "dirwatch stopped"
    );

    outcome?;
    stopped?;
    Ok(())
}
