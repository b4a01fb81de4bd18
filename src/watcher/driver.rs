//! Fixed-interval drain loop.

use std::time::Duration;

use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::channel::NotifySource;
use super::handler::EventSink;
use super::watcher::FileWatcher;
use crate::Result;

/// Default time between drains.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Drain `watcher` into `sink` every `interval` until `shutdown` fires.
///
/// Ticks are skipped while the watcher's trigger is inactive (no watches).
/// Each tick runs to completion on the calling task; the channel is
/// non-blocking, so a tick never waits for data.
///
/// # Errors
///
/// Returns the first error from [`FileWatcher::tick`]. The loop does not
/// retry; the caller should stop the watcher.
pub async fn run<S, K>(
    watcher: &mut FileWatcher<S>,
    sink: &mut K,
    interval: Duration,
    shutdown: CancellationToken,
) -> Result<()>
where
    S: NotifySource,
    K: EventSink + ?Sized,
{
    let mut ticker = time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    tracing::debug!(?interval, "Drain loop started");

    loop {
        tokio::select! {
            () = shutdown.cancelled() => {
                tracing::debug!("Drain loop cancelled");
                return Ok(());
            }
            _ = ticker.tick() => {
                if !watcher.is_trigger_active() {
                    continue;
                }

                if let Err(e) = watcher.tick(sink) {
                    tracing::error!(error = %e, "Drain failed, stopping loop");
                    return Err(e);
                }
            }
        }
    }
}
