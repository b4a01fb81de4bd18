//! Delivery sinks for classified events, and watcher statistics.

use tokio::sync::mpsc;

use super::events::{EventKind, FileEvent};

/// Receiver of classified events, called once per event in decode order.
pub trait EventSink {
    fn deliver(&mut self, event: FileEvent);
}

impl<F> EventSink for F
where
    F: FnMut(FileEvent),
{
    fn deliver(&mut self, event: FileEvent) {
        self(event);
    }
}

impl EventSink for Vec<FileEvent> {
    fn deliver(&mut self, event: FileEvent) {
        self.push(event);
    }
}

/// Forwards events to an async consumer. Events sent after the receiver is
/// dropped are discarded.
impl EventSink for mpsc::UnboundedSender<FileEvent> {
    fn deliver(&mut self, event: FileEvent) {
        if let Err(e) = self.send(event) {
            tracing::debug!(path = %e.0.path.display(), "Event receiver dropped, discarding event");
        }
    }
}

/// Counters for one watcher, owned by it and read as a copy.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WatcherStats {
    pub ticks: u64,
    pub records_read: u64,
    /// Records that produced no event (irrelevant masks, retired watches).
    pub records_dropped: u64,
    pub files_changed: u64,
    pub files_removed: u64,
    pub queue_overflows: u64,
}

impl WatcherStats {
    pub(crate) fn record_event(&mut self, kind: EventKind) {
        match kind {
            EventKind::Changed => self.files_changed += 1,
            EventKind::Removed => self.files_removed += 1,
        }
    }
}
