//! File system watching on top of inotify.
//!
//! This module provides:
//! - A non-blocking inotify channel ([`InotifyChannel`])
//! - A decoder for the kernel's packed event records
//! - Classification of raw masks into [`EventKind::Changed`] / [`EventKind::Removed`]
//! - [`FileWatcher`], which owns the watches and drains the channel per tick
//! - A tokio drain loop ([`driver::run`])

mod channel;
mod decoder;
pub mod driver;
mod events;
mod handler;
mod table;
#[allow(clippy::module_inception)]
mod watcher;

pub use channel::{drain_available, InotifyChannel, NotifySource, READ_BUFFER_SIZE};
pub use decoder::{decode, encode_record, RawEventRecord, HEADER_SIZE};
pub use events::{
    classify, EventKind, FileEvent, CHANGE_MASK, IN_CLOSE_WRITE, IN_DELETE, IN_IGNORED, IN_MOVE,
    IN_MOVED_FROM, IN_MOVED_TO, IN_Q_OVERFLOW, REMOVAL_MASK, WATCH_MASK,
};
pub use handler::{EventSink, WatcherStats};
pub use table::{WatchId, WatchTable};
pub use watcher::FileWatcher;
