//! File system event types and classification.

#![allow(clippy::missing_const_for_fn)]

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::decoder::RawEventRecord;
use super::table::WatchTable;
use crate::error::WatcherError;

pub const IN_CLOSE_WRITE: u32 = libc::IN_CLOSE_WRITE;
pub const IN_MOVED_FROM: u32 = libc::IN_MOVED_FROM;
pub const IN_MOVED_TO: u32 = libc::IN_MOVED_TO;
pub const IN_MOVE: u32 = IN_MOVED_FROM | IN_MOVED_TO;
pub const IN_DELETE: u32 = libc::IN_DELETE;
pub const IN_Q_OVERFLOW: u32 = libc::IN_Q_OVERFLOW;
pub const IN_IGNORED: u32 = libc::IN_IGNORED;

/// Bits reporting that a file now has new content or a new name.
pub const CHANGE_MASK: u32 = IN_CLOSE_WRITE | IN_MOVE;

/// Bits reporting that a file left the directory.
pub const REMOVAL_MASK: u32 = IN_DELETE | IN_MOVED_FROM;

/// Everything a watch is registered for.
pub const WATCH_MASK: u32 = CHANGE_MASK | REMOVAL_MASK;

/// Semantic event kinds delivered to sinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// File was written and closed, or moved.
    Changed,
    /// File was deleted or moved away. A move-away is in both sets, and
    /// [`EventKind::from_mask`] checks the change set first, so it is
    /// reported as [`EventKind::Changed`].
    Removed,
}

impl EventKind {
    /// Classify a raw mask. The change set is checked first, so a mask in
    /// both sets is a change.
    #[must_use]
    pub fn from_mask(mask: u32) -> Option<Self> {
        if mask & CHANGE_MASK != 0 {
            Some(Self::Changed)
        } else if mask & REMOVAL_MASK != 0 {
            Some(Self::Removed)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Changed => "changed",
            Self::Removed => "removed",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified event for one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileEvent {
    pub kind: EventKind,
    pub path: PathBuf,
}

impl FileEvent {
    #[must_use]
    pub fn new(kind: EventKind, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            path: path.into(),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Turn a raw record into a typed event, or `None` if its mask is in
/// neither set.
///
/// Irrelevant records are dropped before the watch is looked up, so
/// housekeeping records for watches that are already gone pass through.
///
/// # Errors
///
/// Returns [`WatcherError::UnknownWatch`] if a relevant record names a watch
/// the table does not hold.
pub fn classify(
    record: &RawEventRecord,
    table: &WatchTable,
) -> Result<Option<FileEvent>, WatcherError> {
    let Some(kind) = EventKind::from_mask(record.mask) else {
        return Ok(None);
    };

    let dir = table
        .resolve(record.watch_id)
        .ok_or(WatcherError::UnknownWatch(record.watch_id))?;

    Ok(Some(FileEvent::new(kind, dir.join(&record.name))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::watcher::WatchId;
    use std::ffi::OsString;

    const IN_ISDIR: u32 = libc::IN_ISDIR;

    fn record(mask: u32, wd: i32, name: &str) -> RawEventRecord {
        RawEventRecord {
            mask,
            watch_id: WatchId::new(wd),
            cookie: 0,
            name: OsString::from(name),
        }
    }

    fn table() -> WatchTable {
        let mut table = WatchTable::new();
        table.insert(WatchId::new(1), PathBuf::from("/tmp/watched"));
        table
    }

    #[test]
    fn test_mask_constants_are_kernel_bits() {
        assert_eq!(IN_CLOSE_WRITE, 0x0000_0008);
        assert_eq!(IN_MOVED_FROM, 0x0000_0040);
        assert_eq!(IN_MOVED_TO, 0x0000_0080);
        assert_eq!(IN_DELETE, 0x0000_0200);
        assert_eq!(WATCH_MASK, 0x0000_02c8);
    }

    #[test]
    fn test_change_masks() {
        for mask in [
            IN_CLOSE_WRITE,
            IN_MOVED_TO,
            IN_MOVED_FROM,
            IN_MOVE,
            IN_CLOSE_WRITE | IN_ISDIR,
            IN_CLOSE_WRITE | IN_DELETE,
        ] {
            assert_eq!(
                EventKind::from_mask(mask),
                Some(EventKind::Changed),
                "mask {mask:#x}"
            );
        }
    }

    #[test]
    fn test_removal_masks() {
        for mask in [IN_DELETE, IN_DELETE | IN_ISDIR] {
            assert_eq!(
                EventKind::from_mask(mask),
                Some(EventKind::Removed),
                "mask {mask:#x}"
            );
        }
    }

    #[test]
    fn test_move_away_prefers_change() {
        assert_ne!(IN_MOVED_FROM & REMOVAL_MASK, 0);
        assert_ne!(IN_MOVED_FROM & CHANGE_MASK, 0);
        assert_eq!(EventKind::from_mask(IN_MOVED_FROM), Some(EventKind::Changed));
        assert_eq!(
            EventKind::from_mask(IN_MOVED_FROM | IN_ISDIR),
            Some(EventKind::Changed)
        );
    }

    #[test]
    fn test_irrelevant_masks() {
        for mask in [0, IN_IGNORED, IN_Q_OVERFLOW, IN_ISDIR, libc::IN_MODIFY] {
            assert_eq!(EventKind::from_mask(mask), None, "mask {mask:#x}");
        }
    }

    #[test]
    fn test_classify_joins_directory_and_name() {
        let event = classify(&record(IN_CLOSE_WRITE, 1, "a.txt"), &table())
            .unwrap()
            .unwrap();
        assert_eq!(event.kind, EventKind::Changed);
        assert_eq!(event.path(), Path::new("/tmp/watched/a.txt"));

        let event = classify(&record(IN_DELETE, 1, "a.txt"), &table())
            .unwrap()
            .unwrap();
        assert_eq!(event, FileEvent::new(EventKind::Removed, "/tmp/watched/a.txt"));
    }

    #[test]
    fn test_classify_unknown_watch_fails() {
        let err = classify(&record(IN_DELETE, 42, "a.txt"), &table()).unwrap_err();
        assert!(matches!(err, WatcherError::UnknownWatch(id) if id.get() == 42));
    }

    #[test]
    fn test_classify_drops_irrelevant_before_lookup() {
        // Housekeeping record for a watch that is no longer in the table.
        let result = classify(&record(IN_IGNORED, 42, ""), &table()).unwrap();
        assert!(result.is_none());

        let result = classify(&record(IN_Q_OVERFLOW, -1, ""), &table()).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_event_kind_display() {
        assert_eq!(EventKind::Changed.to_string(), "changed");
        assert_eq!(EventKind::Removed.to_string(), "removed");
    }

    #[test]
    fn test_event_serializes_as_json() {
        let event = FileEvent::new(EventKind::Removed, "/tmp/watched/b.txt");
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"kind":"removed","path":"/tmp/watched/b.txt"}"#);
    }
}
