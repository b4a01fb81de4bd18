//! Directory watcher driven by periodic drain ticks.

use std::collections::{BTreeSet, HashSet};
use std::io;
use std::path::{Component, Path, PathBuf};

use super::channel::{drain_available, InotifyChannel, NotifySource, READ_BUFFER_SIZE};
use super::decoder::RawEventRecord;
use super::events::{classify, FileEvent, IN_IGNORED, IN_Q_OVERFLOW, WATCH_MASK};
use super::handler::{EventSink, WatcherStats};
use super::table::{WatchId, WatchTable};
use crate::error::WatcherError;
use crate::Result;

type WatchResult = std::result::Result<(), WatcherError>;

/// Watches a set of directories (non-recursively) for changed and removed files.
///
/// The watcher never runs on its own. Something outside calls [`tick`]
/// while [`is_trigger_active`] is true; see [`super::driver::run`].
///
/// [`tick`]: FileWatcher::tick
/// [`is_trigger_active`]: FileWatcher::is_trigger_active
pub struct FileWatcher<S = InotifyChannel> {
    source: S,
    table: WatchTable,
    /// Removed watches whose `IN_IGNORED` has not been drained yet. Records
    /// for them may still be queued and are skipped.
    retired: HashSet<WatchId>,
    directories: BTreeSet<PathBuf>,
    trigger_active: bool,
    buffer: Box<[u8; READ_BUFFER_SIZE]>,
    stats: WatcherStats,
}

impl FileWatcher<InotifyChannel> {
    /// Create a watcher for `directories` on a fresh inotify channel.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::ChannelError::Init`] if the channel cannot be opened.
    pub fn new<I, P>(directories: I) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Ok(Self::with_source(InotifyChannel::open()?, directories))
    }

    /// Create a watcher for a single directory.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::ChannelError::Init`] if the channel cannot be opened.
    pub fn for_directory(dir: impl Into<PathBuf>) -> Result<Self> {
        Self::new([dir.into()])
    }
}

impl<S: NotifySource> FileWatcher<S> {
    /// Create a watcher over an already-open notification source.
    pub fn with_source<I, P>(source: S, directories: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            source,
            table: WatchTable::new(),
            retired: HashSet::new(),
            directories: directories.into_iter().map(Into::into).collect(),
            trigger_active: false,
            buffer: Box::new([0; READ_BUFFER_SIZE]),
            stats: WatcherStats::default(),
        }
    }

    /// Snapshot of the configured directories.
    #[must_use]
    pub fn directories(&self) -> BTreeSet<PathBuf> {
        self.directories.clone()
    }

    /// Add a directory to the configured set. Takes effect on the next
    /// [`start_watching`](Self::start_watching).
    pub fn add_directory(&mut self, dir: impl Into<PathBuf>) -> bool {
        self.directories.insert(dir.into())
    }

    /// Remove a directory from the configured set. An active watch on it is
    /// left alone.
    pub fn remove_directory(&mut self, dir: &Path) -> bool {
        self.directories.remove(dir)
    }

    /// Whether the drain trigger should be firing.
    #[must_use]
    pub const fn is_trigger_active(&self) -> bool {
        self.trigger_active
    }

    /// Number of active watches.
    #[must_use]
    pub fn watch_count(&self) -> usize {
        self.table.len()
    }

    /// Active watch covering `dir`, if any. Relative paths are resolved
    /// against the current directory.
    #[must_use]
    pub fn watch_id(&self, dir: &Path) -> Option<WatchId> {
        absolute_dir(dir).ok().and_then(|dir| self.table.id_for(&dir))
    }

    #[must_use]
    pub const fn stats(&self) -> WatcherStats {
        self.stats
    }

    #[cfg(test)]
    pub(crate) fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Register every configured directory.
    ///
    /// # Errors
    ///
    /// Returns the first registration failure. Directories registered before
    /// it stay registered.
    pub fn start_watching(&mut self) -> WatchResult {
        self.register_all()
    }

    /// Remove every watch and stop the trigger.
    ///
    /// # Errors
    ///
    /// Returns the first removal failure. The remaining watches are left in
    /// the table; the watcher should be dropped rather than restarted.
    pub fn stop_watching(&mut self) -> WatchResult {
        let result = self.deregister_all();
        self.trigger_active = false;
        result
    }

    /// Watch `dir` for changed and removed files.
    ///
    /// Relative paths are made absolute against the current directory, so
    /// event paths are always absolute. A path that is not an existing
    /// directory is skipped with a warning and counts as success.
    ///
    /// # Errors
    ///
    /// Returns [`WatcherError::WatchFailed`] if the path cannot be made
    /// absolute or the kernel refuses the watch.
    pub fn register_directory(&mut self, dir: &Path) -> WatchResult {
        let dir = absolute_dir(dir).map_err(|e| {
            tracing::error!(path = %dir.display(), error = %e, "Failed to resolve directory");
            WatcherError::watch_failed(dir.display().to_string(), e)
        })?;

        if !dir.is_dir() {
            tracing::warn!(path = %dir.display(), "Not an existing directory, skipping");
            return Ok(());
        }

        let id = self.source.add_watch(&dir, WATCH_MASK).map_err(|e| {
            tracing::error!(path = %dir.display(), error = %e, "Failed to start watching");
            WatcherError::watch_failed(dir.display().to_string(), e)
        })?;

        // The kernel handed the id out again, so it is live rather than retired.
        self.retired.remove(&id);
        tracing::info!(path = %dir.display(), %id, "Watching directory");
        self.table.insert(id, dir);
        self.trigger_active = true;

        Ok(())
    }

    /// Register every configured directory, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// Returns the failing directory's [`WatcherError::WatchFailed`].
    pub fn register_all(&mut self) -> WatchResult {
        let dirs: Vec<PathBuf> = self.directories.iter().cloned().collect();
        for dir in &dirs {
            self.register_directory(dir)?;
        }

        Ok(())
    }

    /// Remove the watch `id`. The trigger stops once no watches remain.
    ///
    /// Records for `id` still queued in the kernel are discarded by later
    /// ticks, up to its `IN_IGNORED`.
    ///
    /// # Errors
    ///
    /// Returns [`WatcherError::UnwatchFailed`] if the kernel refuses; the
    /// table entry is kept.
    pub fn deregister(&mut self, id: WatchId) -> WatchResult {
        self.source.rm_watch(id).map_err(|e| {
            tracing::error!(%id, error = %e, "Failed to stop watching");
            WatcherError::unwatch_failed(id, e)
        })?;

        if let Some(dir) = self.table.remove(id) {
            tracing::info!(path = %dir.display(), %id, "Stopped watching directory");
        }
        self.retired.insert(id);
        self.stop_trigger_if_idle();

        Ok(())
    }

    /// Remove watches one at a time until none remain.
    ///
    /// # Errors
    ///
    /// Returns the first [`WatcherError::UnwatchFailed`], leaving the rest
    /// of the table in place.
    pub fn deregister_all(&mut self) -> WatchResult {
        while let Some(id) = self.table.any() {
            self.deregister(id)?;
        }

        self.trigger_active = false;
        Ok(())
    }

    /// Drain the channel once and hand every classified event to `sink`.
    ///
    /// Events are dispatched in the order the kernel queued them, and only
    /// after the whole read has been decoded and classified: a failing tick
    /// delivers nothing. Returns the number of events delivered.
    ///
    /// # Errors
    ///
    /// Any channel, decode or lookup failure. None of them are retried; the
    /// caller is expected to stop the watcher.
    pub fn tick<K: EventSink + ?Sized>(&mut self, sink: &mut K) -> Result<usize> {
        self.stats.ticks += 1;

        let records = drain_available(&mut self.source, &mut self.buffer[..])?;
        if records.is_empty() {
            return Ok(0);
        }
        self.stats.records_read += records.len() as u64;

        let events = self.classify_batch(&records)?;
        self.apply_housekeeping(&records);

        let delivered = events.len();
        for event in events {
            tracing::debug!(kind = %event.kind, path = %event.path.display(), "File event");
            self.stats.record_event(event.kind);
            sink.deliver(event);
        }

        Ok(delivered)
    }

    fn classify_batch(&mut self, records: &[RawEventRecord]) -> Result<Vec<FileEvent>> {
        let mut events = Vec::with_capacity(records.len());
        let mut dropped = 0;
        for record in records {
            if self.retired.contains(&record.watch_id) {
                tracing::trace!(id = %record.watch_id, "Skipping record for removed watch");
                dropped += 1;
                continue;
            }

            match classify(record, &self.table)? {
                Some(event) => events.push(event),
                None => dropped += 1,
            }
        }
        self.stats.records_dropped += dropped;

        Ok(events)
    }

    /// React to kernel bookkeeping records that carry no file event.
    fn apply_housekeeping(&mut self, records: &[RawEventRecord]) {
        for record in records {
            if record.mask & IN_Q_OVERFLOW != 0 {
                self.stats.queue_overflows += 1;
                tracing::warn!("inotify queue overflowed, events were lost");
            }

            if record.mask & IN_IGNORED == 0 {
                continue;
            }

            // Last record the kernel sends for a watch we removed ourselves.
            if self.retired.remove(&record.watch_id) {
                continue;
            }

            // The kernel dropped the watch on its own (directory deleted or unmounted).
            if let Some(dir) = self.table.remove(record.watch_id) {
                tracing::info!(
                    path = %dir.display(),
                    id = %record.watch_id,
                    "Watch removed by kernel"
                );
                self.stop_trigger_if_idle();
            }
        }
    }

    fn stop_trigger_if_idle(&mut self) {
        if self.table.is_empty() {
            self.trigger_active = false;
        }
    }
}

/// Make `dir` absolute against the current directory and drop `.` and `..`
/// components lexically. Symlinks are not resolved.
fn absolute_dir(dir: &Path) -> io::Result<PathBuf> {
    let joined = if dir.is_absolute() {
        dir.to_path_buf()
    } else {
        std::env::current_dir()?.join(dir)
    };

    let mut out = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }

    Ok(out)
}

impl<S> std::fmt::Debug for FileWatcher<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileWatcher")
            .field("directories", &self.directories)
            .field("watches", &self.table.len())
            .field("trigger_active", &self.trigger_active)
            .finish_non_exhaustive()
    }
}
