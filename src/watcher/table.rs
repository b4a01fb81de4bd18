//! Mapping between kernel watch identifiers and watched directories.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

/// Opaque watch identifier handed out by the kernel on registration.
///
/// Unique among active watches; the kernel may reuse a value once its watch
/// has been removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct WatchId(i32);

impl WatchId {
    /// Wrap a raw kernel watch descriptor.
    #[must_use]
    pub const fn new(raw: i32) -> Self {
        Self(raw)
    }

    /// The raw kernel watch descriptor.
    #[must_use]
    pub const fn get(self) -> i32 {
        self.0
    }
}

impl fmt::Display for WatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Active watches, keyed by identifier.
#[derive(Debug, Default)]
pub struct WatchTable {
    entries: HashMap<WatchId, PathBuf>,
}

impl WatchTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a watch. Returns the directory previously bound to `id`, if any.
    pub fn insert(&mut self, id: WatchId, dir: PathBuf) -> Option<PathBuf> {
        self.entries.insert(id, dir)
    }

    /// Drop a watch, returning the directory it covered.
    pub fn remove(&mut self, id: WatchId) -> Option<PathBuf> {
        self.entries.remove(&id)
    }

    /// Directory watched under `id`.
    #[must_use]
    pub fn resolve(&self, id: WatchId) -> Option<&Path> {
        self.entries.get(&id).map(PathBuf::as_path)
    }

    /// Any one active watch, used to drain the table entry by entry.
    #[must_use]
    pub fn any(&self) -> Option<WatchId> {
        self.entries.keys().next().copied()
    }

    /// Identifier currently watching `dir`.
    #[must_use]
    pub fn id_for(&self, dir: &Path) -> Option<WatchId> {
        self.entries
            .iter()
            .find_map(|(id, path)| (path == dir).then_some(*id))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
