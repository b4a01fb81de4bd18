//! Error types and Result aliases for dirwatch.
//!
//! Fatal drain-time failures (channel, decode, lookup) surface as [`Error`].
//! Per-directory registration problems are reported as [`WatcherError`] so
//! callers can decide whether to keep going.

use std::io;

use thiserror::Error;

use crate::watcher::WatchId;

/// Result type alias using dirwatch's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for dirwatch operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Notification channel error.
    #[error("channel error: {0}")]
    Channel(#[from] ChannelError),

    /// Record decoding error.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Watch bookkeeping error.
    #[error("watcher error: {0}")]
    Watcher(#[from] WatcherError),
}

/// Notification channel errors.
#[derive(Error, Debug)]
pub enum ChannelError {
    /// The kernel refused to allocate a notification channel.
    #[error("failed to open notification channel: {0}")]
    Init(#[source] io::Error),

    /// A read failed for a reason other than "no data available".
    #[error("failed to read from notification channel: {0}")]
    Read(#[source] io::Error),

    /// The channel reported something a non-blocking inotify descriptor never should.
    #[error("protocol violation: {0}")]
    ProtocolViolation(String),
}

/// Record decoding errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum DecodeError {
    /// A record header or its name extends past the bytes that were read.
    #[error("malformed record at offset {offset}: needs {needed} bytes, {available} available")]
    Malformed {
        offset: usize,
        needed: usize,
        available: usize,
    },
}

/// Watch registration and lookup errors.
#[derive(Error, Debug)]
pub enum WatcherError {
    /// The kernel refused to add a watch.
    #[error("failed to watch path '{path}': {reason}")]
    WatchFailed { path: String, reason: String },

    /// The kernel refused to remove a watch.
    #[error("failed to remove watch {id}: {reason}")]
    UnwatchFailed { id: WatchId, reason: String },

    /// A record referenced a watch the table does not know about.
    #[error("no directory registered for watch {0}")]
    UnknownWatch(WatchId),
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether the watcher can keep running after this error.
    ///
    /// Only per-directory registration failures are recoverable; everything
    /// raised from a drain cycle means the watcher should be stopped.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Watcher(WatcherError::WatchFailed { .. } | WatcherError::UnwatchFailed { .. })
        )
    }
}

impl WatcherError {
    /// Create a watch-failed error.
    pub fn watch_failed(path: impl Into<String>, reason: impl ToString) -> Self {
        Self::WatchFailed {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Create an unwatch-failed error.
    pub fn unwatch_failed(id: WatchId, reason: impl ToString) -> Self {
        Self::UnwatchFailed {
            id,
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests;
