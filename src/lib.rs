//! dirwatch
//!
//! Tick-driven directory watcher over Linux inotify. A [`FileWatcher`] owns a
//! non-blocking notification channel and a set of per-directory watches; each
//! drain tick decodes the queued kernel records and hands `Changed` /
//! `Removed` events to an [`EventSink`].

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod observability;
pub mod watcher;

pub use config::Config;
pub use error::{Error, Result};
pub use watcher::{EventKind, EventSink, FileEvent, FileWatcher};
