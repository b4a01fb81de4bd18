//! Configuration settings and validation.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Duration;

use crate::watcher::driver::DEFAULT_POLL_INTERVAL;
use crate::{Error, Result};

/// Longest accepted drain interval.
const MAX_POLL_INTERVAL: Duration = Duration::from_secs(60);

/// Main configuration for the dirwatch binary.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directories to watch.
    pub watch_dirs: Vec<PathBuf>,

    /// Time between drains of the notification channel.
    pub poll_interval: Duration,

    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit logs as JSON.
    pub log_json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            watch_dirs: Vec::new(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            log_level: "info".to_string(),
            log_json: false,
        }
    }
}

impl Config {
    /// Create a new configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration value is invalid.
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval.is_zero() {
            return Err(Error::config("poll interval cannot be 0"));
        }

        if self.poll_interval > MAX_POLL_INTERVAL {
            return Err(Error::config(format!(
                "poll interval cannot exceed {}s",
                MAX_POLL_INTERVAL.as_secs()
            )));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(Error::config(format!(
                "invalid log level '{}', must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            )));
        }

        if self.watch_dirs.iter().any(|d| d.as_os_str().is_empty()) {
            return Err(Error::config("watch directory cannot be empty"));
        }

        Ok(())
    }

    /// Watched directories as a set.
    #[must_use]
    pub fn watched_set(&self) -> BTreeSet<PathBuf> {
        self.watch_dirs.iter().cloned().collect()
    }
}
