//! Structured logging setup.
//!
//! Uses `tracing-subscriber` with an `EnvFilter` (so `RUST_LOG` wins over the
//! configured level) and either a plain or a JSON formatter.

use tracing_subscriber::{
    filter::EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt, Registry,
};

/// Initialize tracing for the process.
///
/// Logs go to stderr so stdout stays free for event output.
///
/// # Panics
///
/// Panics if a global subscriber has already been installed in this process.
pub fn init_tracing(level: &str, json: bool) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if json {
        let json_layer = fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_file(true)
            .with_line_number(true);

        Registry::default().with(env_filter).with(json_layer).init();
    } else {
        let fmt_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_file(true)
            .with_line_number(true);

        Registry::default().with(env_filter).with(fmt_layer).init();
    }

    tracing::debug!("Tracing initialized: level={}, json={}", level, json);
}

#[cfg(test)]
mod tests {
    use super::*;

    // The only test in this binary that installs a global subscriber.
    #[test]
    fn test_init_tracing_installs_global_subscriber() {
        init_tracing("warn", true);
        assert!(tracing::dispatcher::has_been_set());
    }
}
