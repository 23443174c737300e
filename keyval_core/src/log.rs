//! Structured logging setup.
//!
//! Initializes a global `tracing` subscriber from [`LoggingConfig`]. The
//! `RUST_LOG` environment variable, when set, takes precedence over the
//! configured level.

use std::sync::Once;

use tracing_subscriber::EnvFilter;

use crate::config::{LogLevel, LoggingConfig};

static INIT: Once = Once::new();

/// Initializes the logging system. Safe to call more than once; only the
/// first call has any effect.
pub fn init_logging(config: &LoggingConfig) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(level_directive(&config.level)));

        let _ = tracing_subscriber::fmt()
            .with_target(true)
            .with_env_filter(filter)
            .try_init();
    });
}

fn level_directive(level: &LogLevel) -> &'static str {
    match level {
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_directive() {
        assert_eq!(level_directive(&LogLevel::Error), "error");
        assert_eq!(level_directive(&LogLevel::Warn), "warn");
        assert_eq!(level_directive(&LogLevel::Info), "info");
        assert_eq!(level_directive(&LogLevel::Debug), "debug");
        assert_eq!(level_directive(&LogLevel::Trace), "trace");
    }

    #[test]
    fn test_init_is_idempotent() {
        let config = LoggingConfig::default();
        init_logging(&config);
        init_logging(&config);
    }
}
