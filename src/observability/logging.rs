//! # Structured Logging
//!
//! Span macros and subscriber setup using the tracing ecosystem.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;
use crate::errors::{Result, StackError};

/// Create a tracing span for one stack build.
///
/// ```rust,ignore
/// let span = build_span!(group.id);
/// let span = build_span!(group.id, members = group.members.len());
/// ```
#[macro_export]
macro_rules! build_span {
    ($group:expr) => {
        tracing::info_span!("stack_build", group = %$group)
    };
    ($group:expr, $($field:tt)*) => {
        tracing::info_span!("stack_build", group = %$group, $($field)*)
    };
}

/// Install a global fmt subscriber. `RUST_LOG` takes precedence over the configured
/// level. A subscriber installed earlier is left in place.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    config.validate()?;

    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level)
            .map_err(|e| StackError::config(format!("Invalid log level: {}", e)))?,
    };

    let registry = tracing_subscriber::registry().with(filter);
    let installed = if config.json {
        registry.with(tracing_subscriber::fmt::layer().json()).try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()
    };

    if installed.is_err() {
        tracing::debug!("global subscriber already installed, keeping it");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_span_compiles() {
        let _span = build_span!("ns-1/ing-1");
        let _span = build_span!("ns-1/ing-1", members = 2);
    }

    #[test]
    fn test_init_logging_twice_is_ok() {
        let config = LoggingConfig::default();
        assert!(init_logging(&config).is_ok());
        assert!(init_logging(&LoggingConfig { json: true, ..config }).is_ok());
    }

    #[test]
    fn test_init_logging_rejects_empty_level() {
        let config = LoggingConfig { level: String::new(), json: false };
        assert!(init_logging(&config).is_err());
    }
}
