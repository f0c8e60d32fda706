//! Tracing subscriber bootstrap for hosts embedding the engine.

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::LoggingConfig;

/// Install a global tracing subscriber described by `config`.
///
/// `RUST_LOG` takes precedence over the configured level. Fails (rather than
/// panicking) if a global subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level)
            .with_context(|| format!("Invalid log level: {}", config.level))?,
    };

    let registry = tracing_subscriber::registry().with(env_filter);
    if config.format == "json" {
        registry
            .with(fmt::layer().json().with_target(true))
            .try_init()
            .context("Failed to install tracing subscriber")?;
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .try_init()
            .context("Failed to install tracing subscriber")?;
    }

    tracing::debug!("Logging initialized (level={}, format={})", config.level, config.format);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_an_error() {
        let config = LoggingConfig::default();
        // The first call may lose a race with another test binary's
        // subscriber; the second must always fail.
        let _ = init_logging(&config);
        assert!(init_logging(&config).is_err());
    }
}
