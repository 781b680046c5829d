//! Tracing subscriber installation.

use ssr_core::{LogFormat, LoggingSettings};
use tracing_subscriber::{
    fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
    EnvFilter,
};

/// Errors raised while installing telemetry.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// The configured filter directive does not parse.
    #[error("invalid log filter '{directive}': {reason}")]
    InvalidFilter { directive: String, reason: String },

    /// A global subscriber is already installed.
    #[error("failed to install tracing subscriber: {0}")]
    Install(String),
}

/// Build the env filter. `RUST_LOG` wins over the configured level.
pub fn build_filter(logging: &LoggingSettings) -> Result<EnvFilter, TelemetryError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    EnvFilter::try_new(&logging.level).map_err(|err| TelemetryError::InvalidFilter {
        directive: logging.level.clone(),
        reason: err.to_string(),
    })
}

/// Install a global tracing subscriber using the provided logging settings.
///
/// Events are written to stderr.
pub fn init(logging: &LoggingSettings) -> Result<(), TelemetryError> {
    let env_filter = build_filter(logging)?;

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .with_writer(std::io::stderr)
            .boxed(),
        LogFormat::Human => fmt::layer()
            .compact()
            .with_target(true)
            .with_writer(std::io::stderr)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|err| TelemetryError::Install(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(level: &str) -> LoggingSettings {
        LoggingSettings {
            level: level.to_string(),
            format: LogFormat::Human,
        }
    }

    #[test]
    fn test_valid_directives() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        assert!(build_filter(&settings("info")).is_ok());
        assert!(build_filter(&settings("ssr_pipeline=debug,warn")).is_ok());
    }

    #[test]
    fn test_invalid_directive() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        let err = build_filter(&settings("ssr=verbose")).unwrap_err();
        assert!(matches!(err, TelemetryError::InvalidFilter { .. }));
    }
}
