//! # silvertone-logging
//!
//! Structured logging with `tracing`.
//!
//! One stdout layer, either human-readable or JSON, filtered by `RUST_LOG`
//! when set and by the configured [`LogLevel`] otherwise.

#![deny(unsafe_code)]

pub mod types;

pub use types::{LogFormat, LogLevel};

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Crates whose chatter is capped at `warn` unless `RUST_LOG` says otherwise.
const QUIET_TARGETS: &[&str] = &["ort", "hyper", "h2", "tokenizers", "symphonia"];

/// Errors from subscriber installation.
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    /// A global subscriber was already installed.
    #[error("failed to install tracing subscriber: {0}")]
    Init(String),
}

/// Build the filter directive string for a base level.
pub fn default_directives(level: LogLevel) -> String {
    let mut directives = level.as_filter_str().to_string();
    for target in QUIET_TARGETS {
        directives.push_str(&format!(",{target}=warn"));
    }
    directives
}

/// `RUST_LOG` when present, otherwise [`default_directives`].
pub fn build_filter(level: LogLevel) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives(level)))
}

/// Install the global subscriber. Call once at startup.
pub fn init_subscriber(level: LogLevel, format: LogFormat) -> Result<(), LoggingError> {
    let (json_layer, pretty_layer) = match format {
        LogFormat::Json => (
            Some(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_current_span(true)
                    .with_span_list(false),
            ),
            None,
        ),
        LogFormat::Pretty => (None, Some(tracing_subscriber::fmt::layer().with_target(true))),
    };

    tracing_subscriber::registry()
        .with(build_filter(level))
        .with(json_layer)
        .with(pretty_layer)
        .try_init()
        .map_err(|e| LoggingError::Init(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directives_start_with_level() {
        let d = default_directives(LogLevel::Debug);
        assert!(d.starts_with("debug,"), "got {d}");
    }

    #[test]
    fn directives_quiet_inference_crates() {
        let d = default_directives(LogLevel::Info);
        assert!(d.contains("ort=warn"));
        assert!(d.contains("tokenizers=warn"));
    }

    #[test]
    fn directives_parse_as_filter() {
        let d = default_directives(LogLevel::Trace);
        assert!(EnvFilter::try_new(d).is_ok());
    }
}
