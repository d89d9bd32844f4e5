//! Logging setup for the operator.
//!
//! Environment variables:
//! - `UPBOUND_LOG_FORMAT`: `json`, `pretty` or `compact`. Defaults to
//!   `pretty` on a terminal and `json` otherwise.
//! - `UPBOUND_LOG_LEVEL` or `RUST_LOG`: filter directives, `info` when unset.
//! - `UPBOUND_LOG_LOCATION`: `true` to include file and line.

use anyhow::{Context, Result};
use std::env;
use std::str::FromStr;
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// JSON lines for log aggregation.
    Json,
    /// Multi-line human-readable output.
    Pretty,
    /// Single-line human-readable output.
    #[default]
    Compact,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            other => Err(format!("unknown log format: {other}")),
        }
    }
}

/// Pick the log format from an optional setting, falling back to pretty
/// output on a terminal and JSON otherwise.
fn select_log_format(setting: Option<&str>, is_terminal: bool) -> LogFormat {
    setting
        .and_then(|s| s.parse::<LogFormat>().ok())
        .unwrap_or(if is_terminal {
            LogFormat::Pretty
        } else {
            LogFormat::Json
        })
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    log_format: LogFormat,
    log_filter: String,
    include_location: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::default(),
            log_filter: "info".to_string(),
            include_location: false,
        }
    }
}

impl TracingConfig {
    /// Read the configuration from the environment.
    pub fn from_env() -> Self {
        let log_format = select_log_format(
            env::var("UPBOUND_LOG_FORMAT").ok().as_deref(),
            std::io::IsTerminal::is_terminal(&std::io::stdout()),
        );

        let log_filter = env::var("UPBOUND_LOG_LEVEL")
            .or_else(|_| env::var("RUST_LOG"))
            .unwrap_or_else(|_| "info".to_string());

        Self {
            log_format,
            log_filter,
            include_location: env::var("UPBOUND_LOG_LOCATION")
                .map(|s| s == "true" || s == "1")
                .unwrap_or(false),
        }
    }

    /// Override the log format.
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.log_format = format;
        self
    }

    /// Override the filter directives.
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.log_filter = filter.into();
        self
    }

    /// The log format.
    pub fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// The filter directives.
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }
}

/// Install the global tracing subscriber.
pub fn init_tracing(config: &TracingConfig) -> Result<()> {
    let filter = EnvFilter::try_new(config.log_filter()).unwrap_or_else(|_| EnvFilter::new("info"));
    let location = config.include_location;

    let result = match config.log_format() {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .with_file(location)
                    .with_line_number(location)
                    .with_span_events(FmtSpan::CLOSE)
                    .flatten_event(true),
            )
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .pretty()
                    .with_file(location)
                    .with_line_number(location),
            )
            .try_init(),
        LogFormat::Compact => tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .compact()
                    .with_file(location)
                    .with_line_number(location),
            )
            .try_init(),
    };

    result.context("Failed to initialize tracing subscriber")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_format_parsing() {
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("PRETTY".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert_eq!("Compact".parse::<LogFormat>().unwrap(), LogFormat::Compact);
        assert!("whatever".parse::<LogFormat>().is_err());
    }

    #[test]
    fn unknown_log_format_uses_auto_detection() {
        assert_eq!(select_log_format(Some("whatever"), false), LogFormat::Json);
        assert_eq!(select_log_format(Some("whatever"), true), LogFormat::Pretty);
        assert_eq!(select_log_format(None, false), LogFormat::Json);
        assert_eq!(select_log_format(Some("compact"), true), LogFormat::Compact);
    }

    #[test]
    fn builder_overrides() {
        let config = TracingConfig::default()
            .with_format(LogFormat::Json)
            .with_filter("debug,kube=info");

        assert_eq!(config.log_format(), LogFormat::Json);
        assert_eq!(config.log_filter(), "debug,kube=info");
    }
}
