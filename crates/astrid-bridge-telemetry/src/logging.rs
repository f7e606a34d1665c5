//! Logging setup: an `EnvFilter`-driven subscriber with a choice of
//! human-readable or JSON output, configured via [`LogConfig`].

use tracing_subscriber::EnvFilter;

use crate::error::{TelemetryError, TelemetryResult};

/// Output encoding for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable, multi-line, for local/interactive use.
    #[default]
    Pretty,
    /// Single-line human-readable, for container logs.
    Compact,
    /// Structured JSON, for log aggregation.
    Json,
}

/// Where log lines are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogTarget {
    /// Standard output.
    #[default]
    Stdout,
    /// Standard error.
    Stderr,
}

/// Builds the `tracing_subscriber` configuration: a base level, additional
/// per-module directives, an output format, and a target stream.
#[derive(Debug, Clone)]
pub struct LogConfig {
    level: String,
    directives: Vec<String>,
    format: LogFormat,
    target: LogTarget,
}

impl LogConfig {
    /// Start from a base level (`"error"`, `"warn"`, `"info"`, `"debug"`,
    /// `"trace"`, or any `EnvFilter`-compatible directive string).
    #[must_use]
    pub fn new(level: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            directives: Vec::new(),
            format: LogFormat::default(),
            target: LogTarget::default(),
        }
    }

    /// Set the output format.
    #[must_use]
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Set the output target.
    #[must_use]
    pub fn with_target(mut self, target: LogTarget) -> Self {
        self.target = target;
        self
    }

    /// Append an additional per-module filter directive, e.g.
    /// `"astrid_bridge_core=trace"`.
    #[must_use]
    pub fn with_directive(mut self, directive: impl Into<String>) -> Self {
        self.directives.push(directive.into());
        self
    }

    fn env_filter(&self) -> TelemetryResult<EnvFilter> {
        let mut filter =
            EnvFilter::try_new(&self.level).map_err(|e| TelemetryError::ConfigError(e.to_string()))?;
        for directive in &self.directives {
            let directive = directive
                .parse()
                .map_err(|e: tracing_subscriber::filter::ParseError| {
                    TelemetryError::ConfigError(e.to_string())
                })?;
            filter = filter.add_directive(directive);
        }
        Ok(filter)
    }
}

/// Install a global `tracing` subscriber built from `config`.
///
/// # Errors
///
/// Returns [`TelemetryError::ConfigError`] if the level or a directive
/// fails to parse, or [`TelemetryError::InitError`] if a global subscriber
/// was already installed.
pub fn setup_logging(config: &LogConfig) -> TelemetryResult<()> {
    let filter = config.env_filter()?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let result = match (config.format, config.target) {
        (LogFormat::Json, LogTarget::Stdout) => builder.json().try_init(),
        (LogFormat::Json, LogTarget::Stderr) => builder.json().with_writer(std::io::stderr).try_init(),
        (LogFormat::Compact, LogTarget::Stdout) => builder.compact().try_init(),
        (LogFormat::Compact, LogTarget::Stderr) => {
            builder.compact().with_writer(std::io::stderr).try_init()
        }
        (LogFormat::Pretty, LogTarget::Stdout) => builder.try_init(),
        (LogFormat::Pretty, LogTarget::Stderr) => builder.with_writer(std::io::stderr).try_init(),
    };

    result.map_err(|e| TelemetryError::InitError(e.to_string()))
}

/// Install a global subscriber at `info` level with default formatting.
///
/// # Errors
///
/// Returns [`TelemetryError::InitError`] if a global subscriber was already
/// installed.
pub fn setup_default_logging() -> TelemetryResult<()> {
    setup_logging(&LogConfig::new("info"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_accumulates_directives() {
        let config = LogConfig::new("info")
            .with_format(LogFormat::Json)
            .with_directive("astrid_bridge_core=trace");
        let filter = config.env_filter().unwrap();
        assert!(filter.to_string().contains("astrid_bridge_core=trace"));
    }

    #[test]
    fn invalid_level_is_a_config_error() {
        let config = LogConfig::new("not_a_level!!");
        assert!(matches!(config.env_filter(), Err(TelemetryError::ConfigError(_))));
    }
}
