//! Configuration error types.

use thiserror::Error;

/// Errors that can occur while loading or validating a [`crate::BridgeConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        /// Path that could not be read.
        path: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The config file could not be parsed as TOML.
    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        /// Path that failed to parse.
        path: String,
        /// Underlying TOML error.
        #[source]
        source: toml::de::Error,
    },

    /// An environment variable override could not be parsed into the
    /// expected field type.
    #[error("invalid value for environment variable {var}: {message}")]
    EnvError {
        /// Name of the offending environment variable.
        var: String,
        /// Description of why the value was rejected.
        message: String,
    },

    /// The merged configuration failed validation.
    #[error("validation failed for {field}: {message}")]
    ValidationError {
        /// Dotted field path that failed validation.
        field: String,
        /// Description of the violated constraint.
        message: String,
    },
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
