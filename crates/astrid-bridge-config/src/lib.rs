//! Configuration loading for the event-bus bridge.
//!
//! Loads a [`BridgeConfig`] from a single TOML file plus `ASTRID_BRIDGE_*`
//! environment overrides, validating both permission lists before the
//! bridge starts rather than surfacing a bad `address_re` at first match.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod error;
mod loader;
mod types;
mod validate;

pub use error::{ConfigError, ConfigResult};
pub use types::BridgeConfig;

impl BridgeConfig {
    /// Load configuration from `path` (or built-in defaults if `None`),
    /// apply environment overrides, and validate the result.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file cannot be read or parsed, an
    /// environment override is malformed, or validation fails.
    pub fn load(path: Option<&std::path::Path>) -> ConfigResult<Self> {
        loader::load(path)
    }

    /// Load configuration from a single file with no environment overrides
    /// or validation applied.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file cannot be read or parsed.
    pub fn load_file(path: &std::path::Path) -> ConfigResult<Self> {
        loader::load_file(path)
    }
}
