//! Config file and environment loading.
//!
//! Single-layer precedence: `file → env → built-in defaults`. The bridge
//! has no workspace/user/system distinction to preserve, so each layer is
//! applied once rather than merged across several candidate paths.

use std::path::Path;

use tracing::debug;

use crate::error::{ConfigError, ConfigResult};
use crate::types::BridgeConfig;
use crate::validate;

const ENV_AUTH_TIMEOUT_MS: &str = "ASTRID_BRIDGE_AUTH_TIMEOUT_MS";
const ENV_AUTH_ADDRESS: &str = "ASTRID_BRIDGE_AUTH_ADDRESS";

/// Load a [`BridgeConfig`] from `path` (if given), apply `ASTRID_BRIDGE_*`
/// environment overrides, and validate the result.
///
/// # Errors
///
/// Returns a [`ConfigError`] if the file cannot be read or parsed, an
/// environment override cannot be parsed into its field's type, or the
/// final configuration fails validation.
pub fn load(path: Option<&Path>) -> ConfigResult<BridgeConfig> {
    let mut config = match path {
        Some(path) => load_file(path)?,
        None => {
            debug!("no config file given, starting from built-in defaults");
            BridgeConfig::default()
        }
    };

    apply_env_overrides(&mut config)?;
    validate::validate(&config)?;
    Ok(config)
}

/// Parse a [`BridgeConfig`] from a single TOML file, with no environment
/// overrides or validation applied.
///
/// # Errors
///
/// Returns a [`ConfigError`] if the file cannot be read or parsed.
pub fn load_file(path: &Path) -> ConfigResult<BridgeConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.display().to_string(),
        source: e,
    })?;
    toml::from_str(&content).map_err(|e| ConfigError::ParseError {
        path: path.display().to_string(),
        source: e,
    })
}

fn apply_env_overrides(config: &mut BridgeConfig) -> ConfigResult<()> {
    if let Ok(raw) = std::env::var(ENV_AUTH_TIMEOUT_MS) {
        config.auth_timeout_ms = raw.parse().map_err(|_| ConfigError::EnvError {
            var: ENV_AUTH_TIMEOUT_MS.to_string(),
            message: format!("{raw:?} is not a valid u64"),
        })?;
    }
    if let Ok(raw) = std::env::var(ENV_AUTH_ADDRESS) {
        config.auth_address = raw;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_path_uses_defaults() {
        let config = load(None).unwrap();
        assert_eq!(config.auth_address, astrid_bridge_core::DEFAULT_AUTH_ADDRESS);
    }

    #[test]
    fn file_values_are_applied() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"auth_timeout_ms = 1000"#).unwrap();
        let config = load(Some(file.path())).unwrap();
        assert_eq!(config.auth_timeout_ms, 1000);
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "not valid toml {{{{").unwrap();
        let err = load(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn invalid_rule_in_file_fails_validation() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            [[inbound_permitted]]
            address = "foo"
            address_re = "foo.*"
            "#
        )
        .unwrap();
        let err = load(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { .. }));
    }
}
