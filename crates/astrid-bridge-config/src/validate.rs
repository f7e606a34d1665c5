//! Post-load configuration validation.
//!
//! Validates a deserialized [`BridgeConfig`] against the invariants section
//! 6 of the permission model depends on, surfacing every violation rather
//! than stopping at the first `address_re` that fails to compile.

use regex::Regex;

use crate::error::{ConfigError, ConfigResult};
use crate::types::BridgeConfig;

/// Validate a fully-merged configuration.
///
/// # Errors
///
/// Returns the first validation error found: a `PermissionRule` setting
/// both `address` and `address_re`, or an `address_re` that fails to
/// compile as a regex.
pub fn validate(config: &BridgeConfig) -> ConfigResult<()> {
    validate_rules("inbound_permitted", &config.inbound_permitted)?;
    validate_rules("outbound_permitted", &config.outbound_permitted)?;
    Ok(())
}

fn validate_rules(list_name: &str, rules: &[astrid_bridge_core::PermissionRule]) -> ConfigResult<()> {
    for (i, rule) in rules.iter().enumerate() {
        if rule.address.is_some() && rule.address_re.is_some() {
            return Err(ConfigError::ValidationError {
                field: format!("{list_name}[{i}]"),
                message: "exactly one of `address` or `address_re` may be set, not both"
                    .to_string(),
            });
        }
        if let Some(pattern) = &rule.address_re {
            if let Err(source) = Regex::new(&format!("^(?:{pattern})$")) {
                return Err(ConfigError::ValidationError {
                    field: format!("{list_name}[{i}].address_re"),
                    message: format!("invalid regex {pattern:?}: {source}"),
                });
            }
        }
    }
    Ok(())
}
