//! Configuration struct definitions (section 6's configuration table).

use astrid_bridge_core::{PermissionRule, DEFAULT_AUTH_ADDRESS};
use serde::{Deserialize, Serialize};

/// The bridge's full configuration: the two permission lists, the auth
/// cache TTL, and the bus address of the auth authority.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Client→bus permission list. Empty means reject all inbound traffic.
    pub inbound_permitted: Vec<PermissionRule>,
    /// Bus→client permission list. Empty means reject all outbound traffic.
    pub outbound_permitted: Vec<PermissionRule>,
    /// TTL, in milliseconds, of a cached session authorisation.
    pub auth_timeout_ms: u64,
    /// Bus subject the auth authority listens on.
    pub auth_address: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            inbound_permitted: Vec::new(),
            outbound_permitted: Vec::new(),
            auth_timeout_ms: 300_000,
            auth_address: DEFAULT_AUTH_ADDRESS.to_string(),
        }
    }
}
