//! Wire-level data model: client frames, bridge envelopes and permission rules.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The bus address the bridge delivers denial notices on.
pub const CLIENT_AUTH_ADDRESS: &str = "client.auth";

/// Direction a [`PermissionRule`] applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Client → bus.
    Inbound,
    /// Bus → client.
    Outbound,
}

/// A single permission rule. Exactly one of `address`/`address_re` is expected
/// to be set; both absent means "any address".
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PermissionRule {
    /// Literal address this rule matches.
    #[serde(default)]
    pub address: Option<String>,
    /// Regex source this rule matches (full match, not search).
    #[serde(default)]
    pub address_re: Option<String>,
    /// Body field constraints; only applied when the body is a JSON object.
    #[serde(default)]
    pub r#match: Option<HashMap<String, Value>>,
    /// Whether a message matching this rule must carry a cached or fresh authorisation.
    #[serde(default)]
    pub requires_auth: bool,
}

impl PermissionRule {
    /// Build a rule that matches any body on a fixed literal address.
    #[must_use]
    pub fn on_address(address: impl Into<String>) -> Self {
        Self {
            address: Some(address.into()),
            address_re: None,
            r#match: None,
            requires_auth: false,
        }
    }

    /// Require authorisation for this rule.
    #[must_use]
    pub fn requiring_auth(mut self) -> Self {
        self.requires_auth = true;
        self
    }

    /// Constrain the body with the given field/value pairs.
    #[must_use]
    pub fn matching(mut self, fields: HashMap<String, Value>) -> Self {
        self.r#match = Some(fields);
        self
    }
}

/// A frame sent by the client over the duplex socket.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClientFrame {
    /// One of `send`, `publish`, `register`, `unregister`.
    #[serde(rename = "type")]
    pub kind: String,
    /// The bus address this frame targets.
    pub address: String,
    /// Message payload; required for `send`/`publish`.
    #[serde(default)]
    pub body: Option<Value>,
    /// Address the bus should route a reply to; `send` only.
    #[serde(default, rename = "replyAddress")]
    pub reply_address: Option<String>,
    /// Client-supplied session identifier, required when a matching rule sets `requires_auth`.
    #[serde(default, rename = "sessionID")]
    pub session_id: Option<String>,
}

/// Envelope the bridge writes back to the client socket.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BridgeEnvelope {
    /// The bus address the message arrived on.
    pub address: String,
    /// Message payload.
    pub body: Value,
    /// Reply address carried by the bus message, if any.
    #[serde(default, rename = "replyAddress", skip_serializing_if = "Option::is_none")]
    pub reply_address: Option<String>,
}

impl BridgeEnvelope {
    /// Build the denial envelope delivered on [`CLIENT_AUTH_ADDRESS`].
    #[must_use]
    pub fn denied() -> Self {
        Self {
            address: CLIENT_AUTH_ADDRESS.to_string(),
            body: serde_json::json!({ "status": "denied" }),
            reply_address: None,
        }
    }
}
