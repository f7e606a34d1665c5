//! Hook Interface (component 4.I): optional policy callbacks consulted at
//! every decision point. Absent hooks behave as if every boolean hook
//! answered yes and every void hook did nothing.

use serde_json::Value;

use crate::frame::ClientFrame;
use crate::transport::SocketId;

/// Policy hooks a bridge owner can install around the decision points in
/// the Frame Dispatcher, Subscription Registry and Outbound Filter.
///
/// Every method has a default implementation matching the no-hook
/// behaviour, so a policy only needs to override what it cares about.
pub trait BridgeHooks: Send + Sync {
    /// Called once a socket's session has torn down.
    fn socket_closed(&self, _socket: SocketId) {}

    /// Gate on every `send`/`publish` frame before the Match Engine runs.
    fn send_or_pub(&self, _socket: SocketId, _frame: &ClientFrame) -> bool {
        true
    }

    /// Gate a `register` frame before the subscription is installed.
    fn pre_register(&self, _socket: SocketId, _address: &str) -> bool {
        true
    }

    /// Notified after a subscription has been installed.
    fn post_register(&self, _socket: SocketId, _address: &str) {}

    /// Gate an `unregister` frame before the subscription is removed.
    fn unregister(&self, _socket: SocketId, _address: &str) -> bool {
        true
    }

    /// Gate an outbound delivery against the aggregate metadata of every
    /// auth currently cached for the receiving socket.
    fn apply_send_auth_rules(&self, _metadata_set: &[Value], _address: &str, _body: &Value) -> bool {
        true
    }

    /// Gate an inbound message against the metadata of its (cached or
    /// freshly granted) authorisation. Consulted on every auth-requiring
    /// send, including cache hits.
    fn apply_receive_auth_rules(&self, _frame: &ClientFrame, _auth_metadata: &Value) -> bool {
        true
    }
}

/// The default policy: every gate passes, every notification is ignored.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHooks;

impl BridgeHooks for NoopHooks {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn noop_hooks_permit_everything() {
        let hooks = NoopHooks;
        let frame = ClientFrame {
            kind: "send".to_string(),
            address: "foo".to_string(),
            body: Some(json!({})),
            reply_address: None,
            session_id: None,
        };
        let sock = SocketId::new();
        assert!(hooks.send_or_pub(sock, &frame));
        assert!(hooks.pre_register(sock, "foo"));
        assert!(hooks.unregister(sock, "foo"));
        assert!(hooks.apply_send_auth_rules(&[], "foo", &json!({})));
        assert!(hooks.apply_receive_auth_rules(&frame, &json!({})));
        hooks.post_register(sock, "foo");
        hooks.socket_closed(sock);
    }

    struct DenyAll;
    impl BridgeHooks for DenyAll {
        fn send_or_pub(&self, _socket: SocketId, _frame: &ClientFrame) -> bool {
            false
        }
    }

    #[test]
    fn overriding_one_hook_leaves_others_default() {
        let hooks = DenyAll;
        let frame = ClientFrame {
            kind: "send".to_string(),
            address: "foo".to_string(),
            body: Some(json!({})),
            reply_address: None,
            session_id: None,
        };
        assert!(!hooks.send_or_pub(SocketId::new(), &frame));
        assert!(hooks.pre_register(SocketId::new(), "foo"));
    }
}
