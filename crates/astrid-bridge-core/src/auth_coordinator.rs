//! Auth Coordinator (component 4.D): resolves whether an auth-requiring
//! frame is authorised, consulting the cache before delegating to the bus's
//! auth authority.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error, warn};

use crate::auth_cache::AuthCache;
use crate::frame::ClientFrame;
use crate::hooks::BridgeHooks;
use crate::transport::{Bus, SocketId};

/// Default bus subject the auth authority listens on.
pub const DEFAULT_AUTH_ADDRESS: &str = "vertx.basicauthmanager.authorise";

/// Resolves authorisation for inbound frames whose matched rule set
/// `requires_auth`, backed by an [`AuthCache`] and a bus-delegated
/// auth authority round trip.
pub struct AuthCoordinator {
    cache: Arc<AuthCache>,
    bus: Arc<dyn Bus>,
    hooks: Arc<dyn BridgeHooks>,
    auth_address: String,
}

impl AuthCoordinator {
    /// Build a coordinator over the given cache, bus and hook set.
    #[must_use]
    pub fn new(
        cache: Arc<AuthCache>,
        bus: Arc<dyn Bus>,
        hooks: Arc<dyn BridgeHooks>,
        auth_address: impl Into<String>,
    ) -> Self {
        Self {
            cache,
            bus,
            hooks,
            auth_address: auth_address.into(),
        }
    }

    /// Authorise `frame` for `session_id` on `socket`.
    ///
    /// A cache hit is re-consulted against [`BridgeHooks::apply_receive_auth_rules`]
    /// every time, even though the session id was already accepted once — the
    /// cached metadata may be judged against a different frame on each call.
    /// A cache miss delegates to the bus's auth authority and, on acceptance,
    /// populates the cache.
    pub async fn authorise(&self, frame: &ClientFrame, session_id: &str, socket: SocketId) -> bool {
        if let Some(auth) = self.cache.get(session_id) {
            let ok = self.hooks.apply_receive_auth_rules(frame, &auth.metadata);
            if !ok {
                debug!(session_id, "cached auth rejected by hook");
            }
            return ok;
        }

        let request = serde_json::to_value(frame).unwrap_or(Value::Null);
        let reply = match self.bus.send(&self.auth_address, request).await {
            Ok(reply) => reply,
            Err(err) => {
                error!(session_id, error = %err, "auth authority round trip failed");
                return false;
            }
        };

        let Value::Object(metadata) = reply.body else {
            warn!(session_id, "auth authority reply was not an object; treating as denial");
            return false;
        };

        let status_ok = metadata.get("status").and_then(Value::as_str) == Some("ok");
        if !status_ok {
            debug!(session_id, "auth authority denied session");
            return false;
        }

        let metadata_value = Value::Object(metadata);
        if !self.hooks.apply_receive_auth_rules(frame, &metadata_value) {
            debug!(session_id, "fresh auth rejected by hook");
            return false;
        }

        self.cache.put(session_id.to_string(), socket, metadata_value);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::NoopHooks;
    use astrid_bridge_test::MockBus;
    use serde_json::json;
    use std::time::Duration;

    fn frame(session_id: Option<&str>) -> ClientFrame {
        ClientFrame {
            kind: "send".to_string(),
            address: "foo".to_string(),
            body: Some(json!({})),
            reply_address: None,
            session_id: session_id.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn fresh_success_populates_cache() {
        let bus = Arc::new(MockBus::new());
        bus.script_reply(DEFAULT_AUTH_ADDRESS, json!({"status": "ok", "role": "admin"}));
        let cache = Arc::new(AuthCache::new(Duration::from_secs(300)));
        let coordinator = AuthCoordinator::new(
            Arc::clone(&cache),
            bus,
            Arc::new(NoopHooks),
            DEFAULT_AUTH_ADDRESS,
        );

        let sock = SocketId::new();
        let ok = coordinator.authorise(&frame(Some("s1")), "s1", sock).await;
        assert!(ok);
        assert!(cache.get("s1").is_some());
    }

    #[tokio::test]
    async fn fresh_denial_does_not_populate_cache() {
        let bus = Arc::new(MockBus::new());
        bus.script_reply(DEFAULT_AUTH_ADDRESS, json!({"status": "denied"}));
        let cache = Arc::new(AuthCache::new(Duration::from_secs(300)));
        let coordinator = AuthCoordinator::new(
            Arc::clone(&cache),
            bus,
            Arc::new(NoopHooks),
            DEFAULT_AUTH_ADDRESS,
        );

        let ok = coordinator
            .authorise(&frame(Some("s1")), "s1", SocketId::new())
            .await;
        assert!(!ok);
        assert!(cache.get("s1").is_none());
    }

    #[tokio::test]
    async fn cache_hit_skips_bus_round_trip() {
        let bus = Arc::new(MockBus::new());
        let cache = Arc::new(AuthCache::new(Duration::from_secs(300)));
        let sock = SocketId::new();
        cache.put("s1".to_string(), sock, json!({"role": "admin"}));
        let coordinator = AuthCoordinator::new(
            Arc::clone(&cache),
            Arc::clone(&bus),
            Arc::new(NoopHooks),
            DEFAULT_AUTH_ADDRESS,
        );

        let ok = coordinator.authorise(&frame(Some("s1")), "s1", sock).await;
        assert!(ok);
        assert_eq!(bus.send_count(DEFAULT_AUTH_ADDRESS), 0);
    }

    struct DenyReceive;
    impl BridgeHooks for DenyReceive {
        fn apply_receive_auth_rules(&self, _frame: &ClientFrame, _auth_metadata: &Value) -> bool {
            false
        }
    }

    #[tokio::test]
    async fn hook_veto_rejects_cache_hit() {
        let bus = Arc::new(MockBus::new());
        let cache = Arc::new(AuthCache::new(Duration::from_secs(300)));
        let sock = SocketId::new();
        cache.put("s1".to_string(), sock, json!({}));
        let coordinator = AuthCoordinator::new(cache, bus, Arc::new(DenyReceive), DEFAULT_AUTH_ADDRESS);

        let ok = coordinator.authorise(&frame(Some("s1")), "s1", sock).await;
        assert!(!ok);
    }

    #[tokio::test]
    async fn transport_failure_is_denial() {
        let bus = Arc::new(MockBus::new());
        bus.script_error(DEFAULT_AUTH_ADDRESS);
        let cache = Arc::new(AuthCache::new(Duration::from_secs(300)));
        let coordinator = AuthCoordinator::new(cache, bus, Arc::new(NoopHooks), DEFAULT_AUTH_ADDRESS);

        let ok = coordinator
            .authorise(&frame(Some("s1")), "s1", SocketId::new())
            .await;
        assert!(!ok);
    }
}
