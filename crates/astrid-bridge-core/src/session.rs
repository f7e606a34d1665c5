//! Bridge Session (component 4.H): per-socket lifecycle wiring the Match
//! Engine, Auth Coordinator, Subscription Registry, Frame Dispatcher and
//! Outbound Filter, and owning their teardown on socket close.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info_span, warn, Instrument};

use crate::auth_cache::AuthCache;
use crate::auth_coordinator::AuthCoordinator;
use crate::dispatcher::FrameDispatcher;
use crate::hooks::{BridgeHooks, NoopHooks};
use crate::match_engine::MatchEngine;
use crate::outbound::{IngressFilter, OutboundFilter};
use crate::reply_registry::{ReplyAddressRegistry, DEFAULT_REPLY_TIMEOUT};
use crate::transport::{Bus, ClientSocket};

/// Bridge-wide state and configuration shared by every session. One
/// instance per bridge; sessions borrow it through `Arc`s.
pub struct BridgeShared {
    matcher: Arc<MatchEngine>,
    auth_cache: Arc<AuthCache>,
    replies: Arc<ReplyAddressRegistry>,
    hooks: Arc<dyn BridgeHooks>,
    bus: Arc<dyn Bus>,
    auth_address: String,
}

impl BridgeShared {
    /// Build the bridge-wide state: compiled match engine, empty auth cache
    /// and reply registry with the given TTLs, and the policy hooks (or
    /// [`NoopHooks`] if none are supplied).
    #[must_use]
    pub fn new(
        matcher: MatchEngine,
        bus: Arc<dyn Bus>,
        auth_timeout: Duration,
        auth_address: impl Into<String>,
        hooks: Option<Arc<dyn BridgeHooks>>,
    ) -> Self {
        Self {
            matcher: Arc::new(matcher),
            auth_cache: Arc::new(AuthCache::new(auth_timeout)),
            replies: Arc::new(ReplyAddressRegistry::new(DEFAULT_REPLY_TIMEOUT)),
            hooks: hooks.unwrap_or_else(|| Arc::new(NoopHooks)),
            bus,
            auth_address: auth_address.into(),
        }
    }

    /// Begin a session for a newly connected socket.
    #[must_use]
    pub fn new_session(self: &Arc<Self>, socket: Arc<dyn ClientSocket>) -> BridgeSession {
        let auth = Arc::new(AuthCoordinator::new(
            Arc::clone(&self.auth_cache),
            Arc::clone(&self.bus),
            Arc::clone(&self.hooks),
            self.auth_address.clone(),
        ));
        let ingress = IngressFilter::new(
            Arc::clone(&self.matcher),
            auth,
            Arc::clone(&self.replies),
            Arc::clone(&self.hooks),
            Arc::clone(&self.bus),
        );
        let outbound = Arc::new(OutboundFilter::new(
            Arc::clone(&self.matcher),
            Arc::clone(&self.auth_cache),
            Arc::clone(&self.replies),
            Arc::clone(&self.hooks),
        ));
        let subscriptions = Arc::new(crate::subscriptions::SubscriptionRegistry::new(
            Arc::clone(&socket),
            Arc::clone(&self.bus),
            outbound,
            Arc::clone(&self.hooks),
        ));
        let dispatcher = Arc::new(FrameDispatcher::new(ingress));

        BridgeSession {
            socket,
            dispatcher,
            subscriptions,
            auth_cache: Arc::clone(&self.auth_cache),
            hooks: Arc::clone(&self.hooks),
        }
    }
}

/// One client socket's live session. Created on connect, torn down on close.
pub struct BridgeSession {
    socket: Arc<dyn ClientSocket>,
    dispatcher: Arc<FrameDispatcher>,
    subscriptions: Arc<crate::subscriptions::SubscriptionRegistry>,
    auth_cache: Arc<AuthCache>,
    hooks: Arc<dyn BridgeHooks>,
}

impl BridgeSession {
    /// Handle one raw frame read off the socket.
    ///
    /// Spawns the frame's processing as an independent task so that a
    /// suspended auth round trip for one frame does not block the next
    /// frame from the same socket — the reference bridge interleaves rather
    /// than serialising inbound frames.
    pub fn handle_frame(&self, raw: String) {
        let socket_id = self.socket.id();
        let dispatcher = Arc::clone(&self.dispatcher);
        let subscriptions = Arc::clone(&self.subscriptions);
        let socket = Arc::clone(&self.socket);
        let span = info_span!("bridge_frame", socket = %socket_id);
        tokio::spawn(
            async move {
                if let Err(err) = dispatcher.dispatch(&raw, socket.as_ref(), &subscriptions).await {
                    warn!(error = %err, "frame dispatch failed");
                }
            }
            .instrument(span),
        );
    }

    /// Tear down the session: close every installed subscription, cancel
    /// every auth this socket owns, then notify the `socketClosed` hook.
    pub async fn close(&self) {
        let socket_id = self.socket.id();
        self.subscriptions.close_all().await;
        self.auth_cache.cancel_all_for(socket_id);
        self.hooks.socket_closed(socket_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::PermissionRule;
    use astrid_bridge_test::{MockBus, MockClientSocket};
    use serde_json::json;

    fn shared(matcher: MatchEngine, bus: Arc<MockBus>) -> Arc<BridgeShared> {
        Arc::new(BridgeShared::new(
            matcher,
            bus as Arc<dyn Bus>,
            Duration::from_secs(300),
            "vertx.basicauthmanager.authorise",
            None,
        ))
    }

    #[tokio::test]
    async fn approved_send_reaches_the_bus() {
        let bus = Arc::new(MockBus::new());
        let shared = shared(
            MatchEngine::new(vec![PermissionRule::on_address("foo")], vec![]).unwrap(),
            Arc::clone(&bus),
        );
        bus.script_reply("foo", json!({}));
        let socket = Arc::new(MockClientSocket::new());
        let session = shared.new_session(socket.clone() as Arc<dyn ClientSocket>);

        session.handle_frame(r#"{"type":"send","address":"foo","body":{"x":1}}"#.to_string());
        tokio::task::yield_now().await;
        tokio::task::yield_now().await;

        assert_eq!(bus.send_count("foo"), 1);
    }

    #[tokio::test]
    async fn close_cancels_auths_and_subscriptions() {
        let bus = Arc::new(MockBus::new());
        let shared = shared(
            MatchEngine::new(vec![], vec![PermissionRule::on_address("bar")]).unwrap(),
            Arc::clone(&bus),
        );
        let socket = Arc::new(MockClientSocket::new());
        let session = shared.new_session(socket.clone() as Arc<dyn ClientSocket>);

        session.handle_frame(r#"{"type":"register","address":"bar"}"#.to_string());
        tokio::task::yield_now().await;
        tokio::task::yield_now().await;
        assert_eq!(bus.subscriber_count("bar"), 1);

        session.close().await;
        assert_eq!(bus.subscriber_count("bar"), 0);
    }
}
