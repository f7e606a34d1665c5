//! Ingress processing and the Outbound Filter (component 4.G): the only two
//! places a message crosses the trust boundary between client and bus.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::auth_cache::AuthCache;
use crate::auth_coordinator::AuthCoordinator;
use crate::error::BridgeResult;
use crate::frame::{BridgeEnvelope, ClientFrame, Direction};
use crate::hooks::BridgeHooks;
use crate::match_engine::MatchEngine;
use crate::reply_registry::ReplyAddressRegistry;
use crate::transport::{Bus, BusMessage, ClientSocket};

/// Processes client→bus frames: hook gate, Match Engine, Auth Coordinator,
/// reply-address bookkeeping, then dispatch.
pub struct IngressFilter {
    matcher: Arc<MatchEngine>,
    auth: Arc<AuthCoordinator>,
    replies: Arc<ReplyAddressRegistry>,
    hooks: Arc<dyn BridgeHooks>,
    bus: Arc<dyn Bus>,
}

impl IngressFilter {
    /// Build an ingress filter over the shared bridge-wide components.
    #[must_use]
    pub fn new(
        matcher: Arc<MatchEngine>,
        auth: Arc<AuthCoordinator>,
        replies: Arc<ReplyAddressRegistry>,
        hooks: Arc<dyn BridgeHooks>,
        bus: Arc<dyn Bus>,
    ) -> Self {
        Self {
            matcher,
            auth,
            replies,
            hooks,
            bus,
        }
    }

    /// Handle one `send` or `publish` frame.
    ///
    /// A dropped frame (hook veto, no match, missing/denied auth) is not an
    /// error — only a malformed frame (missing `body`) surfaces as one.
    pub async fn handle(
        &self,
        frame: &ClientFrame,
        is_send: bool,
        socket: &dyn ClientSocket,
    ) -> BridgeResult<()> {
        if !self.hooks.send_or_pub(socket.id(), frame) {
            debug!(address = %frame.address, "send_or_pub hook vetoed frame");
            return Ok(());
        }

        let Some(body) = &frame.body else {
            return Err(crate::error::BridgeError::Protocol(
                "send/publish frame missing body".to_string(),
            ));
        };

        let m = self
            .matcher
            .evaluate(Direction::Inbound, &frame.address, Some(body), &self.replies);
        if !m.does_match {
            debug!(address = %frame.address, "inbound frame rejected by match engine");
            return Ok(());
        }

        if m.requires_auth {
            let Some(session_id) = &frame.session_id else {
                debug!(address = %frame.address, "auth required but no session_id on frame");
                self.deny(socket).await?;
                return Ok(());
            };
            if !self.auth.authorise(frame, session_id, socket.id()).await {
                debug!(address = %frame.address, session_id, "authorisation denied");
                self.deny(socket).await?;
                return Ok(());
            }
        }

        if let Some(reply_address) = &frame.reply_address {
            self.replies.add(reply_address.clone());
        }

        if is_send {
            let reply = self.bus.send(&frame.address, body.clone()).await?;
            if let Some(chained) = &reply.reply_address {
                self.replies.add(chained.clone());
            }
            if let Some(reply_to) = &frame.reply_address {
                let envelope = BridgeEnvelope {
                    address: reply_to.clone(),
                    body: reply.body,
                    reply_address: reply.reply_address,
                };
                socket.write_envelope(&envelope).await?;
            }
        } else {
            self.bus.publish(&frame.address, body.clone()).await?;
        }

        Ok(())
    }

    async fn deny(&self, socket: &dyn ClientSocket) -> BridgeResult<()> {
        socket.write_envelope(&BridgeEnvelope::denied()).await
    }
}

/// Filters one bus→client delivery before it is written to the socket
/// (component 4.G, outbound half). One instance is shared by every
/// subscription a session installs.
pub struct OutboundFilter {
    matcher: Arc<MatchEngine>,
    auth_cache: Arc<AuthCache>,
    replies: Arc<ReplyAddressRegistry>,
    hooks: Arc<dyn BridgeHooks>,
}

impl OutboundFilter {
    /// Build an outbound filter over the shared bridge-wide components.
    #[must_use]
    pub fn new(
        matcher: Arc<MatchEngine>,
        auth_cache: Arc<AuthCache>,
        replies: Arc<ReplyAddressRegistry>,
        hooks: Arc<dyn BridgeHooks>,
    ) -> Self {
        Self {
            matcher,
            auth_cache,
            replies,
            hooks,
        }
    }

    /// Apply the outbound filter to one bus delivery and, if it survives,
    /// write it to `socket`.
    pub async fn deliver(
        &self,
        address: &str,
        msg: BusMessage,
        socket: &dyn ClientSocket,
    ) -> BridgeResult<()> {
        let m = self
            .matcher
            .evaluate(Direction::Outbound, address, Some(&msg.body), &self.replies);
        if !m.does_match {
            debug!(%address, "outbound delivery rejected by match engine");
            return Ok(());
        }

        if m.requires_auth && !self.auth_cache.has_any_for_socket(socket.id()) {
            debug!(%address, "outbound delivery requires auth but socket has none cached");
            return Ok(());
        }

        let metadata_set: Vec<Value> = self
            .auth_cache
            .auths_for_socket(socket.id())
            .into_iter()
            .map(|a| a.metadata)
            .collect();
        if !self.hooks.apply_send_auth_rules(&metadata_set, address, &msg.body) {
            debug!(%address, "outbound delivery vetoed by apply_send_auth_rules hook");
            return Ok(());
        }

        if let Some(reply_address) = &msg.reply_address {
            self.replies.add(reply_address.clone());
        }

        let envelope = BridgeEnvelope {
            address: address.to_string(),
            body: msg.body,
            reply_address: msg.reply_address,
        };
        socket.write_envelope(&envelope).await
    }
}
