//! Traits for the two external collaborators the bridge is wired to: the
//! subject-addressed publish/subscribe bus and the client's duplex socket.
//!
//! Neither is part of the bridge's own correctness surface — concrete
//! adapters live in `astrid-bridge-bus` and `astrid-bridge-daemon`.

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::error::BridgeResult;
use crate::frame::BridgeEnvelope;

/// Identifies one connected client socket for the lifetime of its session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SocketId(pub Uuid);

impl SocketId {
    /// Allocate a fresh socket id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SocketId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SocketId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A message delivered to a subscriber of a bus address.
#[derive(Debug, Clone)]
pub struct BusMessage {
    /// The address the message was published/sent to.
    pub address: String,
    /// Message payload.
    pub body: Value,
    /// Address the publisher wants replies routed to, if any.
    pub reply_address: Option<String>,
}

/// The outcome of a point-to-point `send` that expected a reply.
#[derive(Debug, Clone)]
pub struct BusReply {
    /// Reply payload.
    pub body: Value,
    /// A further reply address nested in the reply, for chained request/reply.
    pub reply_address: Option<String>,
}

/// A live subscription on a bus address.
pub struct Subscription {
    /// Opaque handle used to unsubscribe later.
    pub id: u64,
    /// Receives every message published/sent to the subscribed address.
    pub receiver: mpsc::Receiver<BusMessage>,
}

/// The subject-addressed publish/subscribe bus the bridge forwards
/// approved traffic to and receives deliveries from.
#[async_trait]
pub trait Bus: Send + Sync {
    /// Fan-out publish: delivered to every current subscriber of `address`.
    async fn publish(&self, address: &str, body: Value) -> BridgeResult<()>;

    /// Point-to-point send that expects exactly one reply from whichever
    /// consumer is bound at `address`.
    async fn send(&self, address: &str, body: Value) -> BridgeResult<BusReply>;

    /// Subscribe to deliveries on `address`.
    async fn subscribe(&self, address: &str) -> BridgeResult<Subscription>;

    /// Remove a previously installed subscription.
    async fn unsubscribe(&self, address: &str, subscription_id: u64) -> BridgeResult<()>;
}

/// The client's duplex socket transport (framing, encoding and the physical
/// connection are someone else's concern — the bridge only ever writes
/// envelopes to it).
#[async_trait]
pub trait ClientSocket: Send + Sync {
    /// Identifies this socket for the lifetime of the session.
    fn id(&self) -> SocketId;

    /// Write one bridge→client envelope.
    async fn write_envelope(&self, envelope: &BridgeEnvelope) -> BridgeResult<()>;
}
