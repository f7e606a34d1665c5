//! In-memory subject-addressed bus: fan-out publish via per-address
//! subscriber maps, and point-to-point request/reply via a bound responder
//! and a `oneshot` reply channel.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tracing::{trace, warn};

use astrid_bridge_core::error::{BridgeError, BridgeResult};
use astrid_bridge_core::transport::{Bus, BusMessage, BusReply, Subscription};

use crate::error::BusError;

/// Default mailbox capacity for both subscriber and responder channels.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Default timeout for a `send`'s reply, used when none is bound to the
/// target address or the responder never replies.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

struct PendingRequest {
    body: Value,
    reply_address: Option<String>,
    reply_tx: oneshot::Sender<BusReply>,
}

/// A single-process, subject-addressed bus. `publish` fans out to every
/// subscriber of an address; `send` delivers to the one responder bound to
/// an address and awaits its reply.
pub struct InMemoryBus {
    subscribers: DashMap<String, DashMap<u64, mpsc::Sender<BusMessage>>>,
    responders: DashMap<String, mpsc::Sender<PendingRequest>>,
    next_id: AtomicU64,
    request_timeout: Duration,
}

impl InMemoryBus {
    /// Build a bus with the default request timeout.
    #[must_use]
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_REQUEST_TIMEOUT)
    }

    /// Build a bus whose `send` calls time out after `timeout` if no reply
    /// arrives.
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            subscribers: DashMap::new(),
            responders: DashMap::new(),
            next_id: AtomicU64::new(0),
            request_timeout: timeout,
        }
    }

    /// Bind as the sole request/reply responder for `address`, replacing
    /// any previous binding (last bind wins, the same replacement rule the
    /// bridge itself uses for `register`).
    #[must_use]
    pub fn bind(&self, address: impl Into<String>) -> Responder {
        let (tx, rx) = mpsc::channel(DEFAULT_CHANNEL_CAPACITY);
        self.responders.insert(address.into(), tx);
        Responder { receiver: rx }
    }
}

impl Default for InMemoryBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Bus for InMemoryBus {
    async fn publish(&self, address: &str, body: Value) -> BridgeResult<()> {
        let Some(subs) = self.subscribers.get(address) else {
            trace!(%address, "publish with no subscribers");
            return Ok(());
        };
        for entry in subs.iter() {
            let msg = BusMessage {
                address: address.to_string(),
                body: body.clone(),
                reply_address: None,
            };
            if entry.value().try_send(msg).is_err() {
                warn!(%address, subscriber = entry.key(), "subscriber mailbox full or closed, dropping delivery");
            }
        }
        Ok(())
    }

    async fn send(&self, address: &str, body: Value) -> BridgeResult<BusReply> {
        let Some(responder) = self.responders.get(address).map(|r| r.clone()) else {
            return Err(BridgeError::Bus(
                BusError::NoResponder {
                    address: address.to_string(),
                }
                .to_string(),
            ));
        };

        let (reply_tx, reply_rx) = oneshot::channel();
        let request = PendingRequest {
            body,
            reply_address: None,
            reply_tx,
        };

        responder.send(request).await.map_err(|_| {
            BridgeError::Bus(
                BusError::ResponderGone {
                    address: address.to_string(),
                }
                .to_string(),
            )
        })?;

        match tokio::time::timeout(self.request_timeout, reply_rx).await {
            Ok(Ok(reply)) => Ok(reply),
            Ok(Err(_)) => Err(BridgeError::Bus(
                BusError::ResponderGone {
                    address: address.to_string(),
                }
                .to_string(),
            )),
            Err(_) => Err(BridgeError::Bus(
                BusError::Timeout {
                    address: address.to_string(),
                }
                .to_string(),
            )),
        }
    }

    async fn subscribe(&self, address: &str) -> BridgeResult<Subscription> {
        let (tx, rx) = mpsc::channel(DEFAULT_CHANNEL_CAPACITY);
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.subscribers
            .entry(address.to_string())
            .or_default()
            .insert(id, tx);
        Ok(Subscription { id, receiver: rx })
    }

    async fn unsubscribe(&self, address: &str, subscription_id: u64) -> BridgeResult<()> {
        if let Some(subs) = self.subscribers.get(address) {
            subs.remove(&subscription_id);
        }
        Ok(())
    }
}

/// The receiving half of a [`InMemoryBus::bind`] — a consumer's inbox for
/// point-to-point requests addressed to it.
pub struct Responder {
    receiver: mpsc::Receiver<PendingRequest>,
}

/// One inbound request awaiting a reply.
pub struct IncomingRequest {
    /// The request payload.
    pub body: Value,
    reply_tx: oneshot::Sender<BusReply>,
}

impl IncomingRequest {
    /// Reply with `body`, optionally registering a further reply address
    /// for a chained request/reply.
    pub fn reply(self, body: Value, reply_address: Option<String>) {
        let _ = self.reply_tx.send(BusReply { body, reply_address });
    }
}

impl Responder {
    /// Await the next inbound request.
    pub async fn recv(&mut self) -> Option<IncomingRequest> {
        let pending = self.receiver.recv().await?;
        Some(IncomingRequest {
            body: pending.body,
            reply_tx: pending.reply_tx,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn publish_with_no_subscribers_is_a_no_op() {
        let bus = InMemoryBus::new();
        bus.publish("foo", json!({})).await.unwrap();
    }

    #[tokio::test]
    async fn publish_reaches_subscriber() {
        let bus = InMemoryBus::new();
        let sub = bus.subscribe("foo").await.unwrap();
        let mut rx = sub.receiver;
        bus.publish("foo", json!({"x": 1})).await.unwrap();
        let msg = rx.recv().await.unwrap();
        assert_eq!(msg.body, json!({"x": 1}));
    }

    #[tokio::test]
    async fn unsubscribe_stops_delivery() {
        let bus = InMemoryBus::new();
        let sub = bus.subscribe("foo").await.unwrap();
        let id = sub.id;
        let mut rx = sub.receiver;
        bus.unsubscribe("foo", id).await.unwrap();
        bus.publish("foo", json!({})).await.unwrap();
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn send_without_responder_is_an_error() {
        let bus = InMemoryBus::new();
        assert!(bus.send("nope", json!({})).await.is_err());
    }

    #[tokio::test]
    async fn send_round_trips_through_a_bound_responder() {
        let bus = Arc::new(InMemoryBus::new());
        let mut responder = bus.bind("auth");

        let bus_clone = Arc::clone(&bus);
        tokio::spawn(async move {
            if let Some(req) = responder.recv().await {
                assert_eq!(req.body, json!({"sessionID": "s1"}));
                req.reply(json!({"status": "ok"}), None);
            }
            drop(bus_clone);
        });

        let reply = bus.send("auth", json!({"sessionID": "s1"})).await.unwrap();
        assert_eq!(reply.body, json!({"status": "ok"}));
    }

    #[tokio::test(start_paused = true)]
    async fn send_times_out_when_responder_never_replies() {
        let bus = InMemoryBus::with_timeout(Duration::from_millis(50));
        let _responder = bus.bind("auth");

        let send = bus.send("auth", json!({}));
        tokio::pin!(send);

        tokio::select! {
            result = &mut send => panic!("unexpected early completion: {result:?}"),
            () = tokio::time::sleep(Duration::from_millis(10)) => {}
        }

        tokio::time::advance(Duration::from_millis(60)).await;
        let result = send.await;
        assert!(result.is_err());
    }
}
