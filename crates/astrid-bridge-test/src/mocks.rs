//! Mock implementations for testing.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;

use astrid_bridge_core::error::{BridgeError, BridgeResult};
use astrid_bridge_core::frame::BridgeEnvelope;
use astrid_bridge_core::transport::{Bus, BusMessage, BusReply, ClientSocket, SocketId, Subscription};

enum ScriptedReply {
    Ok(Value, Option<String>),
    Err,
}

#[derive(Default)]
struct Inner {
    scripted: HashMap<String, VecDeque<ScriptedReply>>,
    send_log: Vec<(String, Value)>,
    publish_log: Vec<(String, Value)>,
    subscribers: HashMap<String, HashMap<u64, mpsc::Sender<BusMessage>>>,
    next_subscription_id: u64,
}

/// Captures every `publish`/`send`/`subscribe`/`unsubscribe` call and lets a
/// test script what `send` replies with, per address.
#[derive(Default)]
pub struct MockBus {
    inner: Mutex<Inner>,
}

impl MockBus {
    /// Build an empty mock bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful reply body for the next `send` to `address`.
    pub fn script_reply(&self, address: &str, body: Value) {
        self.inner
            .lock()
            .unwrap()
            .scripted
            .entry(address.to_string())
            .or_default()
            .push_back(ScriptedReply::Ok(body, None));
    }

    /// Queue a successful reply carrying a nested reply address, for
    /// exercising chained request/reply.
    pub fn script_reply_with_address(&self, address: &str, body: Value, reply_address: &str) {
        self.inner
            .lock()
            .unwrap()
            .scripted
            .entry(address.to_string())
            .or_default()
            .push_back(ScriptedReply::Ok(body, Some(reply_address.to_string())));
    }

    /// Queue a transport failure for the next `send` to `address`.
    pub fn script_error(&self, address: &str) {
        self.inner
            .lock()
            .unwrap()
            .scripted
            .entry(address.to_string())
            .or_default()
            .push_back(ScriptedReply::Err);
    }

    /// Number of `send` calls made to `address` so far.
    #[must_use]
    pub fn send_count(&self, address: &str) -> usize {
        self.inner
            .lock()
            .unwrap()
            .send_log
            .iter()
            .filter(|(a, _)| a == address)
            .count()
    }

    /// Number of `publish` calls made to `address` so far.
    #[must_use]
    pub fn publish_count(&self, address: &str) -> usize {
        self.inner
            .lock()
            .unwrap()
            .publish_log
            .iter()
            .filter(|(a, _)| a == address)
            .count()
    }

    /// Number of live subscriptions currently installed on `address`.
    #[must_use]
    pub fn subscriber_count(&self, address: &str) -> usize {
        self.inner
            .lock()
            .unwrap()
            .subscribers
            .get(address)
            .map_or(0, HashMap::len)
    }
}

#[async_trait]
impl Bus for MockBus {
    async fn publish(&self, address: &str, body: Value) -> BridgeResult<()> {
        let senders: Vec<mpsc::Sender<BusMessage>> = {
            let mut inner = self.inner.lock().unwrap();
            inner.publish_log.push((address.to_string(), body.clone()));
            inner
                .subscribers
                .get(address)
                .map(|m| m.values().cloned().collect())
                .unwrap_or_default()
        };
        for sender in senders {
            let _ = sender
                .send(BusMessage {
                    address: address.to_string(),
                    body: body.clone(),
                    reply_address: None,
                })
                .await;
        }
        Ok(())
    }

    async fn send(&self, address: &str, body: Value) -> BridgeResult<BusReply> {
        let scripted = {
            let mut inner = self.inner.lock().unwrap();
            inner.send_log.push((address.to_string(), body));
            inner
                .scripted
                .get_mut(address)
                .and_then(VecDeque::pop_front)
        };
        match scripted {
            Some(ScriptedReply::Ok(body, reply_address)) => Ok(BusReply { body, reply_address }),
            Some(ScriptedReply::Err) => Err(BridgeError::Bus(format!(
                "scripted transport failure for {address}"
            ))),
            None => Err(BridgeError::Bus(format!("no scripted reply for {address}"))),
        }
    }

    async fn subscribe(&self, address: &str) -> BridgeResult<Subscription> {
        let (tx, rx) = mpsc::channel(32);
        let mut inner = self.inner.lock().unwrap();
        let id = inner.next_subscription_id;
        inner.next_subscription_id = inner.next_subscription_id.saturating_add(1);
        inner
            .subscribers
            .entry(address.to_string())
            .or_default()
            .insert(id, tx);
        Ok(Subscription { id, receiver: rx })
    }

    async fn unsubscribe(&self, address: &str, subscription_id: u64) -> BridgeResult<()> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(subs) = inner.subscribers.get_mut(address) {
            subs.remove(&subscription_id);
        }
        Ok(())
    }
}

/// An in-memory duplex socket: a test writes frames on the client side and
/// reads back every envelope the bridge wrote.
pub struct MockClientSocket {
    id: SocketId,
    written: Mutex<Vec<BridgeEnvelope>>,
}

impl MockClientSocket {
    /// Build a mock socket with a freshly allocated id.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: SocketId::new(),
            written: Mutex::new(Vec::new()),
        }
    }

    /// Every envelope written to this socket so far, in order.
    #[must_use]
    pub fn written(&self) -> Vec<BridgeEnvelope> {
        self.written.lock().unwrap().clone()
    }
}

impl Default for MockClientSocket {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ClientSocket for MockClientSocket {
    fn id(&self) -> SocketId {
        self.id
    }

    async fn write_envelope(&self, envelope: &BridgeEnvelope) -> BridgeResult<()> {
        self.written.lock().unwrap().push(envelope.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn scripted_send_reply_is_returned_once() {
        let bus = MockBus::new();
        bus.script_reply("auth", json!({"status": "ok"}));
        let reply = bus.send("auth", json!({})).await.unwrap();
        assert_eq!(reply.body, json!({"status": "ok"}));
        assert_eq!(bus.send_count("auth"), 1);
        assert!(bus.send("auth", json!({})).await.is_err());
    }

    #[tokio::test]
    async fn publish_fans_out_to_subscribers() {
        let bus = MockBus::new();
        let sub = bus.subscribe("bar").await.unwrap();
        let mut receiver = sub.receiver;
        bus.publish("bar", json!({"k": "v"})).await.unwrap();
        let msg = receiver.recv().await.unwrap();
        assert_eq!(msg.body, json!({"k": "v"}));
    }

    #[tokio::test]
    async fn mock_socket_captures_writes() {
        let socket = MockClientSocket::new();
        socket
            .write_envelope(&BridgeEnvelope {
                address: "foo".to_string(),
                body: json!(1),
                reply_address: None,
            })
            .await
            .unwrap();
        assert_eq!(socket.written().len(), 1);
    }
}
