//! Subscription Registry (component 4.E): per-socket map of bus address to
//! installed bus handler, with hook-gated install/remove and close cleanup.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::BridgeResult;
use crate::hooks::BridgeHooks;
use crate::outbound::OutboundFilter;
use crate::transport::{Bus, ClientSocket};

struct Handler {
    subscription_id: u64,
    pump: JoinHandle<()>,
}

/// Owns one socket's address → bus-handler map. `register` replaces any
/// prior handler for the same address rather than leaking it (invariant 3).
pub struct SubscriptionRegistry {
    socket: Arc<dyn ClientSocket>,
    bus: Arc<dyn Bus>,
    outbound: Arc<OutboundFilter>,
    hooks: Arc<dyn BridgeHooks>,
    handlers: Mutex<HashMap<String, Handler>>,
}

impl SubscriptionRegistry {
    /// Build a registry for one socket's session.
    #[must_use]
    pub fn new(
        socket: Arc<dyn ClientSocket>,
        bus: Arc<dyn Bus>,
        outbound: Arc<OutboundFilter>,
        hooks: Arc<dyn BridgeHooks>,
    ) -> Self {
        Self {
            socket,
            bus,
            outbound,
            hooks,
            handlers: Mutex::new(HashMap::new()),
        }
    }

    /// Install a bus handler for `address`, replacing any handler already
    /// registered there. No-ops if `preRegister` vetoes it.
    pub async fn register(&self, address: String) -> BridgeResult<()> {
        if !self.hooks.pre_register(self.socket.id(), &address) {
            debug!(%address, "pre_register hook vetoed registration");
            return Ok(());
        }

        let subscription = self.bus.subscribe(&address).await?;
        let mut receiver = subscription.receiver;

        let socket = Arc::clone(&self.socket);
        let outbound = Arc::clone(&self.outbound);
        let pump_address = address.clone();
        let pump = tokio::spawn(async move {
            while let Some(msg) = receiver.recv().await {
                if let Err(err) = outbound.deliver(&pump_address, msg, socket.as_ref()).await {
                    warn!(address = %pump_address, error = %err, "outbound delivery failed");
                }
            }
        });

        let new_handler = Handler {
            subscription_id: subscription.id,
            pump,
        };

        let previous = {
            let mut handlers = self.handlers.lock().await;
            handlers.insert(address.clone(), new_handler)
        };
        if let Some(previous) = previous {
            previous.pump.abort();
            self.bus.unsubscribe(&address, previous.subscription_id).await?;
        }

        self.hooks.post_register(self.socket.id(), &address);
        Ok(())
    }

    /// Remove the handler for `address`, if any. No-ops if `unregister`
    /// vetoes it.
    pub async fn unregister(&self, address: &str) -> BridgeResult<()> {
        if !self.hooks.unregister(self.socket.id(), address) {
            debug!(%address, "unregister hook vetoed removal");
            return Ok(());
        }

        let removed = {
            let mut handlers = self.handlers.lock().await;
            handlers.remove(address)
        };
        if let Some(handler) = removed {
            handler.pump.abort();
            self.bus.unsubscribe(address, handler.subscription_id).await?;
        }
        Ok(())
    }

    /// Tear down every installed handler. Each handler's `unregister` hook
    /// is invoked once with its return value ignored, matching the close
    /// path's unconditional cleanup.
    pub async fn close_all(&self) {
        let drained: Vec<(String, Handler)> = {
            let mut handlers = self.handlers.lock().await;
            handlers.drain().collect()
        };
        for (address, handler) in drained {
            self.hooks.unregister(self.socket.id(), &address);
            handler.pump.abort();
            if let Err(err) = self.bus.unsubscribe(&address, handler.subscription_id).await {
                warn!(%address, error = %err, "failed to unsubscribe on close");
            }
        }
    }
}
