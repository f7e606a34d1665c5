//! Frame Dispatcher (component 4.F): parses one client frame and routes it
//! to the Subscription Registry or the Ingress Filter.

use crate::error::{BridgeError, BridgeResult};
use crate::frame::ClientFrame;
use crate::outbound::IngressFilter;
use crate::subscriptions::SubscriptionRegistry;
use crate::transport::ClientSocket;

/// Parses raw client frames and routes them by `type`.
pub struct FrameDispatcher {
    ingress: IngressFilter,
}

impl FrameDispatcher {
    /// Build a dispatcher over the session's ingress filter.
    #[must_use]
    pub fn new(ingress: IngressFilter) -> Self {
        Self { ingress }
    }

    /// Parse and route one raw JSON frame.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Protocol`] for malformed JSON, a missing
    /// mandatory field, or an unrecognised `type`. The caller decides
    /// whether a protocol error tears down the socket; this bridge does not.
    pub async fn dispatch(
        &self,
        raw: &str,
        socket: &dyn ClientSocket,
        subscriptions: &SubscriptionRegistry,
    ) -> BridgeResult<()> {
        let frame: ClientFrame =
            serde_json::from_str(raw).map_err(|e| BridgeError::Protocol(e.to_string()))?;

        match frame.kind.as_str() {
            "send" => self.ingress.handle(&frame, true, socket).await,
            "publish" => self.ingress.handle(&frame, false, socket).await,
            "register" => subscriptions.register(frame.address).await,
            "unregister" => subscriptions.unregister(&frame.address).await,
            other => Err(BridgeError::Protocol(format!("unrecognised frame type {other:?}"))),
        }
    }
}
