//! A `ClientSocket` adapter over a plain TCP connection, framed as one JSON
//! object per line, standing in for the reference bridge's SockJS-like
//! duplex channel.

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::sync::Mutex;

use astrid_bridge_core::error::{BridgeError, BridgeResult};
use astrid_bridge_core::frame::BridgeEnvelope;
use astrid_bridge_core::transport::{ClientSocket, SocketId};

/// One connected client's write half, serialised behind a mutex so
/// concurrent outbound deliveries never interleave their bytes.
pub struct TcpClientSocket {
    id: SocketId,
    writer: Mutex<OwnedWriteHalf>,
}

impl TcpClientSocket {
    /// Wrap a TCP write half for a freshly accepted connection.
    #[must_use]
    pub fn new(writer: OwnedWriteHalf) -> Self {
        Self {
            id: SocketId::new(),
            writer: Mutex::new(writer),
        }
    }
}

#[async_trait]
impl ClientSocket for TcpClientSocket {
    fn id(&self) -> SocketId {
        self.id
    }

    async fn write_envelope(&self, envelope: &BridgeEnvelope) -> BridgeResult<()> {
        let mut line =
            serde_json::to_vec(envelope).map_err(|e| BridgeError::SocketWrite(e.to_string()))?;
        line.push(b'\n');

        let mut writer = self.writer.lock().await;
        writer
            .write_all(&line)
            .await
            .map_err(|e| BridgeError::SocketWrite(e.to_string()))
    }
}
