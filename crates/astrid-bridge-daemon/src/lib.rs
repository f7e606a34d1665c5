//! TCP daemon exposing the event-bus bridge over a newline-delimited-JSON
//! connection, backed by an in-process [`InMemoryBus`](astrid_bridge_bus::InMemoryBus).

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod transport;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpListener;
use tracing::{info, warn};

use astrid_bridge_bus::InMemoryBus;
use astrid_bridge_config::BridgeConfig;
use astrid_bridge_core::match_engine::MatchEngine;
use astrid_bridge_core::session::BridgeShared;
use astrid_bridge_core::transport::{Bus, ClientSocket};
use transport::TcpClientSocket;

/// Maximum line length accepted from a client, guarding against an
/// unbounded read filling memory before a newline ever arrives.
const MAX_FRAME_BYTES: usize = 1024 * 1024;

/// Accept connections on `listen_addr` and serve the bridge over each one
/// until the process is interrupted.
///
/// # Errors
///
/// Returns an error if the bridge's match engine rejects a configured
/// `address_re`, or if binding `listen_addr` fails.
pub async fn serve(config: BridgeConfig, listen_addr: SocketAddr) -> anyhow::Result<()> {
    let matcher = MatchEngine::new(config.inbound_permitted, config.outbound_permitted)?;
    let bus: Arc<dyn Bus> = Arc::new(InMemoryBus::new());
    let shared = Arc::new(BridgeShared::new(
        matcher,
        bus,
        Duration::from_millis(config.auth_timeout_ms),
        config.auth_address,
        None,
    ));

    let listener = TcpListener::bind(listen_addr).await?;
    info!(%listen_addr, "bridge daemon listening");

    loop {
        let (stream, peer) = listener.accept().await?;
        let shared = Arc::clone(&shared);
        tokio::spawn(async move {
            if let Err(err) = handle_connection(stream, &shared).await {
                warn!(%peer, error = %err, "connection ended with an error");
            }
        });
    }
}

async fn handle_connection(
    stream: tokio::net::TcpStream,
    shared: &Arc<BridgeShared>,
) -> anyhow::Result<()> {
    let (read_half, write_half) = stream.into_split();
    let socket = Arc::new(TcpClientSocket::new(write_half));
    let session = shared.new_session(socket.clone() as Arc<dyn ClientSocket>);

    let mut lines = BufReader::new(read_half).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if line.len() > MAX_FRAME_BYTES {
                    warn!(len = line.len(), "frame exceeds maximum size, dropping connection");
                    break;
                }
                session.handle_frame(line);
            }
            Ok(None) => break,
            Err(err) => {
                warn!(error = %err, "read error, closing session");
                break;
            }
        }
    }

    session.close().await;
    Ok(())
}
