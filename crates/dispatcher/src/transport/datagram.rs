//! Datagram socket - UDP fire-and-forget

use std::net::SocketAddr;
use std::sync::Arc;

use contracts::ContractError;
use tokio::net::UdpSocket;
use tracing::{debug, instrument};

use crate::error::DispatcherError;

/// One unconnected socket shared by every datagram target.
#[derive(Debug, Clone)]
pub struct DatagramSocket {
    socket: Arc<UdpSocket>,
    local_addr: SocketAddr,
}

impl DatagramSocket {
    #[instrument(name = "datagram_socket_bind")]
    pub async fn bind(broadcast: bool) -> Result<Self, DispatcherError> {
        // Bind to any available port
        let socket = UdpSocket::bind("0.0.0.0:0")
            .await
            .map_err(|e| DispatcherError::client_creation("datagram", e.to_string()))?;
        socket
            .set_broadcast(broadcast)
            .map_err(|e| DispatcherError::client_creation("datagram", e.to_string()))?;
        let local_addr = socket.local_addr()?;

        debug!(%local_addr, broadcast, "Datagram socket bound");

        Ok(Self {
            socket: Arc::new(socket),
            local_addr,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub async fn send(&self, payload: &[u8], address: SocketAddr) -> Result<(), ContractError> {
        let sent = self
            .socket
            .send_to(payload, address)
            .await
            .map_err(|e| ContractError::delivery(format!("udp://{address}"), e.to_string()))?;
        debug!(target_addr = %address, bytes = sent, "Sent");
        Ok(())
    }
}
