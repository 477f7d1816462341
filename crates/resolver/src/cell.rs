//! Resolution cache entry shared between the resolver (writer) and the
//! dispatcher (readers), carried over a `watch` channel.

use std::net::SocketAddr;
use tokio::sync::watch;

/// Most recent resolution state of one datagram target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Resolution {
    /// Last successfully resolved address; kept across failed ticks
    pub address: Option<SocketAddr>,
    /// Whether the latest lookup succeeded
    pub valid: bool,
}

impl Resolution {
    /// Address eligible for send, only while valid.
    pub fn sendable(&self) -> Option<SocketAddr> {
        if self.valid {
            self.address
        } else {
            None
        }
    }
}

/// Create a cell for `host:port`. Starts invalid until the first lookup succeeds.
pub fn resolution_cell(host: impl Into<String>, port: u16) -> (ResolutionPublisher, ResolutionView) {
    let (tx, rx) = watch::channel(Resolution::default());
    let host = host.into();
    (
        ResolutionPublisher {
            host: host.clone(),
            port,
            tx,
        },
        ResolutionView { host, port, rx },
    )
}

/// Write side, owned exclusively by the `TargetResolver`.
#[derive(Debug)]
pub struct ResolutionPublisher {
    host: String,
    port: u16,
    tx: watch::Sender<Resolution>,
}

impl ResolutionPublisher {
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn current(&self) -> Resolution {
        *self.tx.borrow()
    }

    pub fn is_valid(&self) -> bool {
        self.tx.borrow().valid
    }

    pub fn publish_resolved(&self, address: SocketAddr) {
        self.tx.send_replace(Resolution {
            address: Some(address),
            valid: true,
        });
    }

    pub fn publish_failed(&self) {
        self.tx.send_modify(|r| r.valid = false);
    }
}

/// Read side, held by dispatch targets.
#[derive(Debug, Clone)]
pub struct ResolutionView {
    host: String,
    port: u16,
    rx: watch::Receiver<Resolution>,
}

impl ResolutionView {
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn current(&self) -> Resolution {
        *self.rx.borrow()
    }

    /// Address to send to, or `None` while the target is invalid
    pub fn sendable(&self) -> Option<SocketAddr> {
        self.current().sendable()
    }
}
