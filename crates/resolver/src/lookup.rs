//! Host name lookup seam

use std::io;
use std::net::SocketAddr;

/// Resolves `host:port` to one IPv4 socket address.
#[trait_variant::make(HostLookup: Send)]
pub trait LocalHostLookup {
    async fn lookup(&self, host: &str, port: u16) -> io::Result<SocketAddr>;
}

/// System resolver via `tokio::net::lookup_host`.
///
/// Only IPv4 results are returned, the datagram socket is bound to `0.0.0.0`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemLookup;

impl HostLookup for SystemLookup {
    async fn lookup(&self, host: &str, port: u16) -> io::Result<SocketAddr> {
        tokio::net::lookup_host((host, port))
            .await?
            .find(SocketAddr::is_ipv4)
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("no IPv4 address for '{host}'"),
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::{HostLookup, SystemLookup};
    use std::io;

    #[tokio::test]
    async fn test_ip_literal_resolves() {
        let addr = SystemLookup.lookup("127.0.0.1", 50001).await.unwrap();
        assert_eq!(addr, "127.0.0.1:50001".parse().unwrap());
    }

    #[tokio::test]
    async fn test_ipv6_only_literal_rejected() {
        let err = SystemLookup.lookup("::1", 50001).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
