//! Delivery clients
//!
//! 进程内共享：一个 UDP socket、HTTP / HTTPS 两个 keep-alive 连接池、
//! 一个可选的 document-store 客户端。

mod datagram;
mod store;
mod webhook;

use std::net::SocketAddr;

use bytes::Bytes;
use contracts::{ContractError, GatewayConfig};
use reqwest::Url;
use tracing::{info, instrument};

use crate::encoders::StoreDocument;
use crate::error::DispatcherError;

pub use self::datagram::DatagramSocket;
pub use self::store::DocumentStoreClient;
pub use self::webhook::{WebhookPools, WebhookRequest};

/// Per-transport send operations.
///
/// Every call is independent: a failure is returned to the caller and
/// never affects other in-flight deliveries.
#[trait_variant::make(Delivery: Send)]
pub trait LocalDelivery {
    /// Fire-and-forget datagram to an already-resolved address.
    async fn send_datagram(&self, payload: Bytes, address: SocketAddr) -> Result<(), ContractError>;

    /// JSON POST over the pool matching `request.use_tls`.
    async fn post_json(&self, request: WebhookRequest) -> Result<(), ContractError>;

    /// Create-only document write; an existing id is an error.
    async fn create_document(&self, document: StoreDocument) -> Result<(), ContractError>;
}

/// Shared, cloneable set of delivery clients.
#[derive(Debug, Clone)]
pub struct Transports {
    datagram: DatagramSocket,
    webhooks: WebhookPools,
    store: Option<DocumentStoreClient>,
}

impl Transports {
    /// Bind the datagram socket and build the HTTP pools.
    #[instrument(name = "transports_connect", skip(config))]
    pub async fn connect(config: &GatewayConfig) -> Result<Self, DispatcherError> {
        let datagram = DatagramSocket::bind(config.gateway.udp_broadcast).await?;
        let webhooks = WebhookPools::new()?;
        let store = match &config.document_store {
            Some(store) if config.uses_document_store() => {
                Some(DocumentStoreClient::new(&store.node)?)
            }
            _ => None,
        };

        info!(
            datagram = %datagram.local_addr(),
            document_store = store.is_some(),
            "Delivery clients ready"
        );

        Ok(Self {
            datagram,
            webhooks,
            store,
        })
    }

    pub fn datagram(&self) -> &DatagramSocket {
        &self.datagram
    }
}

impl Delivery for Transports {
    async fn send_datagram(&self, payload: Bytes, address: SocketAddr) -> Result<(), ContractError> {
        self.datagram.send(&payload, address).await
    }

    async fn post_json(&self, request: WebhookRequest) -> Result<(), ContractError> {
        self.webhooks.post(request).await
    }

    async fn create_document(&self, document: StoreDocument) -> Result<(), ContractError> {
        match &self.store {
            Some(store) => store.create(document).await,
            None => Err(ContractError::delivery(
                format!("{}/{}", document.index, document.id),
                "no document store configured",
            )),
        }
    }
}

/// Build `scheme://host:port{path}`.
pub fn webhook_url(host: &str, port: u16, path: &str, use_tls: bool) -> Result<Url, String> {
    let scheme = if use_tls { "https" } else { "http" };
    Url::parse(&format!("{scheme}://{host}:{port}{path}"))
        .map_err(|e| format!("invalid webhook url for {host}:{port}{path}: {e}"))
}
