//! Webhook pools - HTTP and HTTPS keep-alive clients

use std::time::Duration;

use bytes::Bytes;
use contracts::ContractError;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Url};
use tracing::{debug, instrument};

use crate::error::DispatcherError;

const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);
const TCP_KEEPALIVE: Duration = Duration::from_secs(60);

/// One POST to a webhook target.
#[derive(Debug, Clone)]
pub struct WebhookRequest {
    pub url: Url,
    pub use_tls: bool,
    pub body: Bytes,
}

/// Persistent connection pools, one per scheme.
#[derive(Debug, Clone)]
pub struct WebhookPools {
    http: Client,
    https: Client,
}

impl WebhookPools {
    pub fn new() -> Result<Self, DispatcherError> {
        let http = base_builder()
            .build()
            .map_err(|e| DispatcherError::client_creation("webhook-http", e.to_string()))?;
        let https = base_builder()
            .use_rustls_tls()
            .https_only(true)
            .build()
            .map_err(|e| DispatcherError::client_creation("webhook-https", e.to_string()))?;
        Ok(Self { http, https })
    }

    #[instrument(name = "webhook_post", skip(self, request), fields(url = %request.url))]
    pub async fn post(&self, request: WebhookRequest) -> Result<(), ContractError> {
        let client = if request.use_tls { &self.https } else { &self.http };
        let target = request.url.to_string();

        let response = client
            .post(request.url)
            .header(CONTENT_TYPE, "application/json")
            .body(request.body)
            .send()
            .await
            .map_err(|e| ContractError::delivery(&target, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ContractError::delivery(target, format!("HTTP {status}")));
        }

        debug!(%status, "Webhook accepted");
        Ok(())
    }
}

fn base_builder() -> reqwest::ClientBuilder {
    Client::builder()
        .pool_idle_timeout(POOL_IDLE_TIMEOUT)
        .tcp_keepalive(TCP_KEEPALIVE)
}
