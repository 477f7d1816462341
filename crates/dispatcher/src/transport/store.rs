//! Document-store client - create-only writes

use contracts::ContractError;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode, Url};
use tracing::{debug, instrument};

use crate::encoders::StoreDocument;
use crate::error::DispatcherError;

/// `PUT {node}/{index}/_create/{id}`; 409 means the id already exists.
#[derive(Debug, Clone)]
pub struct DocumentStoreClient {
    client: Client,
    node: Url,
}

impl DocumentStoreClient {
    pub fn new(node: &str) -> Result<Self, DispatcherError> {
        let node = Url::parse(node)
            .map_err(|e| DispatcherError::client_creation("document-store", e.to_string()))?;
        if node.cannot_be_a_base() {
            return Err(DispatcherError::client_creation(
                "document-store",
                format!("'{node}' is not a base url"),
            ));
        }
        let client = Client::builder()
            .build()
            .map_err(|e| DispatcherError::client_creation("document-store", e.to_string()))?;
        Ok(Self { client, node })
    }

    pub fn node(&self) -> &Url {
        &self.node
    }

    pub fn create_url(&self, document: &StoreDocument) -> Url {
        let mut url = self.node.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .push(document.index)
                .push("_create")
                .push(&document.id);
        }
        url
    }

    #[instrument(
        name = "document_store_create",
        skip(self, document),
        fields(index = document.index, id = %document.id)
    )]
    pub async fn create(&self, document: StoreDocument) -> Result<(), ContractError> {
        let url = self.create_url(&document);
        let body = serde_json::to_vec(&document.body)
            .map_err(|e| ContractError::encode("document_store", e.to_string()))?;
        let response = self
            .client
            .put(url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| ContractError::delivery(self.node.as_str(), e.to_string()))?;

        match response.status() {
            status if status.is_success() => {
                debug!(%status, "Document created");
                Ok(())
            }
            StatusCode::CONFLICT => Err(ContractError::DuplicateDocument {
                index: document.index.to_string(),
                id: document.id,
            }),
            status => Err(ContractError::delivery(
                format!("{}/{}", self.node, document.index),
                format!("HTTP {status}"),
            )),
        }
    }
}
