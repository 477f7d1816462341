//! JSON bodies for webhook POSTs

use bytes::Bytes;
use contracts::ContractError;
use serde::Serialize;

/// Serialize an event as the POST body.
pub fn encode_json<T: Serialize>(event: &T) -> Result<Bytes, ContractError> {
    serde_json::to_vec(event)
        .map(Bytes::from)
        .map_err(|e| ContractError::encode("webhook", e.to_string()))
}

/// Configured path, or the event kind's default.
pub fn callback_path<'a>(configured: Option<&'a str>, default: &'a str) -> &'a str {
    configured.unwrap_or(default)
}
