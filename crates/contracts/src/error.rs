//! Layered error definitions
//!
//! Categorized by source: config / resolution / delivery / encode / liveness

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Resolution Errors =====
    /// Host name did not resolve on this tick
    #[error("resolution of '{host}' failed: {message}")]
    Resolution { host: String, message: String },

    // ===== Delivery Errors =====
    /// Transport-level send / POST / create failure
    #[error("delivery to '{target}' failed: {message}")]
    Delivery { target: String, message: String },

    /// Create-only write hit an existing document id
    #[error("document '{id}' already exists in index '{index}'")]
    DuplicateDocument { index: String, id: String },

    // ===== Encode Errors =====
    /// Event could not be encoded for a transport
    #[error("encode error ({transport}): {message}")]
    Encode {
        transport: &'static str,
        message: String,
    },

    // ===== Liveness =====
    /// No event reached the dispatcher within the watchdog window
    #[error("no events received for {idle_ms}ms")]
    Stalled { idle_ms: u64 },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create resolution error
    pub fn resolution(host: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Resolution {
            host: host.into(),
            message: message.into(),
        }
    }

    /// Create delivery error
    pub fn delivery(target: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Delivery {
            target: target.into(),
            message: message.into(),
        }
    }

    /// Create encode error
    pub fn encode(transport: &'static str, message: impl Into<String>) -> Self {
        Self::Encode {
            transport,
            message: message.into(),
        }
    }

    /// Stable label used for metrics
    pub fn category(&self) -> &'static str {
        match self {
            Self::ConfigParse { .. } | Self::ConfigValidation { .. } => "config",
            Self::Resolution { .. } => "resolution",
            Self::Delivery { .. } => "delivery",
            Self::DuplicateDocument { .. } => "duplicate_document",
            Self::Encode { .. } => "encode",
            Self::Stalled { .. } => "stalled",
            Self::Io(_) => "io",
            Self::Other(_) => "other",
        }
    }
}
