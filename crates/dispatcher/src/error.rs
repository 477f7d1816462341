//! Dispatcher error types

use thiserror::Error;

/// Dispatcher-specific errors
#[derive(Debug, Error)]
pub enum DispatcherError {
    /// Delivery client could not be created
    #[error("failed to create client '{name}': {message}")]
    ClientCreation { name: String, message: String },

    /// Target cannot be routed (bad url, unsupported transport for the list)
    #[error("invalid target {list}[{index}]: {message}")]
    InvalidTarget {
        list: &'static str,
        index: usize,
        message: String,
    },

    /// Error from contract
    #[error("contract error: {0}")]
    Contract(#[from] contracts::ContractError),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl DispatcherError {
    pub fn client_creation(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ClientCreation {
            name: name.into(),
            message: message.into(),
        }
    }

    pub fn invalid_target(list: &'static str, index: usize, message: impl Into<String>) -> Self {
        Self::InvalidTarget {
            list,
            index,
            message: message.into(),
        }
    }
}
