use thiserror::Error;

use crate::forms::RegistryError;

/// Unified error type for the domain, storage, and configuration layers.
#[derive(Debug, Error)]
pub enum PropertyError {
    #[error("Persistence error: {0}")]
    Storage(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Form configuration error: {0}")]
    Registry(#[from] RegistryError),
}

pub type Result<T> = std::result::Result<T, PropertyError>;

impl From<std::io::Error> for PropertyError {
    fn from(err: std::io::Error) -> Self {
        PropertyError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for PropertyError {
    fn from(err: serde_json::Error) -> Self {
        PropertyError::Storage(err.to_string())
    }
}

/// Failures raised by the local key/value storage collaborator.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
    #[error("Storage quota exceeded ({limit} bytes)")]
    QuotaExceeded { limit: usize },
}

impl From<StorageError> for PropertyError {
    fn from(err: StorageError) -> Self {
        PropertyError::Storage(err.to_string())
    }
}
