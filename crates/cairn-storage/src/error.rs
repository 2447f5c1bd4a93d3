//! Storage error types

use cairn_core::{StoreError, VertexId};
use thiserror::Error;

/// Result type alias for storage operations
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Storage-specific error types
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Lock error: {0}")]
    Lock(String),

    #[error("Vertex not found: {0}")]
    VertexNotFound(VertexId),

    #[error("No vertex id left after {0}")]
    IdsExhausted(VertexId),

    #[error("Duplicate vertex: {0}")]
    DuplicateVertex(VertexId),

    #[error("No edge rule between {from} and {to}")]
    MissingEdgeRule { from: String, to: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<StorageError> for StoreError {
    fn from(err: StorageError) -> Self {
        StoreError::new(err)
    }
}
