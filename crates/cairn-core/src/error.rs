//! Error types for Cairn Core

use thiserror::Error;

/// Result type alias using Cairn's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Cairn error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("Malformed relationship key: {key} (expected \"{{type}}.{{property}}\")")]
    MalformedRelationshipKey { key: String },

    #[error("Unknown entity type: {0}")]
    UnknownEntityType(String),

    #[error("Unknown property {property} on entity type {entity_type}")]
    UnknownProperty {
        entity_type: String,
        property: String,
    },

    #[error("Missing key property {property} for entity type {entity_type}")]
    MissingKeyProperty {
        entity_type: String,
        property: String,
    },

    #[error("Malformed direct link {link}: {reason}")]
    MalformedDirectLink { link: String, reason: String },

    #[error("No valid ordering for relationship types [{}]", .types.join(", "))]
    NoValidOrdering { types: Vec<String> },

    #[error("Duplicate edge rule: {from} -> {to}")]
    DuplicateEdgeRule { from: String, to: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Failure raised by a graph store implementation.
///
/// Traversal operations pass these through untouched; the wrapped error is
/// whatever the store produced.
#[derive(Error, Debug)]
#[error(transparent)]
pub struct StoreError(Box<dyn std::error::Error + Send + Sync + 'static>);

impl StoreError {
    pub fn new(err: impl Into<Box<dyn std::error::Error + Send + Sync + 'static>>) -> Self {
        Self(err.into())
    }

    /// Borrow the underlying store error
    pub fn inner(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        self.0.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_valid_ordering_lists_types() {
        let err = Error::NoValidOrdering {
            types: vec!["tenant".into(), "vserver".into()],
        };
        assert_eq!(
            err.to_string(),
            "No valid ordering for relationship types [tenant, vserver]"
        );
    }

    #[test]
    fn test_store_error_is_transparent() {
        let err: Error = StoreError::new("connection reset").into();
        assert_eq!(err.to_string(), "connection reset");
    }
}
