//! Error types and result types for store operations.
//!
//! Every backend reports failures as a [`StoreError`]. The variants are the
//! store-level categories the [`classify`](crate::classify) module maps onto
//! the external error taxonomy, so backends must pick the variant that matches
//! the failure rather than funnelling everything into [`StoreError::Backend`].

use bson::error::Error as BsonError;
use serde_json::Error as SerdeJsonError;
use thiserror::Error;

/// Represents all possible errors that can occur when interacting with a document store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Serialization/deserialization error when converting between document formats (BSON, JSON).
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// Error while building a backend from its connection settings.
    #[error("Initialization error: {0}")]
    Initialization(String),
    /// The backend could not be reached.
    #[error("Connection error: {0}")]
    Connection(String),
    /// A unique index rejected the write.
    #[error("Duplicate key in collection {collection}: {detail}")]
    DuplicateKey {
        /// The collection the write targeted.
        collection: String,
        /// The backend's description of the conflicting key.
        detail: String,
    },
    /// The document does not satisfy its schema (e.g. a required field is absent).
    #[error("Validation failed: {0}")]
    Validation(String),
    /// An identifier could not be cast to the store's identifier type.
    #[error("Cast to ObjectId failed for value \"{0}\"")]
    InvalidId(String),
    /// The document has an invalid structure (not an object, unsupported value, ...).
    #[error("Invalid document: {0}")]
    InvalidDocument(String),
    /// An error occurred in the underlying storage backend.
    #[error("Backend error: {0}")]
    Backend(String),
}

/// A specialized `Result` type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

impl From<BsonError> for StoreError {
    fn from(err: BsonError) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

impl From<SerdeJsonError> for StoreError {
    fn from(err: SerdeJsonError) -> Self {
        StoreError::Serialization(err.to_string())
    }
}
