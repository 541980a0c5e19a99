//! Error types and result types for repository and document store operations.
//!
//! Use [`DocumentStoreResult<T>`] as the return type for fallible operations.
//! Failures raised by a backend driver are carried unchanged as the source of
//! [`DocumentStoreError::Backend`].

use bson::error::Error as BsonError;
use serde_json::Error as SerdeJsonError;
use std::error::Error as StdError;
use thiserror::Error;

/// Boxed error type used to carry driver failures without classifying them.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Represents all possible errors that can occur when interacting with a document store.
///
/// The variants fall into three groups: configuration errors raised before any
/// store call is made, data errors raised while converting entities, and
/// backend errors propagated from the underlying store.
#[derive(Error, Debug)]
pub enum DocumentStoreError {
    /// No connection settings were supplied to a context.
    #[error("Database settings cannot be absent")]
    MissingSettings,
    /// A collection was requested from a context that has no database handle bound.
    #[error("Database is not initialized, call initialize() with valid settings before accessing collections")]
    NotInitialized,
    /// Error during store initialization or connection setup.
    #[error("Initialization error: {0}")]
    Initialization(String),
    /// Serialization/deserialization error when converting between entity formats (BSON, JSON).
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// The document violates the expected structure.
    #[error("Invalid document: {0}")]
    InvalidDocument(String),
    /// A document with the given ID already exists in the collection.
    /// The first argument is the document ID, the second is the collection name.
    #[error("Document {0} already exists in collection {1}")]
    DocumentAlreadyExists(String, String),
    /// An error occurred in the underlying storage backend.
    #[error("Backend error: {0}")]
    Backend(#[source] BoxError),
}

impl DocumentStoreError {
    /// Wraps a driver error as a [`DocumentStoreError::Backend`], keeping it as the error source.
    pub fn backend(err: impl Into<BoxError>) -> Self {
        DocumentStoreError::Backend(err.into())
    }

    /// Returns `true` for errors raised by a context or its settings rather than by the store.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            DocumentStoreError::MissingSettings
                | DocumentStoreError::NotInitialized
                | DocumentStoreError::Initialization(_)
        )
    }
}

/// A specialized `Result` type for document store operations.
pub type DocumentStoreResult<T> = Result<T, DocumentStoreError>;

impl From<BsonError> for DocumentStoreError {
    fn from(err: BsonError) -> Self {
        DocumentStoreError::Serialization(err.to_string())
    }
}

impl From<SerdeJsonError> for DocumentStoreError {
    fn from(err: SerdeJsonError) -> Self {
        DocumentStoreError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn backend_error_keeps_source() {
        let err = DocumentStoreError::backend(io::Error::new(io::ErrorKind::ConnectionRefused, "refused"));

        assert_eq!(err.to_string(), "Backend error: refused");
        assert!(err.source().is_some());
        assert!(!err.is_configuration());
    }

    #[test]
    fn configuration_errors_are_classified() {
        assert!(DocumentStoreError::MissingSettings.is_configuration());
        assert!(DocumentStoreError::NotInitialized.is_configuration());
        assert!(!DocumentStoreError::InvalidDocument("x".into()).is_configuration());
    }
}
