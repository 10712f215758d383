//! Error and result types for persistence operations.
//!
//! This module provides the error taxonomy for the persistence layer.
//! Use [`PersistenceResult<T>`] as the return type for fallible operations.

use bson::error::Error as BsonError;
use serde_json::Error as SerdeJsonError;
use thiserror::Error;

/// Represents all possible errors surfaced by the persistence layer.
///
/// "Not found" is never an error in this layer: lookup operations return an
/// empty `Option`/`Vec` instead. Driver-level failures that the layer does not
/// recognize propagate as [`PersistenceError::Backend`] without retry.
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// Missing or invalid connection, credential, or collection configuration.
    /// Not recoverable without operator intervention.
    #[error("Configuration error: {0}")]
    Configuration(String),
    /// Driver connect or liveness-probe failure, wrapping the underlying cause.
    #[error("Connection failed: {0}")]
    ConnectFailed(String),
    /// An operation was attempted while the component was not open.
    #[error("Component is not opened: {0}")]
    NotOpened(String),
    /// A record with the given identity already exists in the collection.
    /// The first argument is the identity, the second is the collection name.
    #[error("Record {0} already exists in collection {1}")]
    DuplicateKey(String, String),
    /// Serialization/deserialization error when converting between record
    /// and document formats (BSON, JSON).
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// An error reported by the underlying storage driver.
    #[error("Backend error: {0}")]
    Backend(String),
}

/// A specialized `Result` type for persistence operations.
pub type PersistenceResult<T> = Result<T, PersistenceError>;

impl From<BsonError> for PersistenceError {
    fn from(err: BsonError) -> Self {
        PersistenceError::Serialization(err.to_string())
    }
}

impl From<SerdeJsonError> for PersistenceError {
    fn from(err: SerdeJsonError) -> Self {
        PersistenceError::Serialization(err.to_string())
    }
}
