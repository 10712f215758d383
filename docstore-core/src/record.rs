//! Core traits for records stored through the persistence engine.
//!
//! A [`Record`] is any serde-serializable entity exposing an optional
//! identity of a generic [`RecordKey`] type. Records are transient: the
//! engine creates and returns them per call and never caches them.

use bson::{Bson, Document, de::deserialize_from_bson, ser::serialize_to_bson};
use rand::Rng;
use serde::{Serialize, de::DeserializeOwned};

use crate::error::{PersistenceError, PersistenceResult};

/// The identity key of a record.
///
/// Keys must convert to BSON for filter composition and parse back from the
/// string form used in comma-separated `"ids"` filter values. Key types that
/// the engine may generate on create override [`RecordKey::generate`];
/// externally supplied key types (strings) leave it returning `None`.
pub trait RecordKey: Clone + PartialEq + Send + Sync + 'static {
    /// BSON value used in identity filters.
    fn to_bson(&self) -> Bson;

    /// Parses one entry of a comma-separated identity list.
    fn parse_key(value: &str) -> Option<Self>;

    /// Generates a fresh key, or `None` when this key type is externally
    /// supplied. Collisions are statistically negligible and not retried.
    fn generate() -> Option<Self> {
        None
    }
}

impl RecordKey for String {
    fn to_bson(&self) -> Bson {
        Bson::String(self.clone())
    }

    fn parse_key(value: &str) -> Option<Self> {
        Some(value.to_string())
    }
}

impl RecordKey for i64 {
    fn to_bson(&self) -> Bson {
        Bson::Int64(*self)
    }

    fn parse_key(value: &str) -> Option<Self> {
        value.trim().parse().ok()
    }

    fn generate() -> Option<Self> {
        // Random positive long; uniqueness is probabilistic, not enforced.
        Some(rand::thread_rng().gen_range(1..i64::MAX))
    }
}

/// A persistable entity with a unique identity field.
///
/// # Example
///
/// ```ignore
/// use docstore_core::record::Record;
/// use serde::{Serialize, Deserialize};
///
/// #[derive(Debug, Clone, Serialize, Deserialize)]
/// pub struct Task {
///     pub id: Option<i64>,
///     pub title: String,
/// }
///
/// impl Record for Task {
///     type Key = i64;
///
///     fn key(&self) -> Option<i64> { self.id }
///     fn set_key(&mut self, key: i64) { self.id = Some(key); }
/// }
/// ```
pub trait Record: Serialize + DeserializeOwned + Send + Sync + Clone + 'static {
    /// The identity key type of this record.
    type Key: RecordKey;

    /// Returns the record's identity, or `None` when it has not been set.
    fn key(&self) -> Option<Self::Key>;

    /// Assigns the record's identity.
    fn set_key(&mut self, key: Self::Key);
}

/// Extension trait providing BSON conversion for records.
///
/// Automatically implemented for all [`Record`] types.
pub trait RecordExt: Record {
    /// Serializes this record into a BSON document for storage.
    fn to_document(&self) -> PersistenceResult<Document>;

    /// Deserializes a record from a stored BSON document.
    fn from_document(document: Document) -> PersistenceResult<Self>;
}

impl<T: Record> RecordExt for T {
    fn to_document(&self) -> PersistenceResult<Document> {
        match serialize_to_bson(self)? {
            Bson::Document(document) => Ok(document),
            other => Err(PersistenceError::Serialization(format!(
                "Expected a document, got {:?}",
                other
            ))),
        }
    }

    fn from_document(document: Document) -> PersistenceResult<Self> {
        Ok(deserialize_from_bson(Bson::Document(document))?)
    }
}
