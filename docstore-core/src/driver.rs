//! Storage driver abstraction.
//!
//! The persistence engine talks to the document store through [`StoreDriver`]
//! implementations, which translate the store-neutral query representation
//! into native operations. Drivers are assumed correct: this layer performs
//! no retry or recovery around them.
//!
//! All operations are async, thread-safe (`Send + Sync`), and dispatched
//! concurrently by the engine without additional serialization.

use async_trait::async_trait;
use bson::Document;
use std::fmt::Debug;

use crate::{
    error::PersistenceResult,
    options::PersistenceOptions,
    query::{Expr, Query, UpdateOps},
};

/// Abstract interface to one connected document store client.
#[async_trait]
pub trait StoreDriver: Send + Sync + Debug {
    /// Lightweight liveness probe. Must fail when the cluster is not
    /// reachable, even if the client handle itself is still valid.
    async fn ping(&self) -> PersistenceResult<()>;

    /// Finds documents matching the query, honoring skip/limit/sort and the
    /// inclusion projection when present.
    async fn find(&self, collection: &str, query: Query) -> PersistenceResult<Vec<Document>>;

    /// Finds the first document matching the filter.
    async fn find_one(
        &self,
        collection: &str,
        filter: Option<Expr>,
        projection: Option<Vec<String>>,
    ) -> PersistenceResult<Option<Document>>;

    /// Counts documents matching the filter.
    async fn count(&self, collection: &str, filter: Option<Expr>) -> PersistenceResult<u64>;

    /// Inserts a single document.
    async fn insert_one(&self, collection: &str, document: Document) -> PersistenceResult<()>;

    /// Replaces the first document matching the filter with `document`,
    /// inserting it when `upsert` is set and nothing matches. Returns the
    /// post-write document, or `None` when nothing matched and `upsert` was
    /// off.
    async fn replace_one(
        &self,
        collection: &str,
        filter: Expr,
        document: Document,
        upsert: bool,
    ) -> PersistenceResult<Option<Document>>;

    /// Applies field-level set operations to the first document matching the
    /// filter as one atomic command. Returns the post-update document, or
    /// `None` when nothing matched.
    async fn update_one(
        &self,
        collection: &str,
        filter: Expr,
        update: UpdateOps,
    ) -> PersistenceResult<Option<Document>>;

    /// Atomically removes and returns the first document matching the filter.
    async fn delete_one(
        &self,
        collection: &str,
        filter: Expr,
    ) -> PersistenceResult<Option<Document>>;

    /// Removes all documents matching the filter; `None` removes everything.
    /// Returns the number of documents removed.
    async fn delete_many(
        &self,
        collection: &str,
        filter: Option<Expr>,
    ) -> PersistenceResult<u64>;

    /// Drops the entire collection.
    async fn drop_collection(&self, collection: &str) -> PersistenceResult<()>;

    /// Cleanly shuts the driver down, releasing its resources. The default
    /// is a no-op; drivers holding external connections should override it.
    async fn shutdown(self) -> PersistenceResult<()>
    where
        Self: Sized,
    {
        Ok(())
    }
}

/// Factory establishing a connected driver from a canonical connection URI.
#[async_trait]
pub trait StoreConnector: Send + Sync {
    type Driver: StoreDriver;

    /// Connects to the store at `uri`, passing through the driver-relevant
    /// options (pool size, connect timeout, keep-alive).
    async fn connect(
        &self,
        uri: &str,
        options: &PersistenceOptions,
    ) -> PersistenceResult<Self::Driver>;
}
