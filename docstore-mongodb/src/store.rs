//! MongoDB storage driver.

use std::time::Duration;

use async_trait::async_trait;
use bson::{Document, doc};
use futures::TryStreamExt;
use mongodb::{
    Client, Collection as MongoCollection,
    options::{ClientOptions, FindOneOptions, FindOptions, ReturnDocument},
};

use docstore_core::{
    driver::{StoreConnector, StoreDriver},
    error::{PersistenceError, PersistenceResult},
    options::PersistenceOptions,
    query::{Expr, Query, QueryVisitor, SortDirection, UpdateOps},
};

use crate::{query::MongoQueryTranslator, sanitizer::NameSanitizer};

/// Storage driver backed by a MongoDB database.
///
/// Translates the store-neutral query representation into native MongoDB
/// commands. The record identity lives in a regular document field; Mongo's
/// own `_id` is server-assigned and stripped from every document read back.
#[derive(Debug)]
pub struct MongoDriver {
    client: Client,
    database: String,
}

impl MongoDriver {
    pub fn new(client: Client, database: String) -> Self {
        Self { client, database }
    }

    fn get_collection(&self, collection_name: &str) -> MongoCollection<Document> {
        self.client
            .database(&self.database)
            .collection(&NameSanitizer::sanitize(collection_name))
    }

    fn filter_document(filter: Option<&Expr>) -> PersistenceResult<Document> {
        match filter {
            Some(expr) => MongoQueryTranslator.visit_expr(expr),
            None => Ok(doc! {}),
        }
    }

    /// Builds an inclusion projection. `_id` is excluded explicitly; it is
    /// Mongo's own key, not the record identity, and callers never see it.
    fn projection_document(fields: &[String]) -> Document {
        Document::from_iter(
            fields
                .iter()
                .map(|field| (field.clone(), bson::Bson::Int32(1)))
                .chain([("_id".to_string(), bson::Bson::Int32(0))]),
        )
    }

    fn sort_document(sorts: &[docstore_core::query::Sort]) -> Document {
        Document::from_iter(sorts.iter().map(|sort| {
            (
                sort.field.clone(),
                bson::Bson::Int32(match sort.direction {
                    SortDirection::Asc => 1,
                    SortDirection::Desc => -1,
                }),
            )
        }))
    }

    fn restore_document(document: Document) -> Document {
        Document::from_iter(document.into_iter().filter(|(k, _)| k != "_id"))
    }
}

#[async_trait]
impl StoreDriver for MongoDriver {
    async fn ping(&self) -> PersistenceResult<()> {
        self.client
            .database(&self.database)
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| PersistenceError::Backend(e.to_string()))?;

        Ok(())
    }

    async fn find(&self, collection: &str, query: Query) -> PersistenceResult<Vec<Document>> {
        let mut options = FindOptions::default();

        if let Some(limit) = query.limit {
            options.limit = Some(limit as i64);
        }
        if let Some(skip) = query.skip {
            options.skip = Some(skip);
        }
        if !query.sort.is_empty() {
            options.sort = Some(Self::sort_document(&query.sort));
        }
        if let Some(fields) = &query.projection {
            options.projection = Some(Self::projection_document(fields));
        }

        Ok(self
            .get_collection(collection)
            .find(Self::filter_document(query.filter.as_ref())?)
            .with_options(options)
            .await
            .map_err(|e| PersistenceError::Backend(e.to_string()))?
            .try_collect::<Vec<Document>>()
            .await
            .map_err(|e| PersistenceError::Backend(e.to_string()))?
            .into_iter()
            .map(Self::restore_document)
            .collect())
    }

    async fn find_one(
        &self,
        collection: &str,
        filter: Option<Expr>,
        projection: Option<Vec<String>>,
    ) -> PersistenceResult<Option<Document>> {
        let mut options = FindOneOptions::default();

        if let Some(fields) = &projection {
            options.projection = Some(Self::projection_document(fields));
        }

        Ok(self
            .get_collection(collection)
            .find_one(Self::filter_document(filter.as_ref())?)
            .with_options(options)
            .await
            .map_err(|e| PersistenceError::Backend(e.to_string()))?
            .map(Self::restore_document))
    }

    async fn count(&self, collection: &str, filter: Option<Expr>) -> PersistenceResult<u64> {
        self.get_collection(collection)
            .count_documents(Self::filter_document(filter.as_ref())?)
            .await
            .map_err(|e| PersistenceError::Backend(e.to_string()))
    }

    async fn insert_one(&self, collection: &str, document: Document) -> PersistenceResult<()> {
        self.get_collection(collection)
            .insert_one(document)
            .await
            .map_err(|e| PersistenceError::Backend(e.to_string()))?;

        Ok(())
    }

    async fn replace_one(
        &self,
        collection: &str,
        filter: Expr,
        document: Document,
        upsert: bool,
    ) -> PersistenceResult<Option<Document>> {
        Ok(self
            .get_collection(collection)
            .find_one_and_replace(Self::filter_document(Some(&filter))?, document)
            .upsert(upsert)
            .return_document(ReturnDocument::After)
            .await
            .map_err(|e| PersistenceError::Backend(e.to_string()))?
            .map(Self::restore_document))
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: Expr,
        update: UpdateOps,
    ) -> PersistenceResult<Option<Document>> {
        Ok(self
            .get_collection(collection)
            .find_one_and_update(
                Self::filter_document(Some(&filter))?,
                doc! { "$set": Document::from_iter(update.sets) },
            )
            .return_document(ReturnDocument::After)
            .await
            .map_err(|e| PersistenceError::Backend(e.to_string()))?
            .map(Self::restore_document))
    }

    async fn delete_one(
        &self,
        collection: &str,
        filter: Expr,
    ) -> PersistenceResult<Option<Document>> {
        Ok(self
            .get_collection(collection)
            .find_one_and_delete(Self::filter_document(Some(&filter))?)
            .await
            .map_err(|e| PersistenceError::Backend(e.to_string()))?
            .map(Self::restore_document))
    }

    async fn delete_many(
        &self,
        collection: &str,
        filter: Option<Expr>,
    ) -> PersistenceResult<u64> {
        Ok(self
            .get_collection(collection)
            .delete_many(Self::filter_document(filter.as_ref())?)
            .await
            .map_err(|e| PersistenceError::Backend(e.to_string()))?
            .deleted_count)
    }

    async fn drop_collection(&self, collection: &str) -> PersistenceResult<()> {
        self.get_collection(collection)
            .drop()
            .await
            .map_err(|e| PersistenceError::Backend(e.to_string()))?;

        Ok(())
    }

    async fn shutdown(self) -> PersistenceResult<()> {
        self.client.shutdown().await;

        Ok(())
    }
}

/// Connector producing [`MongoDriver`] instances from a canonical
/// connection URI. The target database is the URI's path segment.
#[derive(Default, Clone, Debug)]
pub struct MongoConnector;

impl MongoConnector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl StoreConnector for MongoConnector {
    type Driver = MongoDriver;

    async fn connect(
        &self,
        uri: &str,
        options: &PersistenceOptions,
    ) -> PersistenceResult<Self::Driver> {
        let mut client_options = ClientOptions::parse(uri)
            .await
            .map_err(|e| PersistenceError::ConnectFailed(e.to_string()))?;

        let database = client_options.default_database.clone().ok_or_else(|| {
            PersistenceError::Configuration("Connection URI names no database".to_string())
        })?;

        if let Some(pool_size) = options.pool_size {
            client_options.max_pool_size = Some(pool_size);
        }
        client_options.connect_timeout =
            Some(Duration::from_millis(options.connect_timeout_ms));

        // keep_alive and auto_reconnect have no client-option counterpart;
        // the driver keeps its pool connections alive and reconnects itself.
        let client = Client::with_options(client_options)
            .map_err(|e| PersistenceError::ConnectFailed(e.to_string()))?;

        tracing::debug!(database = %database, "mongodb client configured");

        Ok(MongoDriver::new(client, database))
    }
}
