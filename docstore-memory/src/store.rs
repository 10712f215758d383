//! In-memory storage driver.
//!
//! Documents are stored as BSON documents in insertion-ordered vectors
//! behind an async read-write lock. The stable scan order is what paged
//! queries and random-offset fetches key off.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use bson::Document;
use mea::rwlock::RwLock;

use docstore_core::{
    driver::{StoreConnector, StoreDriver},
    error::PersistenceResult,
    options::PersistenceOptions,
    query::{Expr, Query, UpdateOps},
};

use crate::evaluator::{DocumentEvaluator, compare_documents, project_document};

type StoreMap = HashMap<String, Vec<Document>>;

/// Thread-safe in-memory storage driver.
///
/// Cloneable; clones share the same underlying data through an `Arc`.
/// Queries scan all documents in a collection, which is acceptable for the
/// small datasets this driver targets (development and tests).
#[derive(Default, Clone, Debug)]
pub struct MemoryDriver {
    store: Arc<RwLock<StoreMap>>,
}

impl MemoryDriver {
    pub fn new() -> Self {
        Self { store: Arc::new(RwLock::new(StoreMap::new())) }
    }

    fn matching(documents: &[Document], filter: Option<&Expr>) -> Vec<Document> {
        match filter {
            Some(expr) => DocumentEvaluator::filter_documents(documents.iter(), expr),
            None => documents.to_vec(),
        }
    }

    fn position(documents: &[Document], filter: &Expr) -> Option<usize> {
        documents.iter().position(|doc| {
            DocumentEvaluator::new(doc)
                .evaluate(filter)
                .unwrap_or(false)
        })
    }
}

#[async_trait]
impl StoreDriver for MemoryDriver {
    async fn ping(&self) -> PersistenceResult<()> {
        Ok(())
    }

    async fn find(&self, collection: &str, query: Query) -> PersistenceResult<Vec<Document>> {
        let store = self.store.read().await;
        let documents = match store.get(collection) {
            Some(documents) => documents,
            None => return Ok(vec![]),
        };

        let mut matched = Self::matching(documents, query.filter.as_ref());

        if !query.sort.is_empty() {
            matched.sort_by(|a, b| compare_documents(a, b, &query.sort));
        }

        let windowed = matched
            .into_iter()
            .skip(query.skip.unwrap_or(0) as usize)
            .take(query.limit.map(|l| l as usize).unwrap_or(usize::MAX));

        Ok(match &query.projection {
            Some(fields) => windowed
                .map(|doc| project_document(&doc, fields))
                .collect(),
            None => windowed.collect(),
        })
    }

    async fn find_one(
        &self,
        collection: &str,
        filter: Option<Expr>,
        projection: Option<Vec<String>>,
    ) -> PersistenceResult<Option<Document>> {
        let store = self.store.read().await;
        let documents = match store.get(collection) {
            Some(documents) => documents,
            None => return Ok(None),
        };

        let found = match &filter {
            Some(expr) => Self::position(documents, expr).map(|i| documents[i].clone()),
            None => documents.first().cloned(),
        };

        Ok(match (found, &projection) {
            (Some(doc), Some(fields)) => Some(project_document(&doc, fields)),
            (found, _) => found,
        })
    }

    async fn count(&self, collection: &str, filter: Option<Expr>) -> PersistenceResult<u64> {
        let store = self.store.read().await;
        let documents = match store.get(collection) {
            Some(documents) => documents,
            None => return Ok(0),
        };

        Ok(Self::matching(documents, filter.as_ref()).len() as u64)
    }

    async fn insert_one(&self, collection: &str, document: Document) -> PersistenceResult<()> {
        self.store
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .push(document);

        Ok(())
    }

    async fn replace_one(
        &self,
        collection: &str,
        filter: Expr,
        document: Document,
        upsert: bool,
    ) -> PersistenceResult<Option<Document>> {
        let mut store = self.store.write().await;
        let documents = store.entry(collection.to_string()).or_default();

        match Self::position(documents, &filter) {
            Some(index) => {
                documents[index] = document.clone();
                Ok(Some(document))
            }
            None if upsert => {
                documents.push(document.clone());
                Ok(Some(document))
            }
            None => Ok(None),
        }
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: Expr,
        update: UpdateOps,
    ) -> PersistenceResult<Option<Document>> {
        let mut store = self.store.write().await;
        let documents = match store.get_mut(collection) {
            Some(documents) => documents,
            None => return Ok(None),
        };

        match Self::position(documents, &filter) {
            Some(index) => {
                // All set operations apply under the same write guard, so the
                // update is atomic from the caller's point of view.
                for (field, value) in update.sets {
                    documents[index].insert(field, value);
                }
                Ok(Some(documents[index].clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete_one(
        &self,
        collection: &str,
        filter: Expr,
    ) -> PersistenceResult<Option<Document>> {
        let mut store = self.store.write().await;
        let documents = match store.get_mut(collection) {
            Some(documents) => documents,
            None => return Ok(None),
        };

        Ok(Self::position(documents, &filter).map(|index| documents.remove(index)))
    }

    async fn delete_many(
        &self,
        collection: &str,
        filter: Option<Expr>,
    ) -> PersistenceResult<u64> {
        let mut store = self.store.write().await;
        let documents = match store.get_mut(collection) {
            Some(documents) => documents,
            None => return Ok(0),
        };

        let before = documents.len();
        match &filter {
            Some(expr) => documents.retain(|doc| {
                !DocumentEvaluator::new(doc)
                    .evaluate(expr)
                    .unwrap_or(false)
            }),
            None => documents.clear(),
        }

        Ok((before - documents.len()) as u64)
    }

    async fn drop_collection(&self, collection: &str) -> PersistenceResult<()> {
        self.store.write().await.remove(collection);

        Ok(())
    }
}

/// Connector producing [`MemoryDriver`] instances. The connection URI is
/// accepted and ignored; every connect yields an empty store.
#[derive(Default, Clone, Debug)]
pub struct MemoryConnector;

impl MemoryConnector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl StoreConnector for MemoryConnector {
    type Driver = MemoryDriver;

    async fn connect(
        &self,
        _uri: &str,
        _options: &PersistenceOptions,
    ) -> PersistenceResult<Self::Driver> {
        Ok(MemoryDriver::new())
    }
}
