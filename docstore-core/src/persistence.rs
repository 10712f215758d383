//! Generic document persistence: lifecycle management plus identity-keyed
//! CRUD, paged/filtered/projected queries, and partial-update composition
//! over an arbitrary record type.
//!
//! [`DocumentPersistence`] owns the connection configuration, resolves it
//! into a canonical URI at open time, establishes a driver handle through a
//! [`StoreConnector`], and exposes the CRUD surface over that handle. The
//! handle lives behind an async read-write lock: CRUD calls share read
//! access and may run concurrently; lifecycle transitions take the write
//! side. Callers are expected to serialize `open`/`close` externally —
//! concurrent lifecycle transitions may race on handle assignment, and
//! `close` during in-flight calls is left to driver behavior.
//!
//! Every operation takes a caller-supplied correlation id used only for
//! log correlation, never for logic.

use std::marker::PhantomData;

use bson::Document;
use mea::rwlock::RwLock;
use rand::Rng;

use crate::{
    compose::{FilterSpec, ProjectionSpec, QueryComposer, RecordComposer, SortSpec, UpdateSpec},
    connect::{ConnectionParams, ConnectionProvider, ConnectionResolver, CredentialParams,
              CredentialProvider},
    driver::{StoreConnector, StoreDriver},
    error::{PersistenceError, PersistenceResult},
    options::PersistenceOptions,
    page::{Page, PagingParams},
    query::{Expr, Query, UpdateOps},
    record::{Record, RecordExt, RecordKey},
};

/// A generic persistence component for records of type `T`, connected through
/// a store driver built by `C`.
///
/// # Example
///
/// ```ignore
/// use docstore_core::{options::PersistenceOptions, persistence::DocumentPersistence};
/// use docstore_core::connect::ConnectionParams;
///
/// let options = PersistenceOptions::builder("tasks").build()?;
/// let persistence = DocumentPersistence::<_, Task>::new(options, connector)
///     .with_connection(
///         ConnectionParams::new()
///             .with_host("localhost")
///             .with_port(27017)
///             .with_database("app"),
///     );
///
/// persistence.open("boot-1").await?;
/// let task = persistence.create("boot-1", Task::new("write docs")).await?;
/// ```
pub struct DocumentPersistence<C: StoreConnector, T: Record> {
    options: PersistenceOptions,
    resolver: ConnectionResolver,
    connector: C,
    composer: RecordComposer<T::Key>,
    driver: RwLock<Option<C::Driver>>,
    _marker: PhantomData<T>,
}

impl<C: StoreConnector, T: Record> DocumentPersistence<C, T> {
    /// Creates a closed persistence component with the given options.
    pub fn new(options: PersistenceOptions, connector: C) -> Self {
        let composer = RecordComposer::new(options.identity_field.clone());

        Self {
            options,
            resolver: ConnectionResolver::new(),
            connector,
            composer,
            driver: RwLock::new(None),
            _marker: PhantomData,
        }
    }

    /// Adds a partial connection descriptor (repeatable, e.g. one per
    /// replica set member).
    pub fn with_connection(mut self, connection: ConnectionParams) -> Self {
        self.resolver.add_connection(connection);
        self
    }

    /// Sets the credential descriptor.
    pub fn with_credential(mut self, credential: CredentialParams) -> Self {
        self.resolver.set_credential(credential);
        self
    }

    /// Sets an external connection descriptor provider (service discovery).
    pub fn with_connection_provider(mut self, provider: Box<dyn ConnectionProvider>) -> Self {
        self.resolver.set_connection_provider(provider);
        self
    }

    /// Sets an external credential provider (credential store).
    pub fn with_credential_provider(mut self, provider: Box<dyn CredentialProvider>) -> Self {
        self.resolver.set_credential_provider(provider);
        self
    }

    pub fn options(&self) -> &PersistenceOptions {
        &self.options
    }

    fn collection(&self) -> &str {
        &self.options.collection
    }

    fn opened<'a>(&self, guard: &'a Option<C::Driver>) -> PersistenceResult<&'a C::Driver> {
        guard.as_ref().ok_or_else(|| {
            PersistenceError::NotOpened(format!(
                "Persistence for collection {} is not opened",
                self.options.collection
            ))
        })
    }

    /// Opens the component: resolves the connection, connects the driver,
    /// and verifies liveness before marking itself open.
    ///
    /// A no-op when already open. On any failure the component stays closed
    /// and the error surfaces as [`PersistenceError::ConnectFailed`], with
    /// the exception of resolution failures which keep their configuration
    /// kind.
    pub async fn open(&self, correlation_id: &str) -> PersistenceResult<()> {
        if self.driver.read().await.is_some() {
            return Ok(());
        }

        let uri = self.resolver.resolve(correlation_id).await?;

        let driver = self
            .connector
            .connect(&uri, &self.options)
            .await
            .map_err(|e| {
                tracing::error!(correlation_id, collection = %self.collection(), "connect failed: {}", e);
                PersistenceError::ConnectFailed(e.to_string())
            })?;

        // A handle the driver accepts is not proof of a reachable cluster.
        driver.ping().await.map_err(|e| {
            tracing::error!(correlation_id, collection = %self.collection(), "liveness probe failed: {}", e);
            PersistenceError::ConnectFailed(format!("Liveness probe failed: {}", e))
        })?;

        *self.driver.write().await = Some(driver);
        tracing::debug!(correlation_id, collection = %self.collection(), "persistence opened");

        Ok(())
    }

    /// Closes the component, releasing the driver handle. A no-op when
    /// already closed.
    pub async fn close(&self, correlation_id: &str) -> PersistenceResult<()> {
        if self.driver.write().await.take().is_some() {
            tracing::debug!(correlation_id, collection = %self.collection(), "persistence closed");
        }

        Ok(())
    }

    /// Reports live connectivity: open means the handle exists **and** the
    /// liveness probe still passes.
    pub async fn is_open(&self) -> bool {
        match &*self.driver.read().await {
            Some(driver) => driver.ping().await.is_ok(),
            None => false,
        }
    }

    /// Drops the entire backing collection.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::NotOpened`] when the component is closed.
    pub async fn clear(&self, correlation_id: &str) -> PersistenceResult<()> {
        let guard = self.driver.read().await;
        let driver = self.opened(&guard)?;

        driver.drop_collection(self.collection()).await?;
        tracing::debug!(correlation_id, collection = %self.collection(), "collection cleared");

        Ok(())
    }

    /// Retrieves a page of records matching the filter.
    ///
    /// Skip defaults to 0, limit to the configured max page size. The total
    /// count is computed through a second count round-trip against the same
    /// filter, only when the paging parameters request it.
    pub async fn get_page(
        &self,
        correlation_id: &str,
        filter: Option<&FilterSpec>,
        paging: Option<&PagingParams>,
        sort: Option<&SortSpec>,
    ) -> PersistenceResult<Page<T>> {
        let guard = self.driver.read().await;
        let driver = self.opened(&guard)?;

        let filter_expr = filter.and_then(|f| self.composer.compose_filter(f));
        let paging = paging.cloned().unwrap_or_default();

        let query = Query::new()
            .filter(filter_expr.clone())
            .skip(paging.skip.unwrap_or(0))
            .limit(paging.limit.unwrap_or(self.options.max_page_size))
            .sort(sort.map(|s| self.composer.compose_sort(s)).unwrap_or_default());

        let documents = driver.find(self.collection(), query).await?;
        let data = documents
            .into_iter()
            .map(T::from_document)
            .collect::<PersistenceResult<Vec<T>>>()?;

        let total = match paging.total {
            true => Some(driver.count(self.collection(), filter_expr).await?),
            false => None,
        };

        tracing::trace!(correlation_id, collection = %self.collection(), "retrieved page of {} records", data.len());

        Ok(Page::new(data, total))
    }

    /// Retrieves a page of projected documents matching the filter.
    ///
    /// Documents whose projection yields no fields are skipped from the
    /// page rather than returned as empty entries.
    pub async fn get_page_with_projection(
        &self,
        correlation_id: &str,
        filter: Option<&FilterSpec>,
        paging: Option<&PagingParams>,
        sort: Option<&SortSpec>,
        projection: &ProjectionSpec,
    ) -> PersistenceResult<Page<Document>> {
        let guard = self.driver.read().await;
        let driver = self.opened(&guard)?;

        let filter_expr = filter.and_then(|f| self.composer.compose_filter(f));
        let paging = paging.cloned().unwrap_or_default();

        let query = Query::new()
            .filter(filter_expr.clone())
            .skip(paging.skip.unwrap_or(0))
            .limit(paging.limit.unwrap_or(self.options.max_page_size))
            .sort(sort.map(|s| self.composer.compose_sort(s)).unwrap_or_default())
            .projection(self.composer.compose_projection(projection));

        let data = driver
            .find(self.collection(), query)
            .await?
            .into_iter()
            .filter(|document| !document.is_empty())
            .collect::<Vec<_>>();

        let total = match paging.total {
            true => Some(driver.count(self.collection(), filter_expr).await?),
            false => None,
        };

        tracing::trace!(correlation_id, collection = %self.collection(), "retrieved page of {} projected documents", data.len());

        Ok(Page::new(data, total))
    }

    /// Retrieves all records matching the filter, unpaged, in store order.
    pub async fn get_list(
        &self,
        correlation_id: &str,
        filter: Option<&FilterSpec>,
        sort: Option<&SortSpec>,
    ) -> PersistenceResult<Vec<T>> {
        let guard = self.driver.read().await;
        let driver = self.opened(&guard)?;

        let query = Query::new()
            .filter(filter.and_then(|f| self.composer.compose_filter(f)))
            .sort(sort.map(|s| self.composer.compose_sort(s)).unwrap_or_default());

        let data = driver
            .find(self.collection(), query)
            .await?
            .into_iter()
            .map(T::from_document)
            .collect::<PersistenceResult<Vec<T>>>()?;

        tracing::trace!(correlation_id, collection = %self.collection(), "retrieved {} records", data.len());

        Ok(data)
    }

    /// Retrieves all records whose identity is in the given set. Result
    /// order is store-defined, not input order.
    pub async fn get_list_by_ids(
        &self,
        correlation_id: &str,
        keys: &[T::Key],
    ) -> PersistenceResult<Vec<T>> {
        let guard = self.driver.read().await;
        let driver = self.opened(&guard)?;

        let query = Query::new().filter(Some(self.composer.identity_in(keys)));

        let data = driver
            .find(self.collection(), query)
            .await?
            .into_iter()
            .map(T::from_document)
            .collect::<PersistenceResult<Vec<T>>>()?;

        tracing::trace!(correlation_id, collection = %self.collection(), "retrieved {} records by ids", data.len());

        Ok(data)
    }

    /// Retrieves one record by identity. Absent is a normal result, not an
    /// error.
    pub async fn get_one_by_id(
        &self,
        correlation_id: &str,
        key: &T::Key,
    ) -> PersistenceResult<Option<T>> {
        let guard = self.driver.read().await;
        let driver = self.opened(&guard)?;

        let found = driver
            .find_one(self.collection(), Some(self.composer.identity_eq(key)), None)
            .await?
            .map(T::from_document)
            .transpose()?;

        match &found {
            Some(_) => tracing::trace!(correlation_id, collection = %self.collection(), "retrieved record by id"),
            None => tracing::trace!(correlation_id, collection = %self.collection(), "nothing found by id"),
        }

        Ok(found)
    }

    /// Retrieves one projected document by identity.
    ///
    /// Returns `None` both when no document matches the identity and when a
    /// match exists but its projection carries zero fields; the two cases
    /// are indistinguishable to the caller.
    pub async fn get_one_by_id_with_projection(
        &self,
        correlation_id: &str,
        key: &T::Key,
        projection: &ProjectionSpec,
    ) -> PersistenceResult<Option<Document>> {
        let guard = self.driver.read().await;
        let driver = self.opened(&guard)?;

        let found = driver
            .find_one(
                self.collection(),
                Some(self.composer.identity_eq(key)),
                self.composer.compose_projection(projection),
            )
            .await?;

        match found {
            Some(document) if !document.is_empty() => {
                tracing::trace!(correlation_id, collection = %self.collection(), "retrieved projected record by id");
                Ok(Some(document))
            }
            Some(_) => {
                tracing::trace!(correlation_id, collection = %self.collection(), "projection yielded no fields");
                Ok(None)
            }
            None => {
                tracing::trace!(correlation_id, collection = %self.collection(), "nothing found by id");
                Ok(None)
            }
        }
    }

    /// Retrieves one uniformly selected record among the filter matches.
    ///
    /// Counts the matches, then fetches the document at a random offset
    /// within the filtered result order. No explicit sort is forced, so the
    /// selected offset may drift under concurrent writes between the two
    /// calls; that is a documented limitation of this operation.
    pub async fn get_one_random(
        &self,
        correlation_id: &str,
        filter: Option<&FilterSpec>,
    ) -> PersistenceResult<Option<T>> {
        let guard = self.driver.read().await;
        let driver = self.opened(&guard)?;

        let filter_expr = filter.and_then(|f| self.composer.compose_filter(f));

        let count = driver.count(self.collection(), filter_expr.clone()).await?;
        if count == 0 {
            tracing::trace!(correlation_id, collection = %self.collection(), "no records to pick from");
            return Ok(None);
        }

        let offset = rand::thread_rng().gen_range(0..count);
        let query = Query::new().filter(filter_expr).skip(offset).limit(1);

        let found = driver
            .find(self.collection(), query)
            .await?
            .into_iter()
            .next()
            .map(T::from_document)
            .transpose()?;

        tracing::trace!(correlation_id, collection = %self.collection(), "retrieved random record at offset {}", offset);

        Ok(found)
    }

    /// Creates a record.
    ///
    /// When the record carries no identity, the identity type supports
    /// generation, and the `auto_generate_identity` option is on, a fresh
    /// identity is assigned first.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::DuplicateKey`] when a record with the
    /// same identity already exists. The duplicate check is a separate read
    /// before the insert, so it is best-effort under concurrent creates with
    /// the same identity.
    pub async fn create(&self, correlation_id: &str, mut record: T) -> PersistenceResult<T> {
        let guard = self.driver.read().await;
        let driver = self.opened(&guard)?;

        if record.key().is_none() && self.options.auto_generate_identity {
            if let Some(key) = T::Key::generate() {
                record.set_key(key);
            }
        }

        if let Some(key) = record.key() {
            let existing = driver
                .find_one(self.collection(), Some(self.composer.identity_eq(&key)), None)
                .await?;
            if existing.is_some() {
                return Err(PersistenceError::DuplicateKey(
                    format!("{}", key.to_bson()),
                    self.collection().to_string(),
                ));
            }
        }

        driver
            .insert_one(self.collection(), record.to_document()?)
            .await?;

        if self.options.debug {
            tracing::debug!(correlation_id, collection = %self.collection(), "created record");
        }

        Ok(record)
    }

    /// Upserts a record by identity: replaces the full document when found,
    /// inserts it otherwise. Returns the post-write record.
    pub async fn set(&self, correlation_id: &str, mut record: T) -> PersistenceResult<T> {
        let guard = self.driver.read().await;
        let driver = self.opened(&guard)?;

        let Some(key) = record.key() else {
            // No identity to match on: this degenerates to an insert.
            if self.options.auto_generate_identity {
                if let Some(key) = T::Key::generate() {
                    record.set_key(key);
                }
            }
            driver
                .insert_one(self.collection(), record.to_document()?)
                .await?;
            return Ok(record);
        };

        let written = driver
            .replace_one(
                self.collection(),
                self.composer.identity_eq(&key),
                record.to_document()?,
                true,
            )
            .await?;

        if self.options.debug {
            tracing::debug!(correlation_id, collection = %self.collection(), "set record");
        }

        match written {
            Some(document) => Ok(T::from_document(document)?),
            None => Ok(record),
        }
    }

    /// Replaces the full document by identity, without upsert. Returns
    /// `None` when the record carries no identity or nothing matches.
    pub async fn update(&self, correlation_id: &str, record: T) -> PersistenceResult<Option<T>> {
        let guard = self.driver.read().await;
        let driver = self.opened(&guard)?;

        let Some(key) = record.key() else {
            return Ok(None);
        };

        let written = driver
            .replace_one(
                self.collection(),
                self.composer.identity_eq(&key),
                record.to_document()?,
                false,
            )
            .await?
            .map(T::from_document)
            .transpose()?;

        if self.options.debug {
            tracing::debug!(correlation_id, collection = %self.collection(), "updated record: {}", written.is_some());
        }

        Ok(written)
    }

    /// Applies a field-level partial update to the first record matching the
    /// filter. Returns `None` without issuing a write when either spec is
    /// empty, and `None` when nothing matches.
    pub async fn modify(
        &self,
        correlation_id: &str,
        filter: &FilterSpec,
        update: &UpdateSpec,
    ) -> PersistenceResult<Option<T>> {
        let Some(ops) = self.composer.compose_update(update) else {
            return Ok(None);
        };
        let Some(filter_expr) = self.composer.compose_filter(filter) else {
            return Ok(None);
        };

        self.modify_matching(correlation_id, filter_expr, ops).await
    }

    /// Applies a field-level partial update to the record with the given
    /// identity. Returns `None` without a write when the update is empty.
    pub async fn modify_by_id(
        &self,
        correlation_id: &str,
        key: &T::Key,
        update: &UpdateSpec,
    ) -> PersistenceResult<Option<T>> {
        let Some(ops) = self.composer.compose_update(update) else {
            return Ok(None);
        };

        self.modify_matching(correlation_id, self.composer.identity_eq(key), ops)
            .await
    }

    async fn modify_matching(
        &self,
        correlation_id: &str,
        filter: Expr,
        update: UpdateOps,
    ) -> PersistenceResult<Option<T>> {
        let guard = self.driver.read().await;
        let driver = self.opened(&guard)?;

        let modified = driver
            .update_one(self.collection(), filter, update)
            .await?
            .map(T::from_document)
            .transpose()?;

        if self.options.debug {
            tracing::debug!(correlation_id, collection = %self.collection(), "modified record: {}", modified.is_some());
        }

        Ok(modified)
    }

    /// Atomically removes and returns the record with the given identity.
    pub async fn delete_by_id(
        &self,
        correlation_id: &str,
        key: &T::Key,
    ) -> PersistenceResult<Option<T>> {
        let guard = self.driver.read().await;
        let driver = self.opened(&guard)?;

        let removed = driver
            .delete_one(self.collection(), self.composer.identity_eq(key))
            .await?
            .map(T::from_document)
            .transpose()?;

        if self.options.debug {
            tracing::debug!(correlation_id, collection = %self.collection(), "deleted record by id: {}", removed.is_some());
        }

        Ok(removed)
    }

    /// Removes all records matching the filter. The removed count is logged,
    /// not returned.
    pub async fn delete_by_filter(
        &self,
        correlation_id: &str,
        filter: &FilterSpec,
    ) -> PersistenceResult<()> {
        let guard = self.driver.read().await;
        let driver = self.opened(&guard)?;

        let removed = driver
            .delete_many(self.collection(), self.composer.compose_filter(filter))
            .await?;

        tracing::debug!(correlation_id, collection = %self.collection(), "deleted {} records by filter", removed);

        Ok(())
    }

    /// Removes all records whose identity is in the given set. The removed
    /// count is logged, not returned.
    pub async fn delete_by_ids(
        &self,
        correlation_id: &str,
        keys: &[T::Key],
    ) -> PersistenceResult<()> {
        let guard = self.driver.read().await;
        let driver = self.opened(&guard)?;

        let removed = driver
            .delete_many(self.collection(), Some(self.composer.identity_in(keys)))
            .await?;

        tracing::debug!(correlation_id, collection = %self.collection(), "deleted {} records by ids", removed);

        Ok(())
    }
}
