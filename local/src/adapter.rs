//! Request adapter over a [`LocalDatabase`] collection.

use crate::database::{Collection, Document, LocalDatabase};
use crate::error::LocalError;
use crate::query::Query;
use chrono::SecondsFormat;
use crud_store_core::adapter::{AdapterFuture, CleanBody, RequestAdapter, keep_body, to_object};
use crud_store_core::environment::{Clock, IdGenerator, SystemClock, UuidIdGenerator};
use crud_store_core::error::AdapterError;
use crud_store_core::filter::LoopbackFilter;
use crud_store_core::record::{CountResponse, DeleteResponse, PartialRecord, Record, RecordId};
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::Instrument;

/// A database handle that may still be opening.
pub type DatabaseFuture = Shared<BoxFuture<'static, Arc<LocalDatabase>>>;

/// Adapter for one collection of a local database.
///
/// Loopback filters are translated into queries: `where` becomes the
/// selector, `order` a sort, `limit` and `skip` pagination. `include` has no
/// meaning locally and is ignored.
///
/// Creates fill an absent or `null` `id` from the id generator and stamp
/// `createdAt` and `updatedAt`; a provided id that is neither a string nor an
/// `i64` is rejected, never replaced. Updates stamp `updatedAt` and never
/// touch `createdAt`.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use crud_store_core::adapter::RequestAdapter;
/// use crud_store_local::{LocalAdapter, LocalDatabase};
/// use serde_json::{Value, json};
///
/// # tokio_test::block_on(async {
/// let db = Arc::new(LocalDatabase::new("app"));
/// let users = LocalAdapter::<Value>::from_database(db, "users");
///
/// let created = users.create(json!({"name": "Ada"})).await.unwrap();
/// assert!(created["id"].is_string());
/// assert_eq!(created["createdAt"], created["updatedAt"]);
/// # });
/// ```
pub struct LocalAdapter<T> {
    database: DatabaseFuture,
    collection: String,
    clean_body: CleanBody,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    _record: PhantomData<fn() -> T>,
}

impl<T> Clone for LocalAdapter<T> {
    fn clone(&self) -> Self {
        Self {
            database: self.database.clone(),
            collection: self.collection.clone(),
            clean_body: Arc::clone(&self.clean_body),
            clock: Arc::clone(&self.clock),
            ids: Arc::clone(&self.ids),
            _record: PhantomData,
        }
    }
}

impl<T: Record> LocalAdapter<T> {
    /// Adapter over `collection` of a database that becomes available when
    /// `database` resolves.
    ///
    /// The future is awaited once and shared by every operation.
    #[must_use]
    pub fn new<F>(database: F, collection: impl Into<String>) -> Self
    where
        F: Future<Output = Arc<LocalDatabase>> + Send + 'static,
    {
        Self {
            database: database.boxed().shared(),
            collection: collection.into(),
            clean_body: Arc::new(keep_body),
            clock: Arc::new(SystemClock),
            ids: Arc::new(UuidIdGenerator),
            _record: PhantomData,
        }
    }

    /// Adapter over `collection` of an open database
    #[must_use]
    pub fn from_database(database: Arc<LocalDatabase>, collection: impl Into<String>) -> Self {
        Self::new(futures::future::ready(database), collection)
    }

    /// Replace the body cleaner applied before create and update
    #[must_use]
    pub fn with_cleaner<C>(mut self, cleaner: C) -> Self
    where
        C: Fn(PartialRecord) -> PartialRecord + Send + Sync + 'static,
    {
        self.clean_body = Arc::new(cleaner);
        self
    }

    /// Clock used for `createdAt` and `updatedAt`
    #[must_use]
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Generator for the ids of created records
    #[must_use]
    pub fn with_id_generator(mut self, ids: impl IdGenerator + 'static) -> Self {
        self.ids = Arc::new(ids);
        self
    }

    async fn collection(&self) -> Result<Arc<Collection>, LocalError> {
        self.database.clone().await.collection(&self.collection)
    }

    fn now(&self) -> Value {
        Value::String(self.clock.now().to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    async fn list(&self, filter: Option<LoopbackFilter>) -> Result<Vec<T>, AdapterError> {
        let collection = self.collection().await?;
        let documents = build_query(&collection, filter.as_ref()).exec()?;
        tracing::debug!(count = documents.len(), "Queried documents");
        documents.into_iter().map(decode).collect()
    }

    async fn count_where(
        &self,
        filter: Option<LoopbackFilter>,
    ) -> Result<CountResponse, AdapterError> {
        let collection = self.collection().await?;
        let restriction = filter.as_ref().and_then(LoopbackFilter::where_only);
        let matched = build_query(&collection, restriction.as_ref()).exec()?.len();
        Ok(CountResponse::new(u64::try_from(matched).unwrap_or(u64::MAX)))
    }

    async fn find_by_id(&self, id: RecordId) -> Result<T, AdapterError> {
        let collection = self.collection().await?;
        let found = collection
            .find_one()
            .where_filter(json!({ "id": id.to_json() }))
            .exec()?
            .pop()
            .ok_or(AdapterError::NotFound(id))?;
        decode(found)
    }

    async fn insert(&self, body: T) -> Result<T, AdapterError> {
        let mut document = (self.clean_body)(to_object(&body)?);
        match document.get("id") {
            None | Some(Value::Null) => {
                document.insert("id".into(), Value::String(self.ids.next_id()));
            },
            Some(id) if RecordId::from_json(id).is_none() => {
                tracing::warn!(%id, "Rejecting document with unusable id");
                return Err(LocalError::MissingId.into());
            },
            Some(_) => {},
        }
        let now = self.now();
        document.insert("createdAt".into(), now.clone());
        document.insert("updatedAt".into(), now);

        let collection = self.collection().await?;
        decode(collection.insert(document)?)
    }

    async fn set(&self, id: RecordId, patch: PartialRecord) -> Result<T, AdapterError> {
        let mut changes = (self.clean_body)(patch);
        changes.remove("createdAt");
        changes.insert("updatedAt".into(), self.now());

        let collection = self.collection().await?;
        decode(collection.patch(&id, changes)?)
    }

    async fn remove(&self, id: RecordId) -> Result<DeleteResponse, AdapterError> {
        self.collection().await?.remove(&id)?;
        Ok(DeleteResponse { id })
    }
}

impl<T: Record> RequestAdapter<T> for LocalAdapter<T> {
    type Filter = LoopbackFilter;

    fn get_all(&self, filter: Option<LoopbackFilter>) -> AdapterFuture<'_, Vec<T>> {
        let span = tracing::debug_span!("local.get_all", collection = %self.collection);
        Box::pin(self.list(filter).instrument(span))
    }

    fn count(&self, filter: Option<LoopbackFilter>) -> AdapterFuture<'_, CountResponse> {
        let span = tracing::debug_span!("local.count", collection = %self.collection);
        Box::pin(self.count_where(filter).instrument(span))
    }

    fn get_by_id(&self, id: RecordId, _filter: Option<LoopbackFilter>) -> AdapterFuture<'_, T> {
        let span = tracing::debug_span!("local.get_by_id", collection = %self.collection, %id);
        Box::pin(self.find_by_id(id).instrument(span))
    }

    fn create(&self, body: T) -> AdapterFuture<'_, T> {
        let span = tracing::debug_span!("local.create", collection = %self.collection);
        Box::pin(self.insert(body).instrument(span))
    }

    fn update(&self, id: RecordId, patch: PartialRecord) -> AdapterFuture<'_, T> {
        let span = tracing::debug_span!("local.update", collection = %self.collection, %id);
        Box::pin(self.set(id, patch).instrument(span))
    }

    fn delete(&self, id: RecordId) -> AdapterFuture<'_, DeleteResponse> {
        let span = tracing::debug_span!("local.delete", collection = %self.collection, %id);
        Box::pin(self.remove(id).instrument(span))
    }
}

fn build_query(collection: &Arc<Collection>, filter: Option<&LoopbackFilter>) -> Query {
    let mut query = collection.find();
    let Some(filter) = filter else {
        return query;
    };

    if let Some(clause) = &filter.where_clause {
        query = query.where_filter(clause.clone());
    }
    if let Some(order) = filter.order_spec() {
        query = query.sort(order.field, order.direction);
    }
    if let Some(limit) = filter.limit {
        query = query.limit(limit);
    }
    if let Some(skip) = filter.skip {
        query = query.skip(skip);
    }
    query
}

fn decode<T: DeserializeOwned>(document: Document) -> Result<T, AdapterError> {
    serde_json::from_value(Value::Object(document))
        .map_err(|e| AdapterError::Decode(e.to_string()))
}
