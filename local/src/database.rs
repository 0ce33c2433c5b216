//! In-process document database with named collections and change feeds.

use crate::error::LocalError;
use crate::query::Query;
use crud_store_core::record::RecordId;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::broadcast;

/// A stored JSON document. Every document carries an `id`.
pub type Document = Map<String, Value>;

/// A committed change to a collection, carrying the affected document.
#[derive(Clone, Debug, PartialEq)]
pub enum ChangeEvent {
    /// A document was inserted
    Inserted(Document),
    /// A document was patched; carries the new version
    Updated(Document),
    /// A document was removed; carries the last version
    Removed(Document),
}

impl ChangeEvent {
    /// The affected document
    #[must_use]
    pub const fn document(&self) -> &Document {
        match self {
            Self::Inserted(document) | Self::Updated(document) | Self::Removed(document) => {
                document
            },
        }
    }

    /// Id of the affected document
    #[must_use]
    pub fn id(&self) -> Option<RecordId> {
        document_id(self.document())
    }
}

/// A database of named collections.
///
/// Collections are created on first access. The database is meant to be
/// shared behind an `Arc`.
///
/// # Example
///
/// ```
/// use crud_store_local::LocalDatabase;
/// use serde_json::{Value, json};
///
/// let db = LocalDatabase::new("app");
/// let users = db.collection("users").unwrap();
///
/// let Value::Object(doc) = json!({"id": "u1", "name": "Ada"}) else { unreachable!() };
/// users.insert(doc).unwrap();
///
/// let found = users.find().where_filter(json!({"name": "Ada"})).exec().unwrap();
/// assert_eq!(found.len(), 1);
/// ```
#[derive(Debug)]
pub struct LocalDatabase {
    name: String,
    collections: Mutex<HashMap<String, Arc<Collection>>>,
    change_capacity: usize,
}

impl LocalDatabase {
    /// Change events buffered per collection before slow watchers lag
    pub const DEFAULT_CHANGE_CAPACITY: usize = 256;

    /// Create an empty database
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            collections: Mutex::new(HashMap::new()),
            change_capacity: Self::DEFAULT_CHANGE_CAPACITY,
        }
    }

    /// Set how many change events each collection buffers
    #[must_use]
    pub const fn with_change_capacity(mut self, capacity: usize) -> Self {
        self.change_capacity = capacity;
        self
    }

    /// The database name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The collection called `name`, created empty if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`LocalError::Poisoned`] if the collection registry lock is
    /// poisoned.
    pub fn collection(&self, name: &str) -> Result<Arc<Collection>, LocalError> {
        let mut collections = self
            .collections
            .lock()
            .map_err(|_| LocalError::Poisoned(self.name.clone()))?;

        let collection = collections.entry(name.to_string()).or_insert_with(|| {
            tracing::debug!(database = %self.name, collection = name, "Creating collection");
            Arc::new(Collection::new(name, self.change_capacity))
        });
        Ok(Arc::clone(collection))
    }

    /// Names of the existing collections, sorted
    ///
    /// # Errors
    ///
    /// Returns [`LocalError::Poisoned`] if the registry lock is poisoned.
    pub fn collection_names(&self) -> Result<Vec<String>, LocalError> {
        let collections = self
            .collections
            .lock()
            .map_err(|_| LocalError::Poisoned(self.name.clone()))?;
        let mut names: Vec<String> = collections.keys().cloned().collect();
        names.sort();
        Ok(names)
    }
}

/// A named set of documents, unique by `id`, kept in insertion order.
///
/// Every committed write is published on [`Collection::changes`] after the
/// lock is released.
#[derive(Debug)]
pub struct Collection {
    name: String,
    documents: Mutex<Vec<Document>>,
    changes: broadcast::Sender<ChangeEvent>,
}

impl Collection {
    fn new(name: &str, change_capacity: usize) -> Self {
        let (changes, _) = broadcast::channel(change_capacity.max(1));
        Self {
            name: name.to_string(),
            documents: Mutex::new(Vec::new()),
            changes,
        }
    }

    /// The collection name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// A query over every document
    #[must_use]
    pub fn find(self: &Arc<Self>) -> Query {
        Query::new(Arc::clone(self))
    }

    /// A query returning at most one document
    #[must_use]
    pub fn find_one(self: &Arc<Self>) -> Query {
        self.find().limit(1)
    }

    /// Subscribe to changes committed from now on
    #[must_use]
    pub fn changes(&self) -> broadcast::Receiver<ChangeEvent> {
        self.changes.subscribe()
    }

    /// Store a new document.
    ///
    /// # Errors
    ///
    /// - [`LocalError::MissingId`]: the document has no string or integer `id`
    /// - [`LocalError::DuplicateId`]: a document with this id exists
    pub fn insert(&self, document: Document) -> Result<Document, LocalError> {
        let id = document_id(&document).ok_or(LocalError::MissingId)?;
        {
            let mut documents = self.lock()?;
            if position(&documents, &id).is_some() {
                return Err(LocalError::DuplicateId(id));
            }
            documents.push(document.clone());
        }

        tracing::debug!(collection = %self.name, %id, "Inserted document");
        self.publish(ChangeEvent::Inserted(document.clone()));
        Ok(document)
    }

    /// The document with `id`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`LocalError::Poisoned`] if the collection lock is poisoned.
    pub fn get(&self, id: &RecordId) -> Result<Option<Document>, LocalError> {
        let documents = self.lock()?;
        Ok(position(&documents, id).map(|index| documents[index].clone()))
    }

    /// Set the given fields on the document with `id` and return it.
    ///
    /// This is a shallow set: top-level fields in `changes` replace the
    /// stored ones and other fields are kept. The `id` itself never changes.
    ///
    /// # Errors
    ///
    /// Returns [`LocalError::NotFound`] if no document has this id.
    pub fn patch(&self, id: &RecordId, mut changes: Document) -> Result<Document, LocalError> {
        changes.remove("id");
        let updated = {
            let mut documents = self.lock()?;
            let index = position(&documents, id).ok_or_else(|| LocalError::NotFound(id.clone()))?;
            let document = &mut documents[index];
            document.extend(changes);
            document.clone()
        };

        tracing::debug!(collection = %self.name, %id, "Patched document");
        self.publish(ChangeEvent::Updated(updated.clone()));
        Ok(updated)
    }

    /// Remove the document with `id` and return its last version.
    ///
    /// # Errors
    ///
    /// Returns [`LocalError::NotFound`] if no document has this id.
    pub fn remove(&self, id: &RecordId) -> Result<Document, LocalError> {
        let removed = {
            let mut documents = self.lock()?;
            let index = position(&documents, id).ok_or_else(|| LocalError::NotFound(id.clone()))?;
            documents.remove(index)
        };

        tracing::debug!(collection = %self.name, %id, "Removed document");
        self.publish(ChangeEvent::Removed(removed.clone()));
        Ok(removed)
    }

    /// Number of stored documents
    ///
    /// # Errors
    ///
    /// Returns [`LocalError::Poisoned`] if the collection lock is poisoned.
    pub fn len(&self) -> Result<usize, LocalError> {
        Ok(self.lock()?.len())
    }

    /// Whether the collection is empty
    ///
    /// # Errors
    ///
    /// Returns [`LocalError::Poisoned`] if the collection lock is poisoned.
    pub fn is_empty(&self) -> Result<bool, LocalError> {
        Ok(self.lock()?.is_empty())
    }

    /// Copy of every document, in insertion order
    pub(crate) fn snapshot(&self) -> Result<Vec<Document>, LocalError> {
        Ok(self.lock()?.clone())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<Document>>, LocalError> {
        self.documents
            .lock()
            .map_err(|_| LocalError::Poisoned(self.name.clone()))
    }

    fn publish(&self, event: ChangeEvent) {
        // No receivers is fine
        let _ = self.changes.send(event);
    }
}

fn document_id(document: &Document) -> Option<RecordId> {
    document.get("id").and_then(RecordId::from_json)
}

fn position(documents: &[Document], id: &RecordId) -> Option<usize> {
    documents
        .iter()
        .position(|document| document_id(document).as_ref() == Some(id))
}
