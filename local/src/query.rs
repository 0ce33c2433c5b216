//! Query builder over a collection, with live re-evaluation.

use crate::database::{Collection, Document};
use crate::error::LocalError;
use crate::selector::{Selector, compare_values, lookup};
use crud_store_core::filter::{OrderSpec, SortDirection};
use futures::stream::Stream;
use serde_json::{Value, json};
use std::cmp::Ordering;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

/// A query over one collection.
///
/// Built with `where_filter`, `sort`, `limit` and `skip`; evaluated with
/// [`Query::exec`] or kept live with [`Query::watch`]. Filtering happens
/// first, then sorting, then `skip` and `limit`.
#[derive(Clone, Debug)]
pub struct Query {
    collection: Arc<Collection>,
    selector: Option<Value>,
    sort: Vec<OrderSpec>,
    limit: Option<u64>,
    skip: u64,
}

impl Query {
    pub(crate) const fn new(collection: Arc<Collection>) -> Self {
        Self {
            collection,
            selector: None,
            sort: Vec::new(),
            limit: None,
            skip: 0,
        }
    }

    /// Restrict to documents matching `clause`.
    ///
    /// Calling this again narrows further: both clauses must match.
    #[must_use]
    pub fn where_filter(mut self, clause: Value) -> Self {
        self.selector = Some(match self.selector.take() {
            Some(existing) => json!({ "and": [existing, clause] }),
            None => clause,
        });
        self
    }

    /// Sort by `field`; later calls break ties of earlier ones
    #[must_use]
    pub fn sort(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.sort.push(OrderSpec {
            field: field.into(),
            direction,
        });
        self
    }

    /// Return at most `limit` documents
    #[must_use]
    pub const fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Skip the first `skip` matching documents
    #[must_use]
    pub const fn skip(mut self, skip: u64) -> Self {
        self.skip = skip;
        self
    }

    /// Evaluate the query against the current documents.
    ///
    /// # Errors
    ///
    /// Returns [`LocalError::InvalidSelector`] if the `where` clause does not
    /// compile, or [`LocalError::Poisoned`] if the collection lock is poisoned.
    pub fn exec(&self) -> Result<Vec<Document>, LocalError> {
        let selector = self.selector.as_ref().map(Selector::parse).transpose()?;

        let mut documents: Vec<Document> = self
            .collection
            .snapshot()?
            .into_iter()
            .filter(|document| selector.as_ref().is_none_or(|s| s.matches(document)))
            .collect();

        if !self.sort.is_empty() {
            documents.sort_by(|a, b| compare_documents(a, b, &self.sort));
        }

        let skip = usize::try_from(self.skip).unwrap_or(usize::MAX);
        let limit = self
            .limit
            .map_or(usize::MAX, |limit| usize::try_from(limit).unwrap_or(usize::MAX));

        Ok(documents.into_iter().skip(skip).take(limit).collect())
    }

    /// Evaluate the query now and again after every change to the collection.
    ///
    /// The first item is the current result. The stream keeps the collection
    /// alive and never ends on its own; drop it to stop watching. A watcher
    /// that falls behind the change buffer re-evaluates once for the missed
    /// changes.
    ///
    /// # Example
    ///
    /// ```
    /// use crud_store_local::LocalDatabase;
    /// use futures::StreamExt;
    /// use serde_json::{Value, json};
    ///
    /// # tokio_test::block_on(async {
    /// let users = LocalDatabase::new("app").collection("users").unwrap();
    /// let mut admins = Box::pin(users.find().where_filter(json!({"role": "admin"})).watch());
    ///
    /// assert!(admins.next().await.unwrap().unwrap().is_empty());
    ///
    /// let Value::Object(ada) = json!({"id": 1, "role": "admin"}) else { unreachable!() };
    /// users.insert(ada).unwrap();
    ///
    /// assert_eq!(admins.next().await.unwrap().unwrap().len(), 1);
    /// # });
    /// ```
    pub fn watch(self) -> impl Stream<Item = Result<Vec<Document>, LocalError>> + Send + 'static {
        let mut changes = self.collection.changes();

        async_stream::stream! {
            yield self.exec();

            loop {
                match changes.recv().await {
                    Ok(_) => yield self.exec(),
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::debug!(skipped, collection = self.collection.name(), "Query watcher lagged");
                        yield self.exec();
                    },
                    Err(RecvError::Closed) => break,
                }
            }
        }
    }
}

fn compare_documents(a: &Document, b: &Document, order: &[OrderSpec]) -> Ordering {
    order
        .iter()
        .map(|spec| {
            let ordering = compare_fields(lookup(a, &spec.field), lookup(b, &spec.field));
            match spec.direction {
                SortDirection::Ascending => ordering,
                SortDirection::Descending => ordering.reverse(),
            }
        })
        .find(|ordering| ordering.is_ne())
        .unwrap_or(Ordering::Equal)
}

/// Total order for sorting: missing and null first, then booleans, numbers,
/// strings, arrays and objects.
fn compare_fields(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let (a, b) = (a.unwrap_or(&Value::Null), b.unwrap_or(&Value::Null));
    type_rank(a)
        .cmp(&type_rank(b))
        .then_with(|| compare_values(a, b).unwrap_or(Ordering::Equal))
}

const fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}
