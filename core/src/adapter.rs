//! The request adapter abstraction.
//!
//! An adapter translates the six CRUD/count operations into calls against a
//! concrete backend. The core only depends on this trait; the workspace
//! ships two implementations:
//!
//! - **`LoopbackAdapter`** (in `crud-store-loopback`): REST over HTTP
//! - **`LocalAdapter`** (in `crud-store-local`): in-process reactive document database
//!
//! # Dyn Compatibility
//!
//! The trait returns `Pin<Box<dyn Future>>` instead of using `async fn` so it
//! can be shared as `Arc<dyn RequestAdapter<T, Filter = F>>` by action creators.

use crate::error::AdapterError;
use crate::record::{CountResponse, DeleteResponse, PartialRecord, RecordId};
use std::future::Future;
use std::pin::Pin;

/// Boxed future returned by adapter operations.
pub type AdapterFuture<'a, R> = Pin<Box<dyn Future<Output = Result<R, AdapterError>> + Send + 'a>>;

/// Transport for one resource.
///
/// Every operation resolves with data or rejects with an [`AdapterError`];
/// expected failure modes (network, storage) never panic.
///
/// # Example
///
/// ```no_run
/// use crud_store_core::adapter::RequestAdapter;
/// use crud_store_core::error::AdapterError;
/// use crud_store_core::filter::LoopbackFilter;
///
/// async fn first_page<A>(adapter: &A) -> Result<Vec<serde_json::Value>, AdapterError>
/// where
///     A: RequestAdapter<serde_json::Value, Filter = LoopbackFilter>,
/// {
///     adapter.get_all(Some(LoopbackFilter::new().with_limit(20))).await
/// }
/// ```
pub trait RequestAdapter<T>: Send + Sync {
    /// Filter type understood by this backend
    type Filter: Clone + Send + Sync + 'static;

    /// List records matching the filter.
    fn get_all(&self, filter: Option<Self::Filter>) -> AdapterFuture<'_, Vec<T>>;

    /// Count records matching the filter.
    ///
    /// Implementations only honour the restriction part of the filter.
    fn count(&self, filter: Option<Self::Filter>) -> AdapterFuture<'_, CountResponse>;

    /// Fetch one record by id.
    fn get_by_id(&self, id: RecordId, filter: Option<Self::Filter>) -> AdapterFuture<'_, T>;

    /// Create a record and return it as stored.
    fn create(&self, body: T) -> AdapterFuture<'_, T>;

    /// Apply a partial update and return the updated record.
    fn update(&self, id: RecordId, patch: PartialRecord) -> AdapterFuture<'_, T>;

    /// Delete a record.
    fn delete(&self, id: RecordId) -> AdapterFuture<'_, DeleteResponse>;
}

/// Body cleanup applied by adapters before create/update.
///
/// Receives the JSON object about to be sent and returns the one to send.
pub type CleanBody = std::sync::Arc<dyn Fn(PartialRecord) -> PartialRecord + Send + Sync>;

/// Cleanup that strips the `id` field, which REST backends reject on write.
#[must_use]
pub fn strip_id(mut body: PartialRecord) -> PartialRecord {
    body.remove("id");
    body
}

/// Cleanup that leaves the body unchanged.
#[must_use]
pub const fn keep_body(body: PartialRecord) -> PartialRecord {
    body
}

/// Serialize a record into the JSON object adapters send.
///
/// # Errors
///
/// Returns [`AdapterError::Decode`] if the record does not serialize into a
/// JSON object.
pub fn to_object<T: serde::Serialize>(record: &T) -> Result<PartialRecord, AdapterError> {
    match serde_json::to_value(record) {
        Ok(serde_json::Value::Object(map)) => Ok(map),
        Ok(other) => Err(AdapterError::Decode(format!(
            "expected a JSON object body, got {other}"
        ))),
        Err(e) => Err(AdapterError::Decode(e.to_string())),
    }
}
