//! Scripted in-memory adapter
//!
//! [`MockAdapter`] answers each operation from a queue of scripted results
//! and records every call it receives, so tests can assert both on what
//! the action creator dispatched and on what it asked the backend.

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)] // Panics only on poisoned locks

use crud_store_core::adapter::{AdapterFuture, RequestAdapter, to_object};
use crud_store_core::error::AdapterError;
use crud_store_core::filter::LoopbackFilter;
use crud_store_core::record::{CountResponse, DeleteResponse, PartialRecord, Record, RecordId};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

/// One call received by a [`MockAdapter`].
#[derive(Clone, Debug, PartialEq)]
pub enum AdapterCall {
    /// `get_all(filter)`
    GetAll(Option<LoopbackFilter>),
    /// `count(filter)`
    Count(Option<LoopbackFilter>),
    /// `get_by_id(id, filter)`
    GetById(RecordId, Option<LoopbackFilter>),
    /// `create(body)`, with the body as JSON
    Create(PartialRecord),
    /// `update(id, patch)`
    Update(RecordId, PartialRecord),
    /// `delete(id)`
    Delete(RecordId),
}

struct Script<T> {
    get_all: VecDeque<Result<Vec<T>, AdapterError>>,
    count: VecDeque<Result<CountResponse, AdapterError>>,
    get_by_id: VecDeque<Result<T, AdapterError>>,
    create: VecDeque<Result<T, AdapterError>>,
    update: VecDeque<Result<T, AdapterError>>,
    delete: VecDeque<Result<DeleteResponse, AdapterError>>,
}

impl<T> Default for Script<T> {
    fn default() -> Self {
        Self {
            get_all: VecDeque::new(),
            count: VecDeque::new(),
            get_by_id: VecDeque::new(),
            create: VecDeque::new(),
            update: VecDeque::new(),
            delete: VecDeque::new(),
        }
    }
}

/// Adapter answering from scripted results.
///
/// Each `with_*` call queues one result for that operation; results are
/// consumed in order. When a queue is empty the adapter falls back to:
///
/// | Operation | Fallback |
/// |---|---|
/// | `get_all` | empty list |
/// | `count` | `{count: 0}` |
/// | `get_by_id`, `update` | [`AdapterError::NotFound`] |
/// | `create` | echoes the body |
/// | `delete` | `{id}` |
///
/// # Example
///
/// ```
/// use crud_store_core::adapter::RequestAdapter;
/// use crud_store_core::error::AdapterError;
/// use crud_store_testing::{AdapterCall, MockAdapter};
/// use serde_json::Value;
///
/// # tokio_test::block_on(async {
/// let adapter = MockAdapter::<Value>::new()
///     .with_get_all(Err(AdapterError::Request("boom".into())));
///
/// assert!(adapter.get_all(None).await.is_err());
/// assert!(adapter.get_all(None).await.unwrap().is_empty());
/// assert_eq!(adapter.calls(), vec![AdapterCall::GetAll(None), AdapterCall::GetAll(None)]);
/// # });
/// ```
pub struct MockAdapter<T> {
    script: Mutex<Script<T>>,
    calls: Mutex<Vec<AdapterCall>>,
    count_delay: Option<Duration>,
}

impl<T: Record> MockAdapter<T> {
    /// Create an adapter with no scripted results
    #[must_use]
    pub fn new() -> Self {
        Self {
            script: Mutex::new(Script::default()),
            calls: Mutex::new(Vec::new()),
            count_delay: None,
        }
    }

    /// Queue a `get_all` result
    #[must_use]
    pub fn with_get_all(self, result: Result<Vec<T>, AdapterError>) -> Self {
        self.script.lock().unwrap().get_all.push_back(result);
        self
    }

    /// Queue a `count` result
    #[must_use]
    pub fn with_count(self, result: Result<CountResponse, AdapterError>) -> Self {
        self.script.lock().unwrap().count.push_back(result);
        self
    }

    /// Queue a `get_by_id` result
    #[must_use]
    pub fn with_get_by_id(self, result: Result<T, AdapterError>) -> Self {
        self.script.lock().unwrap().get_by_id.push_back(result);
        self
    }

    /// Queue a `create` result
    #[must_use]
    pub fn with_create(self, result: Result<T, AdapterError>) -> Self {
        self.script.lock().unwrap().create.push_back(result);
        self
    }

    /// Queue an `update` result
    #[must_use]
    pub fn with_update(self, result: Result<T, AdapterError>) -> Self {
        self.script.lock().unwrap().update.push_back(result);
        self
    }

    /// Queue a `delete` result
    #[must_use]
    pub fn with_delete(self, result: Result<DeleteResponse, AdapterError>) -> Self {
        self.script.lock().unwrap().delete.push_back(result);
        self
    }

    /// Delay every `count` answer, to make it settle after the list
    #[must_use]
    pub const fn with_count_delay(mut self, delay: Duration) -> Self {
        self.count_delay = Some(delay);
        self
    }

    /// Every call received so far, in order
    #[must_use]
    pub fn calls(&self) -> Vec<AdapterCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of calls received so far
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn record(&self, call: AdapterCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl<T: Record> Default for MockAdapter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Record> RequestAdapter<T> for MockAdapter<T> {
    type Filter = LoopbackFilter;

    fn get_all(&self, filter: Option<LoopbackFilter>) -> AdapterFuture<'_, Vec<T>> {
        self.record(AdapterCall::GetAll(filter));
        let result = self
            .script
            .lock()
            .unwrap()
            .get_all
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()));
        Box::pin(async move { result })
    }

    fn count(&self, filter: Option<LoopbackFilter>) -> AdapterFuture<'_, CountResponse> {
        self.record(AdapterCall::Count(filter));
        let result = self
            .script
            .lock()
            .unwrap()
            .count
            .pop_front()
            .unwrap_or_else(|| Ok(CountResponse::default()));
        let delay = self.count_delay;
        Box::pin(async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            result
        })
    }

    fn get_by_id(&self, id: RecordId, filter: Option<LoopbackFilter>) -> AdapterFuture<'_, T> {
        self.record(AdapterCall::GetById(id.clone(), filter));
        let result = self
            .script
            .lock()
            .unwrap()
            .get_by_id
            .pop_front()
            .unwrap_or(Err(AdapterError::NotFound(id)));
        Box::pin(async move { result })
    }

    fn create(&self, body: T) -> AdapterFuture<'_, T> {
        let result = match to_object(&body) {
            Ok(json) => {
                self.record(AdapterCall::Create(json));
                self.script
                    .lock()
                    .unwrap()
                    .create
                    .pop_front()
                    .unwrap_or(Ok(body))
            },
            Err(error) => Err(error),
        };
        Box::pin(async move { result })
    }

    fn update(&self, id: RecordId, patch: PartialRecord) -> AdapterFuture<'_, T> {
        self.record(AdapterCall::Update(id.clone(), patch));
        let result = self
            .script
            .lock()
            .unwrap()
            .update
            .pop_front()
            .unwrap_or(Err(AdapterError::NotFound(id)));
        Box::pin(async move { result })
    }

    fn delete(&self, id: RecordId) -> AdapterFuture<'_, DeleteResponse> {
        self.record(AdapterCall::Delete(id.clone()));
        let result = self
            .script
            .lock()
            .unwrap()
            .delete
            .pop_front()
            .unwrap_or_else(|| Ok(DeleteResponse { id }));
        Box::pin(async move { result })
    }
}
