//! # Crud Store Runtime
//!
//! Runtime implementation for CRUD resources: the [`Store`] that owns the
//! application state and runs the root reducer.
//!
//! ## Core Components
//!
//! - **Store**: holds state behind an `RwLock`, serializes reducer calls and
//!   broadcasts every reduced action to subscribers
//! - **Dispatcher**: a [`Store`] is a [`Dispatcher`] for any lifecycle event its
//!   action type can be built from, so action creators dispatch straight into it
//!
//! ## Example
//!
//! ```
//! use crud_store_core::context::Context;
//! use crud_store_core::lifecycle::{ActionKind, LifecycleEvent};
//! use crud_store_core::reducer::ResourceReducer;
//! use crud_store_runtime::Store;
//! use serde_json::{Value, json};
//!
//! # tokio_test::block_on(async {
//! let users = Context::new("users").unwrap();
//! let reducer = ResourceReducer::new(users.clone(), json!({}));
//! let store = Store::new(reducer.initial_state(), reducer);
//!
//! store.send(LifecycleEvent::<Value>::request(users, ActionKind::List)).await;
//!
//! assert!(store.state(|s| s.list.is_fetch_loading).await);
//! # });
//! ```

use crud_store_core::dispatch::{Dispatcher, SharedDispatcher};
use crud_store_core::lifecycle::LifecycleEvent;
use crud_store_core::reducer::Reducer;
use futures::future::BoxFuture;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{RwLock, broadcast};

/// Error types for the Store runtime
pub mod error {
    use thiserror::Error;

    /// Errors that can occur while observing a Store
    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum StoreError {
        /// Timeout waiting for a matching action
        ///
        /// Returned by `wait_for` when the timeout expires before a matching
        /// action is received.
        #[error("Timeout waiting for action")]
        Timeout,

        /// Action broadcast channel closed
        ///
        /// Every handle to the store was dropped while waiting.
        #[error("Action broadcast channel closed")]
        ChannelClosed,
    }
}

pub use error::StoreError;

/// Configuration for Store instances
///
/// # Example
///
/// ```
/// use crud_store_runtime::StoreConfig;
///
/// let config = StoreConfig::default().with_broadcast_capacity(256);
/// assert_eq!(config.broadcast_capacity, 256);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreConfig {
    /// Number of actions buffered for each subscriber before it lags
    pub broadcast_capacity: usize,
}

impl StoreConfig {
    /// Create a new configuration with custom values
    #[must_use]
    pub const fn new(broadcast_capacity: usize) -> Self {
        Self { broadcast_capacity }
    }

    /// Set the broadcast capacity
    #[must_use]
    pub const fn with_broadcast_capacity(mut self, capacity: usize) -> Self {
        self.broadcast_capacity = capacity;
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            broadcast_capacity: 64,
        }
    }
}

/// The Store - runtime coordinator for a reducer
///
/// The Store manages:
/// 1. State (behind `RwLock` for concurrent access)
/// 2. Reducer (pure state transitions)
/// 3. Action broadcast (every reduced action, for observers)
///
/// Cloning a store yields another handle to the same state.
///
/// # Type Parameters
///
/// - `S`: State type
/// - `A`: Action type
/// - `R`: Reducer implementation
pub struct Store<S, A, R> {
    state: Arc<RwLock<S>>,
    reducer: Arc<R>,
    action_broadcast: broadcast::Sender<A>,
}

impl<S, A, R> Clone for Store<S, A, R> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            reducer: Arc::clone(&self.reducer),
            action_broadcast: self.action_broadcast.clone(),
        }
    }
}

impl<S, A, R> Store<S, A, R>
where
    R: Reducer<State = S, Action = A> + Send + Sync + 'static,
    A: Clone + Send + 'static,
    S: Send + Sync + 'static,
{
    /// Create a new store with initial state and reducer
    #[must_use]
    pub fn new(initial_state: S, reducer: R) -> Self {
        Self::with_config(initial_state, reducer, StoreConfig::default())
    }

    /// Create a new store with a custom configuration
    #[must_use]
    pub fn with_config(initial_state: S, reducer: R, config: StoreConfig) -> Self {
        let (action_broadcast, _) = broadcast::channel(config.broadcast_capacity.max(1));

        Self {
            state: Arc::new(RwLock::new(initial_state)),
            reducer: Arc::new(reducer),
            action_broadcast,
        }
    }

    /// Send an action to the store
    ///
    /// 1. Acquires write lock on state
    /// 2. Calls the reducer
    /// 3. Releases the lock and broadcasts the action to subscribers
    ///
    /// Concurrent `send()` calls serialize at the reducer level: each
    /// action is applied atomically with respect to readers.
    #[tracing::instrument(skip(self, action), name = "store_send")]
    pub async fn send(&self, action: A) {
        tracing::debug!("Processing action");
        metrics::counter!("store.events.total").increment(1);

        {
            let mut state = self.state.write().await;
            tracing::trace!("Acquired write lock on state");

            let start = std::time::Instant::now();
            self.reducer.reduce(&mut *state, action.clone());
            metrics::histogram!("store.reducer.duration_seconds")
                .record(start.elapsed().as_secs_f64());
        }

        // No subscribers is fine
        let _ = self.action_broadcast.send(action);
    }

    /// Read current state via a closure
    ///
    /// Access state through a closure to ensure the lock is released promptly:
    ///
    /// ```ignore
    /// let count = store.state(|s| s.list.count).await;
    /// ```
    pub async fn state<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&S) -> T,
    {
        let state = self.state.read().await;
        f(&state)
    }

    /// Subscribe to every action reduced from now on
    ///
    /// If the receiver lags it skips old actions and receives
    /// [`broadcast::error::RecvError::Lagged`].
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<A> {
        self.action_broadcast.subscribe()
    }

    /// Wait for the next action matching `predicate`
    ///
    /// The subscription is taken when this method is called, not when the
    /// returned future is first polled, so an operation started afterwards
    /// cannot slip past it:
    ///
    /// ```ignore
    /// let done = store.wait_for(|a| a.is(ActionKind::Count, Phase::Success), timeout);
    /// users.list_and_count(&dispatcher, None).await?;
    /// done.await?;
    /// ```
    ///
    /// # Errors
    ///
    /// - [`StoreError::Timeout`]: Timeout expired before a matching action
    /// - [`StoreError::ChannelClosed`]: The store was dropped
    pub fn wait_for<F>(
        &self,
        predicate: F,
        timeout: Duration,
    ) -> impl Future<Output = Result<A, StoreError>> + Send + 'static
    where
        F: Fn(&A) -> bool + Send + 'static,
    {
        let mut rx = self.action_broadcast.subscribe();

        async move {
            tokio::time::timeout(timeout, async move {
                loop {
                    match rx.recv().await {
                        Ok(action) if predicate(&action) => return Ok(action),
                        Ok(_) => {},
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            // A dropped match is caught by the timeout
                            tracing::warn!(skipped, "Action observer lagged");
                        },
                        Err(broadcast::error::RecvError::Closed) => {
                            return Err(StoreError::ChannelClosed);
                        },
                    }
                }
            })
            .await
            .map_err(|_| StoreError::Timeout)?
        }
    }

    /// Send an action and wait for a matching action, including itself
    ///
    /// # Errors
    ///
    /// See [`Store::wait_for`].
    pub async fn send_and_wait_for<F>(
        &self,
        action: A,
        predicate: F,
        timeout: Duration,
    ) -> Result<A, StoreError>
    where
        F: Fn(&A) -> bool + Send + 'static,
    {
        let matched = self.wait_for(predicate, timeout);
        self.send(action).await;
        matched.await
    }

    /// A shared dispatcher feeding lifecycle events of record type `T` into
    /// this store.
    #[must_use]
    pub fn dispatcher<T>(&self) -> SharedDispatcher<T>
    where
        A: From<LifecycleEvent<T>>,
        T: Send + 'static,
    {
        Arc::new(self.clone())
    }
}

impl<S, A, R, T> Dispatcher<T> for Store<S, A, R>
where
    R: Reducer<State = S, Action = A> + Send + Sync + 'static,
    A: From<LifecycleEvent<T>> + Clone + Send + 'static,
    S: Send + Sync + 'static,
    T: Send + 'static,
{
    fn dispatch(&self, event: LifecycleEvent<T>) -> BoxFuture<'_, ()> {
        tracing::debug!(%event, "Dispatching lifecycle event");
        Box::pin(self.send(A::from(event)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crud_store_core::context::Context;
    use crud_store_core::lifecycle::{ActionKind, Phase, SuccessPayload};
    use crud_store_core::record::CountResponse;
    use crud_store_core::reducer::ResourceReducer;
    use crud_store_core::state::ResourceState;
    use serde_json::{Value, json};

    type UserStore = Store<ResourceState<Value>, LifecycleEvent<Value>, ResourceReducer<Value>>;

    fn users() -> Context {
        Context::new("users").unwrap()
    }

    fn store() -> UserStore {
        let reducer = ResourceReducer::new(users(), json!({}));
        Store::new(reducer.initial_state(), reducer)
    }

    #[tokio::test]
    async fn send_applies_reducer() {
        let store = store();
        store
            .send(LifecycleEvent::success(
                users(),
                SuccessPayload::Counted(CountResponse::new(3)),
            ))
            .await;
        assert_eq!(store.state(|s| s.list.count).await, 3);
    }

    #[tokio::test]
    async fn clones_share_state() {
        let store = store();
        let other = store.clone();
        other
            .send(LifecycleEvent::request(users(), ActionKind::Fetch))
            .await;
        assert!(store.state(|s| s.model.is_loading).await);
    }

    #[tokio::test]
    async fn subscribers_see_every_action() {
        let store = store();
        let mut rx = store.subscribe();

        store.send(LifecycleEvent::request(users(), ActionKind::List)).await;
        store.send(LifecycleEvent::fail(users(), ActionKind::List)).await;

        assert!(rx.recv().await.unwrap().is(ActionKind::List, Phase::Request));
        assert!(rx.recv().await.unwrap().is(ActionKind::List, Phase::Fail));
    }

    #[tokio::test]
    async fn wait_for_times_out() {
        let store = store();
        let result = store
            .wait_for(|_| true, Duration::from_millis(20))
            .await;
        assert_eq!(result, Err(StoreError::Timeout));
    }

    #[tokio::test]
    async fn dispatcher_feeds_the_store() {
        let store = store();
        let dispatcher = store.dispatcher::<Value>();

        let done = store.wait_for(
            |event| event.is(ActionKind::Delete, Phase::Request),
            Duration::from_secs(1),
        );
        dispatcher
            .dispatch(LifecycleEvent::request(users(), ActionKind::Delete))
            .await;

        assert!(done.await.is_ok());
        assert!(store.state(|s| s.model.is_loading).await);
    }
}
