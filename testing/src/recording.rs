//! A dispatcher that remembers what it was given.

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)] // Panics only on poisoned locks

use crud_store_core::dispatch::{Dispatcher, SharedDispatcher};
use crud_store_core::lifecycle::{ActionKind, LifecycleEvent, Phase};
use futures::future::BoxFuture;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

/// Captures every dispatched lifecycle event, in order.
///
/// # Example
///
/// ```
/// use crud_store_core::context::Context;
/// use crud_store_core::lifecycle::{ActionKind, LifecycleEvent};
/// use crud_store_testing::RecordingDispatcher;
///
/// # tokio_test::block_on(async {
/// let recorder = RecordingDispatcher::<u8>::new();
/// let users = Context::new("users").unwrap();
///
/// recorder.shared().dispatch(LifecycleEvent::request(users, ActionKind::List)).await;
///
/// assert_eq!(recorder.type_strings(), vec!["@users:LIST_REQUEST"]);
/// # });
/// ```
pub struct RecordingDispatcher<T> {
    events: Mutex<Vec<LifecycleEvent<T>>>,
    dispatched: Notify,
}

impl<T: Clone + Send + 'static> RecordingDispatcher<T> {
    /// Create an empty recorder
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            events: Mutex::new(Vec::new()),
            dispatched: Notify::new(),
        })
    }

    /// This recorder as a shared dispatcher
    #[must_use]
    pub fn shared(self: &Arc<Self>) -> SharedDispatcher<T> {
        Arc::clone(self) as SharedDispatcher<T>
    }

    /// Events dispatched so far
    #[must_use]
    pub fn events(&self) -> Vec<LifecycleEvent<T>> {
        self.events.lock().unwrap().clone()
    }

    /// Wire identifiers of the events dispatched so far
    #[must_use]
    pub fn type_strings(&self) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(LifecycleEvent::type_string)
            .collect()
    }

    /// Number of events matching `action` and `phase`
    #[must_use]
    pub fn count_of(&self, action: ActionKind, phase: Phase) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|event| event.is(action, phase))
            .count()
    }

    /// Position of the first event matching `action` and `phase`
    #[must_use]
    pub fn position_of(&self, action: ActionKind, phase: Phase) -> Option<usize> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .position(|event| event.is(action, phase))
    }

    /// Wait until at least `len` events were dispatched.
    ///
    /// Returns `false` on timeout.
    pub async fn wait_for_len(&self, len: usize, timeout: Duration) -> bool {
        tokio::time::timeout(timeout, async {
            loop {
                let notified = self.dispatched.notified();
                if self.events.lock().unwrap().len() >= len {
                    return;
                }
                notified.await;
            }
        })
        .await
        .is_ok()
    }

    /// Wait until an event matching `action` and `phase` was dispatched.
    ///
    /// Returns `false` on timeout.
    pub async fn wait_for_event(&self, action: ActionKind, phase: Phase, timeout: Duration) -> bool {
        tokio::time::timeout(timeout, async {
            loop {
                let notified = self.dispatched.notified();
                if self.position_of(action, phase).is_some() {
                    return;
                }
                notified.await;
            }
        })
        .await
        .is_ok()
    }
}

impl<T: Send + 'static> Dispatcher<T> for RecordingDispatcher<T> {
    fn dispatch(&self, event: LifecycleEvent<T>) -> BoxFuture<'_, ()> {
        self.events.lock().unwrap().push(event);
        self.dispatched.notify_waiters();
        Box::pin(std::future::ready(()))
    }
}
