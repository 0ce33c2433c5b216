//! The dispatch capability handed to action creators and callbacks.

use crate::lifecycle::LifecycleEvent;
use futures::future::BoxFuture;
use std::sync::Arc;

/// Something lifecycle events can be sent to.
///
/// The runtime store implements this for any action type that can be built
/// from a [`LifecycleEvent`]. Dispatch is fire-and-forget from the caller's
/// point of view: the returned future completes once the event has been
/// handed over, and delivery problems are logged by the implementation.
pub trait Dispatcher<T>: Send + Sync {
    /// Dispatch one event.
    fn dispatch(&self, event: LifecycleEvent<T>) -> BoxFuture<'_, ()>;
}

/// Shared handle to a dispatcher, cloned into callbacks.
pub type SharedDispatcher<T> = Arc<dyn Dispatcher<T>>;

/// Forward events into an unbounded channel.
///
/// Events sent after the receiver is dropped are discarded.
impl<T: Send + 'static> Dispatcher<T> for tokio::sync::mpsc::UnboundedSender<LifecycleEvent<T>> {
    fn dispatch(&self, event: LifecycleEvent<T>) -> BoxFuture<'_, ()> {
        if let Err(err) = self.send(event) {
            tracing::debug!(event = %err.0, "Dispatch receiver dropped, discarding event");
        }
        Box::pin(std::future::ready(()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;
    use crate::lifecycle::ActionKind;

    #[tokio::test]
    async fn channel_dispatcher_forwards_events() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<LifecycleEvent<u8>>();
        let dispatcher: SharedDispatcher<u8> = Arc::new(tx);
        let users = Context::new("users").unwrap();

        dispatcher.dispatch(LifecycleEvent::request(users.clone(), ActionKind::List)).await;

        assert_eq!(rx.recv().await, Some(LifecycleEvent::request(users, ActionKind::List)));
    }
}
