//! Given-When-Then harness for reducers, plus assertions over dispatched
//! event sequences.

#![allow(clippy::module_name_repetitions)] // ReducerTest is the natural name

use crud_store_core::reducer::Reducer;

type StateAssertion<S> = Box<dyn FnOnce(&S)>;

/// Fluent API for testing reducers with Given-When-Then syntax
///
/// Several `when_action` calls are applied in order.
///
/// # Example
///
/// ```
/// use crud_store_core::context::Context;
/// use crud_store_core::lifecycle::{ActionKind, LifecycleEvent};
/// use crud_store_core::reducer::ResourceReducer;
/// use crud_store_testing::ReducerTest;
/// use serde_json::json;
///
/// let users = Context::new("users").unwrap();
/// let reducer = ResourceReducer::new(users.clone(), json!({}));
/// let initial = reducer.initial_state();
///
/// ReducerTest::new(reducer)
///     .given_state(initial)
///     .when_action(LifecycleEvent::request(users, ActionKind::Count))
///     .then_state(|state| {
///         assert!(state.list.is_count_loading);
///     })
///     .run();
/// ```
pub struct ReducerTest<R, S, A>
where
    R: Reducer<State = S, Action = A>,
{
    reducer: R,
    initial_state: Option<S>,
    actions: Vec<A>,
    state_assertions: Vec<StateAssertion<S>>,
}

impl<R, S, A> ReducerTest<R, S, A>
where
    R: Reducer<State = S, Action = A>,
{
    /// Create a new reducer test with the given reducer
    #[must_use]
    pub const fn new(reducer: R) -> Self {
        Self {
            reducer,
            initial_state: None,
            actions: Vec::new(),
            state_assertions: Vec::new(),
        }
    }

    /// Set the initial state (Given)
    #[must_use]
    pub fn given_state(mut self, state: S) -> Self {
        self.initial_state = Some(state);
        self
    }

    /// Add an action to apply (When)
    #[must_use]
    pub fn when_action(mut self, action: A) -> Self {
        self.actions.push(action);
        self
    }

    /// Add several actions to apply in order (When)
    #[must_use]
    pub fn when_actions(mut self, actions: impl IntoIterator<Item = A>) -> Self {
        self.actions.extend(actions);
        self
    }

    /// Add an assertion about the resulting state (Then)
    #[must_use]
    pub fn then_state<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&S) + 'static,
    {
        self.state_assertions.push(Box::new(assertion));
        self
    }

    /// Run the test and execute all assertions
    ///
    /// # Panics
    ///
    /// Panics if the initial state or the action is not set,
    /// or if any assertions fail.
    #[allow(clippy::panic)] // Test code can panic
    #[allow(clippy::expect_used)] // Test code can use expect
    pub fn run(self) {
        let mut state = self
            .initial_state
            .expect("Initial state must be set with given_state()");

        assert!(
            !self.actions.is_empty(),
            "At least one action must be set with when_action()"
        );

        for action in self.actions {
            self.reducer.reduce(&mut state, action);
        }

        for assertion in self.state_assertions {
            assertion(&state);
        }
    }
}

/// Helper assertions for dispatched event sequences
pub mod assertions {
    use crud_store_core::lifecycle::LifecycleEvent;

    /// Assert that `events` have exactly the given wire identifiers, in order
    ///
    /// # Panics
    ///
    /// Panics if the sequences differ.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_event_types<T>(events: &[LifecycleEvent<T>], expected: &[&str]) {
        let actual: Vec<String> = events.iter().map(LifecycleEvent::type_string).collect();
        assert_eq!(
            actual, expected,
            "Expected events {expected:?}, but found {actual:?}"
        );
    }

    /// Assert that no event was dispatched
    ///
    /// # Panics
    ///
    /// Panics if `events` is not empty.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_no_events<T>(events: &[LifecycleEvent<T>]) {
        assert!(
            events.is_empty(),
            "Expected no events, but found {}: {:?}",
            events.len(),
            events.iter().map(LifecycleEvent::type_string).collect::<Vec<_>>()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crud_store_core::context::Context;
    use crud_store_core::lifecycle::{ActionKind, LifecycleEvent, SuccessPayload};
    use crud_store_core::reducer::ResourceReducer;
    use serde_json::{Value, json};

    fn orders() -> Context {
        Context::new("orders").unwrap()
    }

    fn reducer() -> ResourceReducer<Value> {
        ResourceReducer::new(orders(), json!({}))
    }

    #[test]
    fn single_event_is_applied() {
        let initial = reducer().initial_state();
        ReducerTest::new(reducer())
            .given_state(initial)
            .when_action(LifecycleEvent::request(orders(), ActionKind::Update))
            .then_state(|state| {
                assert!(state.model.is_loading);
            })
            .run();
    }

    #[test]
    fn events_are_applied_in_order() {
        let initial = reducer().initial_state();
        ReducerTest::new(reducer())
            .given_state(initial)
            .when_actions([
                LifecycleEvent::request(orders(), ActionKind::Fetch),
                LifecycleEvent::success(orders(), SuccessPayload::Fetched(json!({"id": 3}))),
                LifecycleEvent::request(orders(), ActionKind::Update),
            ])
            .then_state(|state| {
                assert_eq!(state.model.data, json!({"id": 3}));
                assert!(state.model.is_loading);
            })
            .run();
    }

    #[test]
    #[should_panic(expected = "Initial state must be set")]
    fn missing_given_state_panics() {
        ReducerTest::new(reducer())
            .when_action(LifecycleEvent::clean(orders()))
            .run();
    }

    #[test]
    fn event_type_assertions() {
        assertions::assert_no_events::<Value>(&[]);
        assertions::assert_event_types(
            &[
                LifecycleEvent::<Value>::request(orders(), ActionKind::Delete),
                LifecycleEvent::clean(orders()),
            ],
            &["@orders:DELETE_REQUEST", "@orders:CLEAN"],
        );
    }
}
