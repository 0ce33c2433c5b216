//! Reducers: pure state transitions driven by lifecycle events.
//!
//! [`Reducer`] is the general trait a store runs. [`ResourceReducer`] is the
//! one implementation every CRUD resource
//! shares: it folds the lifecycle events of a single context into a
//! [`ResourceState`].

use crate::context::Context;
use crate::lifecycle::{ActionKind, EventKind, Phase, SuccessPayload, type_string};
use crate::state::ResourceState;
use std::collections::BTreeMap;

/// The Reducer trait - core abstraction for state transitions
///
/// Reducers are pure: `(State, Action) → State`, performed in place. They
/// never see errors or perform I/O; side effects belong to the action
/// creators that dispatch the actions.
///
/// # Example
///
/// ```
/// use crud_store_core::reducer::Reducer;
///
/// struct Tally;
///
/// impl Reducer for Tally {
///     type State = u32;
///     type Action = u32;
///
///     fn reduce(&self, state: &mut u32, action: u32) {
///         *state += action;
///     }
/// }
///
/// let mut total = 0;
/// Tally.reduce(&mut total, 5);
/// assert_eq!(total, 5);
/// ```
pub trait Reducer {
    /// The state type this reducer operates on
    type State;

    /// The action type this reducer processes
    type Action;

    /// Apply an action to the state in place
    fn reduce(&self, state: &mut Self::State, action: Self::Action);
}

/// One entry of the handler table: how an event changes a [`ResourceState`].
///
/// The reducer picks the transition for an event with
/// [`Transition::for_event`] and runs it with [`Transition::apply`]. The
/// same table is exposed as a map by [`ResourceReducer::handlers`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Transition {
    /// CREATE/FETCH/DELETE request: model back to its initial value, loading
    ModelReset,
    /// UPDATE request: keep the current record, loading
    ModelLoading,
    /// CREATE/FETCH/UPDATE success: the payload becomes the model
    ModelLoaded,
    /// DELETE success: model back to its initial value, not loading
    ModelCleared,
    /// Any model FAIL: keep the current record, not loading
    ModelSettled,
    /// LIST request
    ListLoading,
    /// LIST success: the payload becomes the list data
    ListLoaded,
    /// LIST fail
    ListSettled,
    /// COUNT request
    CountLoading,
    /// COUNT success: the payload becomes the list count
    CountLoaded,
    /// COUNT fail
    CountSettled,
    /// CLEAN / CLEAR: back to the initial state
    Reset,
}

impl Transition {
    /// The transition for an action in a phase.
    #[must_use]
    pub const fn for_phase(action: ActionKind, phase: Phase) -> Self {
        match (action, phase) {
            (ActionKind::Create | ActionKind::Fetch | ActionKind::Delete, Phase::Request) => {
                Self::ModelReset
            },
            (ActionKind::Update, Phase::Request) => Self::ModelLoading,
            (ActionKind::Create | ActionKind::Fetch | ActionKind::Update, Phase::Success) => {
                Self::ModelLoaded
            },
            (ActionKind::Delete, Phase::Success) => Self::ModelCleared,
            (
                ActionKind::Create | ActionKind::Fetch | ActionKind::Update | ActionKind::Delete,
                Phase::Fail,
            ) => Self::ModelSettled,
            (ActionKind::List, Phase::Request) => Self::ListLoading,
            (ActionKind::List, Phase::Success) => Self::ListLoaded,
            (ActionKind::List, Phase::Fail) => Self::ListSettled,
            (ActionKind::Count, Phase::Request) => Self::CountLoading,
            (ActionKind::Count, Phase::Success) => Self::CountLoaded,
            (ActionKind::Count, Phase::Fail) => Self::CountSettled,
        }
    }

    /// The transition for an event.
    #[must_use]
    pub const fn for_event<T>(kind: &EventKind<T>) -> Self {
        match kind {
            EventKind::Request(action) => Self::for_phase(*action, Phase::Request),
            EventKind::Success(payload) => Self::for_phase(payload.action(), Phase::Success),
            EventKind::Fail(action) => Self::for_phase(*action, Phase::Fail),
            EventKind::Clean => Self::Reset,
        }
    }

    /// Run the transition.
    ///
    /// The loaded transitions read their data from a SUCCESS payload; given
    /// an event without one they fall back to the initial value (model) or
    /// leave the data untouched (list, count).
    pub fn apply<T: Clone>(
        self,
        state: &mut ResourceState<T>,
        event: EventKind<T>,
        initial: &ResourceState<T>,
    ) {
        match self {
            Self::ModelReset => {
                state.model = initial.model.clone();
                state.model.is_loading = true;
            },
            Self::ModelLoading => state.model.is_loading = true,
            Self::ModelLoaded => {
                state.model = initial.model.clone();
                if let EventKind::Success(
                    SuccessPayload::Created(record)
                    | SuccessPayload::Fetched(record)
                    | SuccessPayload::Updated(record),
                ) = event
                {
                    state.model.data = record;
                }
                state.model.is_loading = false;
            },
            Self::ModelCleared => {
                state.model = initial.model.clone();
                state.model.is_loading = false;
            },
            Self::ModelSettled => state.model.is_loading = false,
            Self::ListLoading => state.list.is_fetch_loading = true,
            Self::ListLoaded => {
                if let EventKind::Success(SuccessPayload::Listed(records)) = event {
                    state.list.data = records;
                }
                state.list.is_fetch_loading = false;
            },
            Self::ListSettled => state.list.is_fetch_loading = false,
            Self::CountLoading => state.list.is_count_loading = true,
            Self::CountLoaded => {
                if let EventKind::Success(SuccessPayload::Counted(counted)) = event {
                    state.list.count = counted.count;
                }
                state.list.is_count_loading = false;
            },
            Self::CountSettled => state.list.is_count_loading = false,
            Self::Reset => *state = initial.clone(),
        }
    }
}

/// Reducer for one resource context.
///
/// Events of other contexts leave the state untouched, so several resource
/// reducers can observe the same event stream.
///
/// # Example
///
/// ```
/// use crud_store_core::context::Context;
/// use crud_store_core::lifecycle::{ActionKind, LifecycleEvent};
/// use crud_store_core::reducer::{Reducer, ResourceReducer};
/// use serde_json::json;
///
/// let users = Context::new("users").unwrap();
/// let reducer = ResourceReducer::new(users.clone(), json!({}));
/// let mut state = reducer.initial_state();
///
/// reducer.reduce(&mut state, LifecycleEvent::request(users, ActionKind::List));
/// assert!(state.list.is_fetch_loading);
/// ```
#[derive(Clone, Debug)]
pub struct ResourceReducer<T> {
    context: Context,
    initial: ResourceState<T>,
}

impl<T: Clone> ResourceReducer<T> {
    /// Create a reducer for `context` whose model starts at `initial`.
    #[must_use]
    pub fn new(context: Context, initial: T) -> Self {
        Self {
            context,
            initial: ResourceState::initial(initial),
        }
    }

    /// The context this reducer responds to
    #[must_use]
    pub const fn context(&self) -> &Context {
        &self.context
    }

    /// A fresh copy of the initial state
    #[must_use]
    pub fn initial_state(&self) -> ResourceState<T> {
        self.initial.clone()
    }

    /// The raw handler table: wire identifier → transition.
    ///
    /// Contains every `@<context>:<ACTION>_<PHASE>` identifier plus the
    /// `CLEAN` and `CLEAR` reset identifiers.
    #[must_use]
    pub fn handlers(&self) -> BTreeMap<String, Transition> {
        let mut handlers: BTreeMap<String, Transition> = ActionKind::ALL
            .into_iter()
            .flat_map(|action| {
                Phase::ALL.into_iter().map(move |phase| {
                    (
                        type_string(&self.context, action, phase),
                        Transition::for_phase(action, phase),
                    )
                })
            })
            .collect();

        handlers.insert(format!("@{}:CLEAN", self.context), Transition::Reset);
        handlers.insert(format!("@{}:CLEAR", self.context), Transition::Reset);
        handlers
    }
}

impl<T: Clone> Reducer for ResourceReducer<T> {
    type State = ResourceState<T>;
    type Action = crate::lifecycle::LifecycleEvent<T>;

    fn reduce(&self, state: &mut Self::State, action: Self::Action) {
        if action.context != self.context {
            return;
        }

        let transition = Transition::for_event(&action.kind);
        tracing::trace!(
            context = %self.context,
            event = %action,
            ?transition,
            "Applying lifecycle event"
        );
        transition.apply(state, action.kind, &self.initial);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::LifecycleEvent;
    use crate::record::{CountResponse, DeleteResponse};
    use serde_json::{Value, json};

    fn users() -> Context {
        Context::new("users").unwrap()
    }

    fn reducer() -> ResourceReducer<Value> {
        ResourceReducer::new(users(), json!({"name": ""}))
    }

    fn loaded_state() -> ResourceState<Value> {
        let mut state = reducer().initial_state();
        state.model.data = json!({"id": 1, "name": "y"});
        state.list.data = vec![json!({"id": 1}), json!({"id": 2})];
        state.list.count = 2;
        state
    }

    #[test]
    fn create_request_then_success() {
        let reducer = reducer();
        let mut state = reducer.initial_state();
        let record = json!({"id": 1, "name": "a"});

        reducer.reduce(&mut state, LifecycleEvent::request(users(), ActionKind::Create));
        assert!(state.model.is_loading);

        reducer.reduce(
            &mut state,
            LifecycleEvent::success(users(), SuccessPayload::Created(record.clone())),
        );
        assert_eq!(state.model.data, record);
        assert!(!state.model.is_loading);
    }

    #[test]
    fn update_request_preserves_data() {
        let reducer = reducer();
        let mut state = loaded_state();

        reducer.reduce(&mut state, LifecycleEvent::request(users(), ActionKind::Update));
        assert_eq!(state.model.data, json!({"id": 1, "name": "y"}));
        assert!(state.model.is_loading);
    }

    #[test]
    fn create_fetch_delete_requests_clear_data() {
        let reducer = reducer();
        for action in [ActionKind::Create, ActionKind::Fetch, ActionKind::Delete] {
            let mut state = loaded_state();
            reducer.reduce(&mut state, LifecycleEvent::request(users(), action));
            assert_eq!(state.model.data, json!({"name": ""}), "{action}");
            assert!(state.model.is_loading);
            assert_eq!(state.list.data.len(), 2, "{action} must not touch the list");
        }
    }

    #[test]
    fn delete_success_clears_model() {
        let reducer = reducer();
        let mut state = loaded_state();
        state.model.is_loading = true;

        reducer.reduce(
            &mut state,
            LifecycleEvent::success(users(), SuccessPayload::Deleted(DeleteResponse::new(1))),
        );
        assert_eq!(state.model.data, json!({"name": ""}));
        assert!(!state.model.is_loading);
        assert_eq!(state.list.count, 2);
    }

    #[test]
    fn fail_keeps_current_model() {
        let reducer = reducer();
        for action in [ActionKind::Create, ActionKind::Update, ActionKind::Fetch, ActionKind::Delete] {
            let mut state = loaded_state();
            state.model.is_loading = true;
            reducer.reduce(&mut state, LifecycleEvent::fail(users(), action));
            assert_eq!(state.model.data, json!({"id": 1, "name": "y"}));
            assert!(!state.model.is_loading);
        }
    }

    #[test]
    fn list_and_count_converge_in_any_order() {
        let reducer = reducer();
        let a = json!({"id": "a"});
        let b = json!({"id": "b"});
        let list = LifecycleEvent::success(users(), SuccessPayload::Listed(vec![a.clone(), b.clone()]));
        let count = LifecycleEvent::success(users(), SuccessPayload::Counted(CountResponse::new(2)));

        for order in [[list.clone(), count.clone()], [count, list]] {
            let mut state = reducer.initial_state();
            reducer.reduce(&mut state, LifecycleEvent::request(users(), ActionKind::List));
            reducer.reduce(&mut state, LifecycleEvent::request(users(), ActionKind::Count));
            for event in order {
                reducer.reduce(&mut state, event);
            }
            assert_eq!(state.list.data, vec![a.clone(), b.clone()]);
            assert_eq!(state.list.count, 2);
            assert!(!state.list.is_fetch_loading);
            assert!(!state.list.is_count_loading);
        }
    }

    #[test]
    fn list_events_never_touch_model() {
        let reducer = reducer();
        let mut state = loaded_state();
        state.model.is_loading = true;
        let before = state.model.clone();

        reducer.reduce(&mut state, LifecycleEvent::request(users(), ActionKind::List));
        reducer.reduce(&mut state, LifecycleEvent::fail(users(), ActionKind::List));
        reducer.reduce(&mut state, LifecycleEvent::fail(users(), ActionKind::Count));

        assert_eq!(state.model, before);
        assert!(!state.list.is_fetch_loading);
        assert!(!state.list.is_count_loading);
    }

    #[test]
    fn other_contexts_are_ignored() {
        let reducer = reducer();
        let posts = Context::new("posts").unwrap();
        let mut state = loaded_state();
        let before = state.clone();

        reducer.reduce(&mut state, LifecycleEvent::request(posts.clone(), ActionKind::Create));
        reducer.reduce(&mut state, LifecycleEvent::clean(posts));
        assert_eq!(state, before);
    }

    #[test]
    fn handler_table_is_complete() {
        let handlers = reducer().handlers();
        assert_eq!(handlers.len(), ActionKind::ALL.len() * Phase::ALL.len() + 2);
        assert_eq!(handlers["@users:UPDATE_REQUEST"], Transition::ModelLoading);
        assert_eq!(handlers["@users:DELETE_REQUEST"], Transition::ModelReset);
        assert_eq!(handlers["@users:COUNT_SUCCESS"], Transition::CountLoaded);
        assert_eq!(handlers["@users:CLEAR"], Transition::Reset);
    }
}
