//! Reducer composition utilities
//!
//! An application store usually holds several resources. These utilities
//! build its root reducer out of per-resource reducers:
//! - **`scope_reducer`**: Focus a reducer on one field of a larger state,
//!   and on the actions that concern it
//! - **`combine_reducers`**: Run multiple reducers on the same state/action
//!
//! # Example
//!
//! ```
//! use crud_store_core::composition::{combine_reducers, scope_reducer};
//! use crud_store_core::context::Context;
//! use crud_store_core::lifecycle::{ActionKind, LifecycleEvent};
//! use crud_store_core::reducer::{Reducer, ResourceReducer};
//! use crud_store_core::state::ResourceState;
//! use serde_json::{Value, json};
//!
//! #[derive(Clone)]
//! struct AppState {
//!     users: ResourceState<Value>,
//!     posts: ResourceState<Value>,
//! }
//!
//! let users = Context::new("users").unwrap();
//! let posts = Context::new("posts").unwrap();
//!
//! let root = combine_reducers(vec![
//!     Box::new(scope_reducer(
//!         ResourceReducer::new(users.clone(), json!({})),
//!         |s: &AppState| &s.users,
//!         |s: &mut AppState, sub| s.users = sub,
//!         |a: &LifecycleEvent<Value>| Some(a.clone()),
//!     )),
//!     Box::new(scope_reducer(
//!         ResourceReducer::new(posts.clone(), json!({})),
//!         |s: &AppState| &s.posts,
//!         |s: &mut AppState, sub| s.posts = sub,
//!         |a: &LifecycleEvent<Value>| Some(a.clone()),
//!     )),
//! ]);
//!
//! let mut state = AppState {
//!     users: ResourceState::initial(json!({})),
//!     posts: ResourceState::initial(json!({})),
//! };
//! root.reduce(&mut state, LifecycleEvent::request(users, ActionKind::List));
//! assert!(state.users.list.is_fetch_loading);
//! assert!(!state.posts.list.is_fetch_loading);
//! ```

use crate::reducer::Reducer;

/// Combines multiple reducers that operate on the same state and action types.
///
/// Each reducer is run in sequence with its own clone of the action.
#[must_use]
pub fn combine_reducers<S, A>(
    reducers: Vec<Box<dyn Reducer<State = S, Action = A> + Send + Sync>>,
) -> CombinedReducer<S, A>
where
    S: 'static,
    A: Clone + 'static,
{
    CombinedReducer { reducers }
}

/// A combined reducer that runs multiple reducers in sequence.
///
/// Created by [`combine_reducers`].
pub struct CombinedReducer<S, A>
where
    S: 'static,
    A: Clone + 'static,
{
    reducers: Vec<Box<dyn Reducer<State = S, Action = A> + Send + Sync>>,
}

impl<S, A> Reducer for CombinedReducer<S, A>
where
    S: 'static,
    A: Clone + 'static,
{
    type State = S;
    type Action = A;

    fn reduce(&self, state: &mut Self::State, action: Self::Action) {
        for reducer in &self.reducers {
            reducer.reduce(state, action.clone());
        }
    }
}

/// Scopes a reducer to a subset of a larger state and action type.
///
/// `get_action` extracts the child action from the parent action; when it
/// returns `None` the child reducer is not run and the parent state is left
/// untouched.
pub fn scope_reducer<S, SubS, A, SubA, R>(
    reducer: R,
    get_state: fn(&S) -> &SubS,
    set_state: fn(&mut S, SubS),
    get_action: fn(&A) -> Option<SubA>,
) -> ScopedReducer<S, SubS, A, SubA, R>
where
    SubS: Clone,
    R: Reducer<State = SubS, Action = SubA>,
{
    ScopedReducer {
        reducer,
        get_state,
        set_state,
        get_action,
    }
}

/// A scoped reducer that operates on a subset of state.
///
/// Created by [`scope_reducer`].
pub struct ScopedReducer<S, SubS, A, SubA, R>
where
    SubS: Clone,
    R: Reducer<State = SubS, Action = SubA>,
{
    reducer: R,
    get_state: fn(&S) -> &SubS,
    set_state: fn(&mut S, SubS),
    get_action: fn(&A) -> Option<SubA>,
}

impl<S, SubS, A, SubA, R> Reducer for ScopedReducer<S, SubS, A, SubA, R>
where
    SubS: Clone,
    R: Reducer<State = SubS, Action = SubA>,
{
    type State = S;
    type Action = A;

    fn reduce(&self, state: &mut Self::State, action: Self::Action) {
        let Some(sub_action) = (self.get_action)(&action) else {
            return;
        };

        let mut sub_state = (self.get_state)(state).clone();
        self.reducer.reduce(&mut sub_state, sub_action);
        (self.set_state)(state, sub_state);
    }
}
