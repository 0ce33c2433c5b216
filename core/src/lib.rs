//! # Crud Store Core
//!
//! Core traits and types for CRUD resources in a Redux-style store.
//!
//! Given a resource name (its [`Context`](context::Context)) and a backend,
//! this crate provides the three parts every resource is made of:
//!
//! - **Adapter**: the six CRUD/count operations against a backend
//!   ([`RequestAdapter`](adapter::RequestAdapter))
//! - **Action creator**: dispatches REQUEST/SUCCESS/FAIL lifecycle events
//!   around each adapter call ([`ActionCreator`](actions::ActionCreator))
//! - **Reducer**: folds those events into a `{ model, list }` state
//!   ([`ResourceReducer`](reducer::ResourceReducer))
//!
//! ## Architecture Principles
//!
//! - Reducers are pure and never see errors
//! - Side effects live in action creators, behind injected capabilities
//! - Events are a closed enum; wire strings exist only at the serialization boundary
//! - Dependency Injection via Environment
//!
//! ## Example
//!
//! ```
//! use crud_store_core::context::Context;
//! use crud_store_core::lifecycle::{ActionKind, LifecycleEvent, SuccessPayload};
//! use crud_store_core::reducer::{Reducer, ResourceReducer};
//! use serde_json::json;
//!
//! let users = Context::new("users").unwrap();
//! let reducer = ResourceReducer::new(users.clone(), json!({}));
//! let mut state = reducer.initial_state();
//!
//! reducer.reduce(&mut state, LifecycleEvent::request(users.clone(), ActionKind::Create));
//! reducer.reduce(
//!     &mut state,
//!     LifecycleEvent::success(users, SuccessPayload::Created(json!({"id": 1, "name": "a"}))),
//! );
//!
//! assert_eq!(state.model.data, json!({"id": 1, "name": "a"}));
//! assert!(!state.model.is_loading);
//! ```

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use serde::{Deserialize, Serialize};

pub mod actions;
pub mod adapter;
pub mod composition;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod filter;
pub mod lifecycle;
pub mod record;
pub mod reducer;
pub mod state;

/// Environment module - injected capabilities
///
/// All external dependencies of adapters and action creators (time, id
/// generation, user interaction) are abstracted behind traits so tests can
/// substitute deterministic implementations.
pub mod environment {
    use chrono::{DateTime, Utc};
    use futures::future::BoxFuture;

    /// Clock trait - abstracts time operations for testability
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Production clock backed by the system time.
    #[derive(Clone, Copy, Debug, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }

    /// Generates identifiers for new records.
    pub trait IdGenerator: Send + Sync {
        /// Produce a fresh, unique identifier
        fn next_id(&self) -> String;
    }

    /// Random v4 UUIDs.
    #[derive(Clone, Copy, Debug, Default)]
    pub struct UuidIdGenerator;

    impl IdGenerator for UuidIdGenerator {
        fn next_id(&self) -> String {
            uuid::Uuid::new_v4().to_string()
        }
    }

    /// Asks the user a yes/no question.
    ///
    /// Used by confirmed deletes. The core has no opinion on how the
    /// question is presented: a terminal prompt, a dialog or a test script
    /// all fit.
    pub trait Confirm: Send + Sync {
        /// Resolve to `true` if the user agreed
        fn confirm<'a>(&'a self, question: &'a str) -> BoxFuture<'a, bool>;
    }
}

#[cfg(test)]
mod tests {
    use super::environment::{Clock, IdGenerator, SystemClock, UuidIdGenerator};

    #[test]
    fn uuid_generator_produces_distinct_ids() {
        let generator = UuidIdGenerator;
        assert_ne!(generator.next_id(), generator.next_id());
    }

    #[test]
    fn system_clock_moves_forward() {
        let clock = SystemClock;
        let first = clock.now();
        assert!(clock.now() >= first);
    }
}
