//! # Crud Store Testing
//!
//! Testing utilities and helpers for crud-store resources.
//!
//! This crate provides:
//! - Mock implementations of Environment traits
//! - A scripted [`MockAdapter`] that records every call
//! - A [`RecordingDispatcher`] that captures dispatched lifecycle events
//! - A Given-When-Then [`ReducerTest`] harness
//! - Property-based testing strategies for lifecycle events
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use crud_store_core::actions::ActionCreator;
//! use crud_store_core::context::Context;
//! use crud_store_testing::{MockAdapter, RecordingDispatcher};
//! use serde_json::{Value, json};
//!
//! # tokio_test::block_on(async {
//! let adapter = Arc::new(MockAdapter::<Value>::new().with_get_all(Ok(vec![json!({"id": 1})])));
//! let users = ActionCreator::builder(Context::new("users").unwrap(), adapter.clone()).build();
//!
//! let recorder = RecordingDispatcher::new();
//! let listed = users.list_and_count(&recorder.shared(), None).await.unwrap();
//!
//! assert_eq!(listed, vec![json!({"id": 1})]);
//! assert_eq!(recorder.type_strings()[0], "@users:LIST_REQUEST");
//! # });
//! ```

pub mod mock_adapter;
pub mod recording;
pub mod reducer_test;

use chrono::{DateTime, Utc};
use crud_store_core::environment::{Clock, Confirm, IdGenerator};

/// Mock implementations of Environment traits
pub mod mocks {
    use super::{Clock, Confirm, DateTime, IdGenerator, Utc};
    use futures::future::BoxFuture;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU64, Ordering};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use crud_store_testing::mocks::FixedClock;
    /// use crud_store_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let time1 = clock.now();
    /// let time2 = clock.now();
    /// assert_eq!(time1, time2); // Always the same!
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }

    /// Predictable ids: `<prefix>1`, `<prefix>2`, ...
    #[derive(Debug)]
    pub struct SequentialIdGenerator {
        prefix: String,
        next: AtomicU64,
    }

    impl SequentialIdGenerator {
        /// Ids `id-1`, `id-2`, ...
        #[must_use]
        pub fn new() -> Self {
            Self::with_prefix("id-")
        }

        /// Ids starting with `prefix`
        #[must_use]
        pub fn with_prefix(prefix: impl Into<String>) -> Self {
            Self {
                prefix: prefix.into(),
                next: AtomicU64::new(1),
            }
        }
    }

    impl Default for SequentialIdGenerator {
        fn default() -> Self {
            Self::new()
        }
    }

    impl IdGenerator for SequentialIdGenerator {
        fn next_id(&self) -> String {
            let n = self.next.fetch_add(1, Ordering::Relaxed);
            format!("{}{n}", self.prefix)
        }
    }

    /// Confirmation capability with a fixed answer that records the
    /// questions it was asked.
    #[derive(Debug)]
    pub struct ScriptedConfirm {
        answer: bool,
        questions: Mutex<Vec<String>>,
    }

    impl ScriptedConfirm {
        /// Always answer yes
        #[must_use]
        pub const fn accepting() -> Self {
            Self::answering(true)
        }

        /// Always answer no
        #[must_use]
        pub const fn declining() -> Self {
            Self::answering(false)
        }

        const fn answering(answer: bool) -> Self {
            Self {
                answer,
                questions: Mutex::new(Vec::new()),
            }
        }

        /// Questions asked so far
        ///
        /// # Panics
        ///
        /// Panics if the lock is poisoned.
        #[must_use]
        #[allow(clippy::unwrap_used)] // Mutex poison is unrecoverable in tests
        pub fn questions(&self) -> Vec<String> {
            self.questions.lock().unwrap().clone()
        }
    }

    impl Confirm for ScriptedConfirm {
        #[allow(clippy::unwrap_used)] // Mutex poison is unrecoverable in tests
        fn confirm<'a>(&'a self, question: &'a str) -> BoxFuture<'a, bool> {
            self.questions.lock().unwrap().push(question.to_string());
            Box::pin(std::future::ready(self.answer))
        }
    }
}

/// Test helpers and utilities
pub mod helpers {
    use tracing_subscriber::EnvFilter;

    /// Install a `fmt` subscriber honouring `RUST_LOG`, once per process.
    ///
    /// Later calls are no-ops, so every test can call it.
    pub fn init_test_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    }
}

/// Property-based testing utilities using proptest.
pub mod properties {
    use crud_store_core::context::Context;
    use crud_store_core::lifecycle::{ActionKind, LifecycleEvent, SuccessPayload};
    use crud_store_core::record::{CountResponse, DeleteResponse};
    use proptest::prelude::*;
    use serde_json::{Value, json};

    /// Any action kind
    pub fn arb_action() -> impl Strategy<Value = ActionKind> {
        prop::sample::select(ActionKind::ALL.to_vec())
    }

    /// Any lifecycle event over JSON records for one of `contexts`.
    ///
    /// # Panics
    ///
    /// Panics if `contexts` is empty.
    pub fn arb_event(contexts: Vec<Context>) -> impl Strategy<Value = LifecycleEvent<Value>> {
        (prop::sample::select(contexts), arb_action(), 0..4_u8, any::<i64>()).prop_map(
            |(context, action, phase, n)| match phase {
                0 => LifecycleEvent::request(context, action),
                1 => LifecycleEvent::fail(context, action),
                2 => LifecycleEvent::clean(context),
                _ => LifecycleEvent::success(context, arb_payload(action, n)),
            },
        )
    }

    fn arb_payload(action: ActionKind, n: i64) -> SuccessPayload<Value> {
        let record = json!({"id": n, "name": format!("record-{n}")});
        match action {
            ActionKind::Create => SuccessPayload::Created(record),
            ActionKind::Fetch => SuccessPayload::Fetched(record),
            ActionKind::Update => SuccessPayload::Updated(record),
            ActionKind::Delete => SuccessPayload::Deleted(DeleteResponse::new(n)),
            ActionKind::List => SuccessPayload::Listed(vec![record]),
            ActionKind::Count => SuccessPayload::Counted(CountResponse::new(n.unsigned_abs())),
        }
    }
}

// Re-export commonly used items
pub use mock_adapter::{AdapterCall, MockAdapter};
pub use mocks::{FixedClock, ScriptedConfirm, SequentialIdGenerator, test_clock};
pub use recording::RecordingDispatcher;
pub use reducer_test::ReducerTest;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock() {
        let clock = test_clock();
        let time1 = clock.now();
        let time2 = clock.now();
        assert_eq!(time1, time2);
    }

    #[test]
    fn sequential_ids() {
        let ids = SequentialIdGenerator::with_prefix("u");
        assert_eq!(ids.next_id(), "u1");
        assert_eq!(ids.next_id(), "u2");
    }

    #[tokio::test]
    async fn scripted_confirm_records_questions() {
        let confirm = ScriptedConfirm::declining();
        assert!(!confirm.confirm("Delete?").await);
        assert_eq!(confirm.questions(), vec!["Delete?".to_string()]);
    }
}
