//! Integration tests for a Store holding several resources
//!
//! Two resources with different record types share one application state,
//! each scoped to its own field through `scope_reducer`.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use crud_store_core::composition::{combine_reducers, scope_reducer};
use crud_store_core::context::Context;
use crud_store_core::dispatch::Dispatcher;
use crud_store_core::lifecycle::{ActionKind, LifecycleEvent, Phase, SuccessPayload};
use crud_store_core::record::{CountResponse, Record, RecordId};
use crud_store_core::reducer::ResourceReducer;
use crud_store_core::state::ResourceState;
use crud_store_runtime::Store;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
struct User {
    id: Option<i64>,
    name: String,
}

impl Record for User {
    fn id(&self) -> Option<RecordId> {
        self.id.map(RecordId::from)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
struct Post {
    id: Option<String>,
    title: String,
}

impl Record for Post {
    fn id(&self) -> Option<RecordId> {
        self.id.clone().map(RecordId::from)
    }
}

#[derive(Clone, Debug, Default)]
struct AppState {
    users: ResourceState<User>,
    posts: ResourceState<Post>,
}

#[derive(Clone, Debug)]
enum AppAction {
    Users(LifecycleEvent<User>),
    Posts(LifecycleEvent<Post>),
}

impl From<LifecycleEvent<User>> for AppAction {
    fn from(event: LifecycleEvent<User>) -> Self {
        Self::Users(event)
    }
}

impl From<LifecycleEvent<Post>> for AppAction {
    fn from(event: LifecycleEvent<Post>) -> Self {
        Self::Posts(event)
    }
}

fn users() -> Context {
    Context::new("users").unwrap()
}

fn posts() -> Context {
    Context::new("posts").unwrap()
}

fn app_store() -> Store<AppState, AppAction, impl crud_store_core::reducer::Reducer<State = AppState, Action = AppAction> + Send + Sync + 'static> {
    let root = combine_reducers(vec![
        Box::new(scope_reducer(
            ResourceReducer::new(users(), User::default()),
            |s: &AppState| &s.users,
            |s: &mut AppState, sub| s.users = sub,
            |a: &AppAction| match a {
                AppAction::Users(event) => Some(event.clone()),
                AppAction::Posts(_) => None,
            },
        )),
        Box::new(scope_reducer(
            ResourceReducer::new(posts(), Post::default()),
            |s: &AppState| &s.posts,
            |s: &mut AppState, sub| s.posts = sub,
            |a: &AppAction| match a {
                AppAction::Posts(event) => Some(event.clone()),
                AppAction::Users(_) => None,
            },
        )),
    ]);

    Store::new(AppState::default(), root)
}

#[tokio::test]
async fn resources_update_independently() {
    let store = app_store();
    let user_dispatcher = store.dispatcher::<User>();
    let post_dispatcher = store.dispatcher::<Post>();

    user_dispatcher
        .dispatch(LifecycleEvent::request(users(), ActionKind::List))
        .await;
    post_dispatcher
        .dispatch(LifecycleEvent::success(
            posts(),
            SuccessPayload::Counted(CountResponse::new(12)),
        ))
        .await;

    let (users_loading, posts_loading, posts_count, users_count) = store
        .state(|s| {
            (
                s.users.list.is_fetch_loading,
                s.posts.list.is_fetch_loading,
                s.posts.list.count,
                s.users.list.count,
            )
        })
        .await;

    assert!(users_loading);
    assert!(!posts_loading);
    assert_eq!(posts_count, 12);
    assert_eq!(users_count, 0);
}

#[tokio::test]
async fn concurrent_dispatches_are_all_applied() {
    let store = app_store();
    let mut tasks = Vec::new();

    for n in 0..50_i64 {
        let dispatcher = store.dispatcher::<User>();
        tasks.push(tokio::spawn(async move {
            dispatcher
                .dispatch(LifecycleEvent::success(
                    users(),
                    SuccessPayload::Listed(vec![User {
                        id: Some(n),
                        name: format!("user-{n}"),
                    }]),
                ))
                .await;
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    let list = store.state(|s| s.users.list.data.clone()).await;
    assert_eq!(list.len(), 1, "each LIST_SUCCESS replaces the page");
}

#[tokio::test]
async fn send_and_wait_for_sees_the_sent_action() {
    let store = app_store();

    let action = store
        .send_and_wait_for(
            AppAction::Posts(LifecycleEvent::clean(posts())),
            |a| matches!(a, AppAction::Posts(event) if event.phase().is_none()),
            Duration::from_secs(1),
        )
        .await
        .unwrap();

    assert!(matches!(action, AppAction::Posts(_)));
}

#[tokio::test]
async fn waiting_for_an_event_in_another_context_times_out() {
    let store = app_store();
    let waiting = store.wait_for(
        |a| matches!(a, AppAction::Users(event) if event.is(ActionKind::Create, Phase::Success)),
        Duration::from_millis(50),
    );

    store
        .dispatcher::<Post>()
        .dispatch(LifecycleEvent::request(posts(), ActionKind::Create))
        .await;

    assert!(waiting.await.is_err());
}
