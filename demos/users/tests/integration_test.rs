//! End-to-end flows of the users example over a local database.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use crud_store_core::actions::{CallOptions, CreateConfig, DeleteConfig, UpdateConfig};
use crud_store_core::error::{ActionError, AdapterError};
use crud_store_core::filter::LoopbackFilter;
use crud_store_core::lifecycle::{ActionKind, Phase};
use crud_store_core::record::{PartialRecord, RecordId};
use crud_store_testing::ScriptedConfirm;
use crud_store_testing::helpers::init_test_tracing;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use users_demo::{AppAction, AppStore, Backend, Post, Resources, User, app_store};

const WAIT: Duration = Duration::from_secs(2);

fn setup(confirm: ScriptedConfirm) -> (AppStore, Resources) {
    init_test_tracing();
    let resources = Resources::new(&Backend::local("test"), Arc::new(confirm)).unwrap();
    (app_store().unwrap(), resources)
}

fn users_counted(action: &AppAction) -> bool {
    matches!(action, AppAction::Users(e) if e.is(ActionKind::Count, Phase::Success))
}

async fn create_user(store: &AppStore, resources: &Resources, name: &str) -> User {
    resources
        .users
        .create(
            &store.dispatcher(),
            &CreateConfig::new(),
            User::new(name, format!("{}@example.com", name.to_lowercase())),
            CallOptions::new(),
        )
        .await
        .unwrap()
        .expect("rejections are not suppressed")
}

#[tokio::test]
async fn created_user_becomes_the_model() {
    let (store, resources) = setup(ScriptedConfirm::accepting());

    let ada = create_user(&store, &resources, "Ada").await;

    assert!(ada.id.is_some());
    assert!(ada.created_at.is_some());
    let model = store.state(|s| s.users.model.clone()).await;
    assert_eq!(model.data, ada);
    assert!(!model.is_loading);
}

#[tokio::test]
async fn list_and_count_fill_the_list_view() {
    let (store, resources) = setup(ScriptedConfirm::accepting());
    for name in ["Grace", "Ada", "Linus"] {
        create_user(&store, &resources, name).await;
    }

    let counted = store.wait_for(users_counted, WAIT);
    let filter = LoopbackFilter::new().with_order("name ASC").with_limit(2);
    resources
        .users
        .list_and_count(&store.dispatcher(), Some(filter))
        .await
        .unwrap();
    counted.await.unwrap();

    let list = store.state(|s| s.users.list.clone()).await;
    let names: Vec<&str> = list.data.iter().map(|u| u.name.as_str()).collect();
    assert_eq!(names, vec!["Ada", "Grace"]);
    assert_eq!(list.count, 3, "count ignores pagination");
    assert!(!list.is_fetch_loading);
    assert!(!list.is_count_loading);
}

#[tokio::test]
async fn update_changes_the_model_and_keeps_created_at() {
    let (store, resources) = setup(ScriptedConfirm::accepting());
    let ada = create_user(&store, &resources, "Ada").await;

    let mut patch = PartialRecord::new();
    patch.insert("admin".into(), json!(true));
    let updated = resources
        .users
        .update(
            &store.dispatcher(),
            &UpdateConfig::new(),
            ada.id.clone().unwrap(),
            patch,
            CallOptions::new(),
        )
        .await
        .unwrap()
        .unwrap();

    assert!(updated.admin);
    assert_eq!(updated.created_at, ada.created_at);
    assert_eq!(store.state(|s| s.users.model.data.clone()).await, updated);
}

#[tokio::test]
async fn failed_update_keeps_the_previous_model() {
    let (store, resources) = setup(ScriptedConfirm::accepting());
    let ada = create_user(&store, &resources, "Ada").await;

    let result = resources
        .users
        .update(
            &store.dispatcher(),
            &UpdateConfig::new(),
            RecordId::from("missing"),
            PartialRecord::new(),
            CallOptions::new(),
        )
        .await;

    assert_eq!(
        result,
        Err(ActionError::Transport(AdapterError::NotFound(RecordId::from("missing"))))
    );
    let model = store.state(|s| s.users.model.clone()).await;
    assert_eq!(model.data, ada);
    assert!(!model.is_loading);
}

#[tokio::test]
async fn confirmed_delete_refreshes_the_list() {
    let (store, resources) = setup(ScriptedConfirm::accepting());
    let ada = create_user(&store, &resources, "Ada").await;
    create_user(&store, &resources, "Grace").await;

    let counted = store.wait_for(users_counted, WAIT);
    let delete = DeleteConfig::new()
        .with_confirmation("Delete Ada?")
        .with_refresh(None);
    resources
        .users
        .delete(&store.dispatcher(), &delete, ada.id.clone().unwrap(), CallOptions::new())
        .await
        .unwrap();
    counted.await.unwrap();

    let state = store.state(Clone::clone).await;
    assert_eq!(state.users.list.count, 1);
    assert_eq!(state.users.list.data[0].name, "Grace");
    assert_eq!(state.users.model.data, User::default(), "delete resets the model");
}

#[tokio::test]
async fn declined_delete_keeps_the_record() {
    let (store, resources) = setup(ScriptedConfirm::declining());
    let ada = create_user(&store, &resources, "Ada").await;

    let result = resources
        .users
        .delete(
            &store.dispatcher(),
            &DeleteConfig::new().with_confirmation("Delete Ada?"),
            ada.id.clone().unwrap(),
            CallOptions::new(),
        )
        .await;

    assert_eq!(result, Err(ActionError::Cancelled));
    let fetched = resources
        .users
        .fetch(&store.dispatcher(), ada.id.clone().unwrap(), None, CallOptions::new())
        .await
        .unwrap();
    assert_eq!(fetched, ada);
}

#[tokio::test]
async fn posts_do_not_touch_the_users_resource() {
    let (store, resources) = setup(ScriptedConfirm::accepting());
    let ada = create_user(&store, &resources, "Ada").await;

    let post = resources
        .posts
        .create(
            &store.dispatcher(),
            &CreateConfig::new(),
            Post::new("Notes", ada.id.clone()),
            CallOptions::new(),
        )
        .await
        .unwrap()
        .unwrap();

    let state = store.state(Clone::clone).await;
    assert_eq!(state.posts.model.data, post);
    assert_eq!(state.posts.model.data.author_id, ada.id);
    assert_eq!(state.users.model.data, ada);
}
