//! Local adapter behaviour through the `RequestAdapter` interface.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use crud_store_core::adapter::RequestAdapter;
use crud_store_core::error::AdapterError;
use crud_store_core::filter::LoopbackFilter;
use crud_store_core::record::{CountResponse, DeleteResponse, RecordId};
use crud_store_local::{LocalAdapter, LocalDatabase};
use crud_store_testing::{SequentialIdGenerator, test_clock};
use futures::StreamExt;
use serde_json::{Map, Value, json};
use std::sync::Arc;
use std::time::Duration;

const CREATED_AT: &str = "2025-01-01T00:00:00.000Z";

fn adapter(db: &Arc<LocalDatabase>) -> LocalAdapter<Value> {
    LocalAdapter::from_database(Arc::clone(db), "users")
        .with_clock(test_clock())
        .with_id_generator(SequentialIdGenerator::with_prefix("u"))
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("not an object: {other}"),
    }
}

async fn seeded() -> (Arc<LocalDatabase>, LocalAdapter<Value>) {
    let db = Arc::new(LocalDatabase::new("test"));
    let users = adapter(&db);
    for (name, age) in [("carol", 41), ("alice", 29), ("bob", 35)] {
        users.create(json!({"name": name, "age": age})).await.unwrap();
    }
    (db, users)
}

#[tokio::test]
async fn create_fills_id_and_timestamps() {
    let db = Arc::new(LocalDatabase::new("test"));
    let created = adapter(&db).create(json!({"name": "a"})).await.unwrap();

    assert_eq!(
        created,
        json!({"id": "u1", "name": "a", "createdAt": CREATED_AT, "updatedAt": CREATED_AT})
    );
    assert_eq!(db.collection("users").unwrap().len().unwrap(), 1);
}

#[tokio::test]
async fn create_keeps_a_provided_id() {
    let db = Arc::new(LocalDatabase::new("test"));
    let created = adapter(&db).create(json!({"id": 42, "name": "a"})).await.unwrap();

    assert_eq!(created["id"], json!(42));
}

#[tokio::test]
async fn create_fills_a_null_id() {
    let db = Arc::new(LocalDatabase::new("test"));
    let created = adapter(&db).create(json!({"id": null, "name": "a"})).await.unwrap();

    assert_eq!(created["id"], json!("u1"));
}

#[tokio::test]
async fn create_rejects_an_unusable_id_instead_of_replacing_it() {
    let db = Arc::new(LocalDatabase::new("test"));
    let users = adapter(&db);

    for id in [json!(1.5), json!(u64::MAX), json!(true), json!({"nested": 1})] {
        let error = users
            .create(json!({"id": id.clone(), "name": "a"}))
            .await
            .unwrap_err();
        assert!(matches!(error, AdapterError::Storage(_)), "{id}: got {error:?}");
    }
    assert!(db.collection("users").unwrap().is_empty().unwrap());
}

#[tokio::test]
async fn create_with_existing_id_is_a_storage_error() {
    let db = Arc::new(LocalDatabase::new("test"));
    let users = adapter(&db);
    users.create(json!({"id": 1})).await.unwrap();

    let error = users.create(json!({"id": 1})).await.unwrap_err();
    assert!(matches!(error, AdapterError::Storage(_)), "got {error:?}");
}

#[tokio::test]
async fn get_all_applies_where_order_and_pagination() {
    let (_db, users) = seeded().await;

    let filter = LoopbackFilter::new()
        .with_where(json!({"age": {"$lt": 40}}))
        .with_order("name DESC")
        .with_limit(1)
        .with_skip(1);
    let page = users.get_all(Some(filter)).await.unwrap();

    assert_eq!(page.len(), 1);
    assert_eq!(page[0]["name"], json!("alice"));
}

#[tokio::test]
async fn get_all_orders_ascending_by_default() {
    let (_db, users) = seeded().await;

    let sorted = users
        .get_all(Some(LoopbackFilter::new().with_order("age")))
        .await
        .unwrap();
    let names: Vec<&str> = sorted.iter().filter_map(|u| u["name"].as_str()).collect();

    assert_eq!(names, vec!["alice", "bob", "carol"]);
}

#[tokio::test]
async fn count_ignores_pagination() {
    let (_db, users) = seeded().await;

    let filter = LoopbackFilter::new()
        .with_where(json!({"age": {"gte": 30}}))
        .with_limit(1);

    assert_eq!(users.count(Some(filter)).await.unwrap(), CountResponse::new(2));
    assert_eq!(users.count(None).await.unwrap(), CountResponse::new(3));
}

#[tokio::test]
async fn get_by_id_finds_or_fails() {
    let (_db, users) = seeded().await;

    let bob = users.get_by_id(RecordId::from("u3"), None).await.unwrap();
    assert_eq!(bob["name"], json!("bob"));

    assert_eq!(
        users.get_by_id(RecordId::from("nope"), None).await,
        Err(AdapterError::NotFound(RecordId::from("nope")))
    );
}

#[tokio::test]
async fn update_stamps_updated_at_and_keeps_created_at() {
    let db = Arc::new(LocalDatabase::new("test"));
    adapter(&db).create(json!({"name": "a"})).await.unwrap();

    let later = chrono::DateTime::parse_from_rfc3339("2025-06-01T12:00:00Z")
        .unwrap()
        .with_timezone(&chrono::Utc);
    let users = adapter(&db).with_clock(crud_store_testing::FixedClock::new(later));

    let updated = users
        .update(
            RecordId::from("u1"),
            object(json!({"name": "b", "createdAt": "1999-01-01T00:00:00.000Z"})),
        )
        .await
        .unwrap();

    assert_eq!(updated["name"], json!("b"));
    assert_eq!(updated["createdAt"], json!(CREATED_AT));
    assert_eq!(updated["updatedAt"], json!("2025-06-01T12:00:00.000Z"));
}

#[tokio::test]
async fn update_of_missing_record_is_not_found() {
    let db = Arc::new(LocalDatabase::new("test"));

    let result = adapter(&db)
        .update(RecordId::from(7), object(json!({"name": "x"})))
        .await;

    assert_eq!(result, Err(AdapterError::NotFound(RecordId::from(7))));
}

#[tokio::test]
async fn delete_removes_the_record() {
    let (db, users) = seeded().await;

    assert_eq!(
        users.delete(RecordId::from("u2")).await.unwrap(),
        DeleteResponse::new("u2")
    );
    assert_eq!(db.collection("users").unwrap().len().unwrap(), 2);
    assert_eq!(
        users.delete(RecordId::from("u2")).await,
        Err(AdapterError::NotFound(RecordId::from("u2")))
    );
}

#[tokio::test]
async fn cleaner_runs_before_storage() {
    let db = Arc::new(LocalDatabase::new("test"));
    let users = adapter(&db).with_cleaner(|mut body| {
        body.remove("password");
        body
    });

    let created = users
        .create(json!({"name": "a", "password": "hunter2"}))
        .await
        .unwrap();

    assert!(created.get("password").is_none());
}

#[tokio::test]
async fn deferred_database_is_opened_once() {
    let (tx, rx) = tokio::sync::oneshot::channel::<Arc<LocalDatabase>>();
    let users = LocalAdapter::<Value>::new(async move { rx.await.unwrap() }, "users")
        .with_id_generator(SequentialIdGenerator::new());

    let pending = tokio::spawn({
        let users = users.clone();
        async move { users.create(json!({"name": "early"})).await }
    });
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(!pending.is_finished());

    let db = Arc::new(LocalDatabase::new("late"));
    tx.send(Arc::clone(&db)).unwrap();

    let created = pending.await.unwrap().unwrap();
    assert_eq!(created["id"], json!("id-1"));
    assert_eq!(users.count(None).await.unwrap().count, 1);
}

#[tokio::test]
async fn adapter_writes_reach_query_watchers() {
    let db = Arc::new(LocalDatabase::new("test"));
    let users = adapter(&db);
    let collection = db.collection("users").unwrap();
    let mut everyone = Box::pin(collection.find().watch());

    assert!(everyone.next().await.unwrap().unwrap().is_empty());

    users.create(json!({"name": "a"})).await.unwrap();
    assert_eq!(everyone.next().await.unwrap().unwrap().len(), 1);

    users.delete(RecordId::from("u1")).await.unwrap();
    assert!(everyone.next().await.unwrap().unwrap().is_empty());
}
