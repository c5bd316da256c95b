//! Behaviour every [`Storage`] provider shares, exercised against a fresh store.

use bb_core::{Storage, StorageError, StoreItem, StoreItems};
use serde_json::{Value, json};

pub fn item(document: Value) -> StoreItem {
    StoreItem::from_value(document).unwrap()
}

pub fn keys(keys: &[&str]) -> Vec<String> {
    keys.iter().map(|key| key.to_string()).collect()
}

fn one(key: &str, item: StoreItem) -> StoreItems {
    [(key.to_string(), item)].into()
}

/// Runs the shared storage behaviour against an empty store.
pub async fn assert_conformance(store: &dyn Storage) {
    missing_keys_are_omitted(store).await;
    conditional_writes(store).await;
    delete_is_idempotent(store).await;
}

async fn missing_keys_are_omitted(store: &dyn Storage) {
    assert!(store.read(&keys(&["nope"])).await.unwrap().is_empty());

    store
        .write(one("user/a", item(json!({"count": 1}))))
        .await
        .unwrap();
    let read = store.read(&keys(&["user/a", "user/b"])).await.unwrap();
    assert_eq!(read.len(), 1, "missing key must be omitted");
    let stored = &read["user/a"];
    assert_eq!(stored.document["count"], 1);
    assert!(
        stored.e_tag.as_deref().is_some_and(|tag| !tag.is_empty()),
        "reads carry an etag"
    );
}

async fn conditional_writes(store: &dyn Storage) {
    store
        .write(one("conv", item(json!({"turn": 1}))))
        .await
        .unwrap();
    let first = store.read(&keys(&["conv"])).await.unwrap()["conv"].clone();
    let first_tag = first.e_tag.clone().unwrap();

    let update = item(json!({"turn": 2})).with_etag(first_tag.clone());
    store.write(one("conv", update)).await.unwrap();
    let second = store.read(&keys(&["conv"])).await.unwrap()["conv"].clone();
    assert_eq!(second.document["turn"], 2);
    assert_ne!(second.e_tag.as_deref(), Some(first_tag.as_str()));

    let stale = item(json!({"turn": 99})).with_etag(first_tag);
    let err = store.write(one("conv", stale)).await.unwrap_err();
    assert!(
        matches!(err, StorageError::ETagConflict { ref key } if key == "conv"),
        "stale etag must conflict, got {err:?}"
    );
    let unchanged = store.read(&keys(&["conv"])).await.unwrap()["conv"].clone();
    assert_eq!(unchanged.document["turn"], 2);

    let forced = item(json!({"turn": 3})).with_etag("*");
    store.write(one("conv", forced)).await.unwrap();
    let third = store.read(&keys(&["conv"])).await.unwrap()["conv"].clone();
    assert_eq!(third.document["turn"], 3);

    let empty = item(json!({"turn": 4})).with_etag("");
    assert!(matches!(
        store.write(one("conv", empty)).await,
        Err(StorageError::EmptyETag { .. })
    ));

    let absent = item(json!({"turn": 1})).with_etag("123");
    assert!(matches!(
        store.write(one("never-written", absent)).await,
        Err(StorageError::ETagConflict { .. })
    ));
}

async fn delete_is_idempotent(store: &dyn Storage) {
    store
        .write(one("gone", item(json!({"x": true}))))
        .await
        .unwrap();
    store.delete(&keys(&["gone", "never"])).await.unwrap();
    assert!(store.read(&keys(&["gone"])).await.unwrap().is_empty());
    store.delete(&keys(&["gone"])).await.unwrap();
}
