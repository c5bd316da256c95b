use std::sync::Arc;

use async_trait::async_trait;
use bb_core::{BoxError, Storage, StorageError, StoreItem, StoreItems, WriteMode, new_etag, sanitize_key};
use bb_telemetry::{Outcome, record_storage_op};
use futures::future::try_join_all;
use serde_json::{Map, Value};
use tracing::debug;

const PROVIDER: &str = "dynamodb";
/// DynamoDB partition keys are limited to 2048 bytes.
const MAX_KEY_LEN: usize = 2048;

/// One table item: `{ key, document, eTag }`.
#[derive(Debug, Clone, PartialEq)]
pub struct DynamoRecord {
    pub key: String,
    pub document: Map<String, Value>,
    pub e_tag: String,
}

/// Condition attached to a put.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PutCondition {
    None,
    /// `attribute_exists(key) AND eTag = :etag`
    ETagEquals(String),
}

#[derive(Debug, thiserror::Error)]
pub enum DynamoError {
    #[error("conditional check failed")]
    ConditionalCheckFailed,
    #[error("dynamodb request failed: {0}")]
    Service(#[source] BoxError),
}

/// The three table calls the storage needs. Implement over the AWS SDK or any compatible API.
#[async_trait]
pub trait DynamoTable: Send + Sync {
    async fn get_item(&self, key: &str) -> Result<Option<DynamoRecord>, DynamoError>;
    async fn put_item(&self, record: DynamoRecord, condition: PutCondition)
    -> Result<(), DynamoError>;
    async fn delete_item(&self, key: &str) -> Result<(), DynamoError>;
}

/// Storage over a DynamoDB table keyed by a single `key` attribute.
pub struct DynamoDbStorage<C> {
    table: Arc<C>,
}

impl<C: DynamoTable> DynamoDbStorage<C> {
    pub fn new(table: Arc<C>) -> Self {
        Self { table }
    }

    async fn read_one(&self, key: &str) -> Result<Option<(String, StoreItem)>, StorageError> {
        let record = self
            .table
            .get_item(&sanitize_key(key, Some(MAX_KEY_LEN)))
            .await
            .map_err(service_error)?;
        Ok(record.map(|record| {
            (
                key.to_string(),
                StoreItem::new(record.document).with_etag(record.e_tag),
            )
        }))
    }

    async fn write_one(&self, key: String, item: StoreItem) -> Result<(), StorageError> {
        let condition = match WriteMode::for_item(&key, item.e_tag.as_deref())? {
            WriteMode::Unconditional => PutCondition::None,
            WriteMode::Conditional(tag) => PutCondition::ETagEquals(tag),
        };
        let record = DynamoRecord {
            key: sanitize_key(&key, Some(MAX_KEY_LEN)),
            document: item.document,
            e_tag: new_etag(),
        };
        match self.table.put_item(record, condition).await {
            Ok(()) => Ok(()),
            Err(DynamoError::ConditionalCheckFailed) => Err(StorageError::ETagConflict { key }),
            Err(err) => Err(service_error(err)),
        }
    }
}

fn service_error(err: DynamoError) -> StorageError {
    StorageError::backend(PROVIDER, err)
}

#[async_trait]
impl<C: DynamoTable> Storage for DynamoDbStorage<C> {
    async fn read(&self, keys: &[String]) -> Result<StoreItems, StorageError> {
        let result = try_join_all(keys.iter().map(|key| self.read_one(key)))
            .await
            .map(|found| found.into_iter().flatten().collect::<StoreItems>());
        record_storage_op(PROVIDER, "read", Outcome::of(&result));
        if let Ok(items) = &result {
            debug!(provider = PROVIDER, requested = keys.len(), found = items.len(), "read");
        }
        result
    }

    async fn write(&self, changes: StoreItems) -> Result<(), StorageError> {
        let count = changes.len();
        let result = try_join_all(
            changes
                .into_iter()
                .map(|(key, item)| self.write_one(key, item)),
        )
        .await
        .map(|_| ());
        record_storage_op(PROVIDER, "write", Outcome::of(&result));
        debug!(provider = PROVIDER, count, ok = result.is_ok(), "write");
        result
    }

    async fn delete(&self, keys: &[String]) -> Result<(), StorageError> {
        let result = try_join_all(keys.iter().map(|key| async move {
            let key = sanitize_key(key, Some(MAX_KEY_LEN));
            self.table.delete_item(&key).await
        }))
        .await
        .map(|_| ())
        .map_err(service_error);
        debug!(provider = PROVIDER, requested = keys.len(), ok = result.is_ok(), "delete");
        record_storage_op(PROVIDER, "delete", Outcome::of(&result));
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bb_testutil::storage::{item, keys};
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-process table honouring the put condition the way DynamoDB does.
    #[derive(Default)]
    struct FakeTable {
        items: Mutex<HashMap<String, DynamoRecord>>,
    }

    #[async_trait]
    impl DynamoTable for FakeTable {
        async fn get_item(&self, key: &str) -> Result<Option<DynamoRecord>, DynamoError> {
            Ok(self.items.lock().unwrap().get(key).cloned())
        }

        async fn put_item(
            &self,
            record: DynamoRecord,
            condition: PutCondition,
        ) -> Result<(), DynamoError> {
            let mut items = self.items.lock().unwrap();
            if let PutCondition::ETagEquals(expected) = condition {
                match items.get(&record.key) {
                    Some(current) if current.e_tag == expected => {}
                    _ => return Err(DynamoError::ConditionalCheckFailed),
                }
            }
            items.insert(record.key.clone(), record);
            Ok(())
        }

        async fn delete_item(&self, key: &str) -> Result<(), DynamoError> {
            self.items.lock().unwrap().remove(key);
            Ok(())
        }
    }

    #[tokio::test]
    async fn passes_storage_conformance() {
        let store = DynamoDbStorage::new(Arc::new(FakeTable::default()));
        bb_testutil::storage::assert_conformance(&store).await;
    }

    #[tokio::test]
    async fn read_omits_keys_missing_from_table() {
        let table = Arc::new(FakeTable::default());
        let store = DynamoDbStorage::new(table.clone());
        store
            .write([("a".to_string(), item(json!({"v": 1})))].into())
            .await
            .unwrap();

        let read = store.read(&keys(&["a", "b"])).await.unwrap();
        assert!(read.contains_key("a"));
        assert!(!read.contains_key("b"));
    }

    #[tokio::test]
    async fn keys_are_sanitized_in_the_table() {
        let table = Arc::new(FakeTable::default());
        let store = DynamoDbStorage::new(table.clone());
        store
            .write([("conv/1?x".to_string(), item(json!({})))].into())
            .await
            .unwrap();
        assert!(table.items.lock().unwrap().contains_key("conv*2f1*3fx"));
        let read = store.read(&keys(&["conv/1?x"])).await.unwrap();
        assert!(read.contains_key("conv/1?x"));
    }

    struct Broken;

    #[async_trait]
    impl DynamoTable for Broken {
        async fn get_item(&self, _key: &str) -> Result<Option<DynamoRecord>, DynamoError> {
            Err(DynamoError::Service("throttled".into()))
        }

        async fn put_item(&self, _: DynamoRecord, _: PutCondition) -> Result<(), DynamoError> {
            Err(DynamoError::Service("throttled".into()))
        }

        async fn delete_item(&self, _key: &str) -> Result<(), DynamoError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn service_errors_surface_as_backend_errors() {
        let store = DynamoDbStorage::new(Arc::new(Broken));
        let err = store.read(&keys(&["a"])).await.unwrap_err();
        assert!(matches!(err, StorageError::Backend { backend: "dynamodb", .. }));
    }
}
