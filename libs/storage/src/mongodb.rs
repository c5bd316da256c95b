use std::sync::Arc;

use async_trait::async_trait;
use bb_core::{BoxError, Storage, StorageError, StoreItem, StoreItems, WriteMode, new_etag};
use bb_telemetry::{Outcome, record_storage_op};
use futures::future::try_join_all;
use serde_json::{Map, Value};
use tracing::debug;

const PROVIDER: &str = "mongodb";

/// A collection document: `{ _id, document, eTag }`.
#[derive(Debug, Clone, PartialEq)]
pub struct MongoDocument {
    pub id: String,
    pub document: Map<String, Value>,
    pub e_tag: String,
}

/// Result of `replaceOne`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaceOutcome {
    pub matched: u64,
    pub upserted: bool,
}

/// Collection calls used by [`MongoDbStorage`]. Implement over the official driver.
#[async_trait]
pub trait DocumentCollection: Send + Sync {
    /// `find({ _id: { $in: ids } })`
    async fn find_by_ids(&self, ids: &[String]) -> Result<Vec<MongoDocument>, BoxError>;

    /// `replaceOne` filtered on `_id`, plus `eTag` when `expected_etag` is set.
    async fn replace_one(
        &self,
        doc: MongoDocument,
        expected_etag: Option<&str>,
        upsert: bool,
    ) -> Result<ReplaceOutcome, BoxError>;

    /// `deleteMany({ _id: { $in: ids } })`, returning the deleted count.
    async fn delete_many(&self, ids: &[String]) -> Result<u64, BoxError>;
}

/// Storage over a MongoDB collection. Reads are one `$in` query.
pub struct MongoDbStorage<C> {
    collection: Arc<C>,
}

impl<C: DocumentCollection> MongoDbStorage<C> {
    pub fn new(collection: Arc<C>) -> Self {
        Self { collection }
    }

    async fn write_one(&self, key: String, item: StoreItem) -> Result<(), StorageError> {
        let mode = WriteMode::for_item(&key, item.e_tag.as_deref())?;
        let doc = MongoDocument {
            id: key.clone(),
            document: item.document,
            e_tag: new_etag(),
        };
        match mode {
            WriteMode::Unconditional => {
                self.collection
                    .replace_one(doc, None, true)
                    .await
                    .map_err(|err| StorageError::backend(PROVIDER, err))?;
            }
            WriteMode::Conditional(expected) => {
                let outcome = self
                    .collection
                    .replace_one(doc, Some(&expected), false)
                    .await
                    .map_err(|err| StorageError::backend(PROVIDER, err))?;
                if outcome.matched == 0 {
                    return Err(StorageError::ETagConflict { key });
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl<C: DocumentCollection> Storage for MongoDbStorage<C> {
    async fn read(&self, keys: &[String]) -> Result<StoreItems, StorageError> {
        if keys.is_empty() {
            return Ok(StoreItems::new());
        }
        let result = self
            .collection
            .find_by_ids(keys)
            .await
            .map_err(|err| StorageError::backend(PROVIDER, err))
            .map(|docs| {
                docs.into_iter()
                    .filter(|doc| keys.contains(&doc.id))
                    .map(|doc| (doc.id, StoreItem::new(doc.document).with_etag(doc.e_tag)))
                    .collect::<StoreItems>()
            });
        if let Ok(items) = &result {
            debug!(provider = PROVIDER, requested = keys.len(), found = items.len(), "read");
        }
        record_storage_op(PROVIDER, "read", Outcome::of(&result));
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
        debug!(provider = PROVIDER, count, ok = result.is_ok(), "write");
        record_storage_op(PROVIDER, "write", Outcome::of(&result));
        result
    }

    async fn delete(&self, keys: &[String]) -> Result<(), StorageError> {
        if keys.is_empty() {
            return Ok(());
        }
        let result = self
            .collection
            .delete_many(keys)
            .await
            .map_err(|err| StorageError::backend(PROVIDER, err));
        if let Ok(deleted) = &result {
            debug!(provider = PROVIDER, requested = keys.len(), deleted, "delete");
        }
        record_storage_op(PROVIDER, "delete", Outcome::of(&result));
        result.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeCollection {
        docs: Mutex<HashMap<String, MongoDocument>>,
    }

    #[async_trait]
    impl DocumentCollection for FakeCollection {
        async fn find_by_ids(&self, ids: &[String]) -> Result<Vec<MongoDocument>, BoxError> {
            let docs = self.docs.lock().unwrap();
            Ok(ids.iter().filter_map(|id| docs.get(id).cloned()).collect())
        }

        async fn replace_one(
            &self,
            doc: MongoDocument,
            expected_etag: Option<&str>,
            upsert: bool,
        ) -> Result<ReplaceOutcome, BoxError> {
            let mut docs = self.docs.lock().unwrap();
            let matched = match (docs.get(&doc.id), expected_etag) {
                (Some(current), Some(expected)) => current.e_tag == expected,
                (Some(_), None) => true,
                (None, _) => false,
            };
            if matched || upsert {
                let upserted = !matched;
                docs.insert(doc.id.clone(), doc);
                return Ok(ReplaceOutcome {
                    matched: u64::from(matched),
                    upserted,
                });
            }
            Ok(ReplaceOutcome::default())
        }

        async fn delete_many(&self, ids: &[String]) -> Result<u64, BoxError> {
            let mut docs = self.docs.lock().unwrap();
            Ok(ids.iter().filter(|id| docs.remove(*id).is_some()).count() as u64)
        }
    }

    #[tokio::test]
    async fn passes_storage_conformance() {
        let store = MongoDbStorage::new(Arc::new(FakeCollection::default()));
        bb_testutil::storage::assert_conformance(&store).await;
    }

    #[tokio::test]
    async fn empty_key_lists_skip_the_collection() {
        struct Unreachable;

        #[async_trait]
        impl DocumentCollection for Unreachable {
            async fn find_by_ids(&self, _: &[String]) -> Result<Vec<MongoDocument>, BoxError> {
                Err("should not be called".into())
            }

            async fn replace_one(
                &self,
                _: MongoDocument,
                _: Option<&str>,
                _: bool,
            ) -> Result<ReplaceOutcome, BoxError> {
                Err("should not be called".into())
            }

            async fn delete_many(&self, _: &[String]) -> Result<u64, BoxError> {
                Err("should not be called".into())
            }
        }

        let store = MongoDbStorage::new(Arc::new(Unreachable));
        assert!(store.read(&[]).await.unwrap().is_empty());
        store.delete(&[]).await.unwrap();
    }
}
