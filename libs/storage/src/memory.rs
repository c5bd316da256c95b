use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use bb_core::{Storage, StorageError, StoreItem, StoreItems, WriteMode};
use bb_telemetry::{Outcome, record_storage_op};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::debug;

const PROVIDER: &str = "memory";

/// Process-local storage. Etags are a per-store counter.
#[derive(Default)]
pub struct MemoryStorage {
    items: DashMap<String, StoreItem>,
    etag_seq: AtomicU64,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn next_etag(&self) -> String {
        (self.etag_seq.fetch_add(1, Ordering::SeqCst) + 1).to_string()
    }

    fn write_one(&self, key: String, item: StoreItem) -> Result<(), StorageError> {
        let mode = WriteMode::for_item(&key, item.e_tag.as_deref())?;
        let stored = StoreItem::new(item.document).with_etag(self.next_etag());
        match (self.items.entry(key.clone()), mode) {
            (Entry::Occupied(mut existing), WriteMode::Conditional(expected)) => {
                if existing.get().e_tag.as_deref() != Some(expected.as_str()) {
                    return Err(StorageError::ETagConflict { key });
                }
                existing.insert(stored);
            }
            (Entry::Vacant(_), WriteMode::Conditional(_)) => {
                return Err(StorageError::ETagConflict { key });
            }
            (Entry::Occupied(mut existing), WriteMode::Unconditional) => {
                existing.insert(stored);
            }
            (Entry::Vacant(slot), WriteMode::Unconditional) => {
                slot.insert(stored);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn read(&self, keys: &[String]) -> Result<StoreItems, StorageError> {
        let items: StoreItems = keys
            .iter()
            .filter_map(|key| {
                self.items
                    .get(key)
                    .map(|entry| (key.clone(), entry.value().clone()))
            })
            .collect();
        debug!(provider = PROVIDER, requested = keys.len(), found = items.len(), "read");
        record_storage_op(PROVIDER, "read", Outcome::Ok);
        Ok(items)
    }

    async fn write(&self, changes: StoreItems) -> Result<(), StorageError> {
        let mut result = Ok(());
        for (key, item) in changes {
            result = self.write_one(key, item);
            if result.is_err() {
                break;
            }
        }
        debug!(provider = PROVIDER, ok = result.is_ok(), "write");
        record_storage_op(PROVIDER, "write", Outcome::of(&result));
        result
    }

    async fn delete(&self, keys: &[String]) -> Result<(), StorageError> {
        let removed = keys
            .iter()
            .filter(|key| self.items.remove(key.as_str()).is_some())
            .count();
        debug!(provider = PROVIDER, requested = keys.len(), removed, "delete");
        record_storage_op(PROVIDER, "delete", Outcome::Ok);
        Ok(())
    }
}
