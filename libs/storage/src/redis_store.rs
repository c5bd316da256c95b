use anyhow::Result;
use async_trait::async_trait;
use bb_core::{Storage, StorageError, StoreItem, StoreItems, WriteMode, new_etag};
use bb_telemetry::{Outcome, record_storage_op};
use redis::AsyncCommands;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::debug;

const PROVIDER: &str = "redis";

/// Replaces the value only when the stored `eTag` matches ARGV[2]; an empty ARGV[2] writes
/// unconditionally. Returns 1 on write, 0 on conflict.
const CAS_SCRIPT: &str = r#"
local expected = ARGV[2]
if expected ~= '' then
  local current = redis.call('GET', KEYS[1])
  if not current then
    return 0
  end
  if cjson.decode(current)['eTag'] ~= expected then
    return 0
  end
end
redis.call('SET', KEYS[1], ARGV[1])
return 1
"#;

pub struct RedisStorage {
    namespace: String,
    connection: Mutex<redis::aio::ConnectionManager>,
    cas: redis::Script,
}

impl RedisStorage {
    pub async fn connect(url: &str, namespace: impl Into<String>) -> Result<Self> {
        let client = redis::Client::open(url)?;
        let manager = redis::aio::ConnectionManager::new(client).await?;
        Ok(Self {
            namespace: namespace.into(),
            connection: Mutex::new(manager),
            cas: redis::Script::new(CAS_SCRIPT),
        })
    }

    fn state_key(&self, key: &str) -> String {
        format!("{}:state:{}", self.namespace, key)
    }
}

fn backend(err: redis::RedisError) -> StorageError {
    StorageError::backend(PROVIDER, err)
}

#[async_trait]
impl Storage for RedisStorage {
    async fn read(&self, keys: &[String]) -> Result<StoreItems, StorageError> {
        if keys.is_empty() {
            return Ok(StoreItems::new());
        }
        let redis_keys: Vec<String> = keys.iter().map(|key| self.state_key(key)).collect();
        let mut conn = self.connection.lock().await;
        let payloads: Vec<Option<String>> = conn.mget(&redis_keys).await.map_err(backend)?;
        drop(conn);

        let mut items = StoreItems::new();
        for (key, payload) in keys.iter().zip(payloads) {
            if let Some(raw) = payload {
                let value: Value = serde_json::from_str(&raw)?;
                items.insert(key.clone(), StoreItem::from_value(value)?);
            }
        }
        debug!(provider = PROVIDER, requested = keys.len(), found = items.len(), "read");
        record_storage_op(PROVIDER, "read", Outcome::Ok);
        Ok(items)
    }

    async fn write(&self, changes: StoreItems) -> Result<(), StorageError> {
        let mut conn = self.connection.lock().await;
        for (key, item) in changes {
            let expected = match WriteMode::for_item(&key, item.e_tag.as_deref())? {
                WriteMode::Unconditional => String::new(),
                WriteMode::Conditional(tag) => tag,
            };
            let stored = StoreItem::new(item.document).with_etag(new_etag());
            let payload = serde_json::to_string(&stored)?;
            let written: i64 = self
                .cas
                .key(self.state_key(&key))
                .arg(payload)
                .arg(expected)
                .invoke_async(&mut *conn)
                .await
                .map_err(backend)?;
            if written == 0 {
                record_storage_op(PROVIDER, "write", Outcome::Error);
                return Err(StorageError::ETagConflict { key });
            }
        }
        debug!(provider = PROVIDER, "write");
        record_storage_op(PROVIDER, "write", Outcome::Ok);
        Ok(())
    }

    async fn delete(&self, keys: &[String]) -> Result<(), StorageError> {
        if keys.is_empty() {
            return Ok(());
        }
        let redis_keys: Vec<String> = keys.iter().map(|key| self.state_key(key)).collect();
        let mut conn = self.connection.lock().await;
        let _: () = conn.del(redis_keys).await.map_err(backend)?;
        debug!(provider = PROVIDER, requested = keys.len(), "delete");
        record_storage_op(PROVIDER, "delete", Outcome::Ok);
        Ok(())
    }
}
