//! Storage providers implementing [`bb_core::Storage`].
//!
//! Cloud providers take their vendor client through a narrow trait (`DynamoTable`,
//! `DocumentCollection`, `SqlTable`, `TableClient`) so the etag and key handling here stays the
//! same whichever SDK sits underneath. PostgreSQL and Redis ship concrete clients behind the
//! `postgres` and `redis-store` features.

mod azure_table;
mod dynamodb;
mod memory;
mod mongodb;
#[cfg(feature = "postgres")]
mod postgres;
#[cfg(feature = "redis-store")]
mod redis_store;
mod sql;

use std::{env, sync::Arc};

use anyhow::Result;
use bb_core::SharedStorage;
#[cfg(not(all(feature = "postgres", feature = "redis-store")))]
use tracing::warn;

pub use azure_table::{AzureTableRestClient, AzureTableStorage, TableClient, TableEntity, TableError};
pub use dynamodb::{DynamoDbStorage, DynamoError, DynamoRecord, DynamoTable, PutCondition};
pub use memory::MemoryStorage;
pub use mongodb::{DocumentCollection, MongoDbStorage, MongoDocument, ReplaceOutcome};
#[cfg(feature = "postgres")]
pub use postgres::{DEFAULT_TABLE, PgTable, PostgresStorage};
#[cfg(feature = "redis-store")]
pub use redis_store::RedisStorage;
pub use sql::{MssqlStorage, SqlDialect, SqlRow, SqlStorage, SqlTable};

/// Returns an in-memory storage wrapped in an [`Arc`].
pub fn shared_memory_storage() -> SharedStorage {
    Arc::new(MemoryStorage::new())
}

/// Builds the storage named by the environment.
///
/// `STORAGE_POSTGRES_URL` (feature `postgres`, table from `STORAGE_TABLE`) wins over
/// `STORAGE_REDIS_URL` (feature `redis-store`, key prefix from `STORAGE_NAMESPACE`). Without
/// either, or without the matching feature, state lives in memory.
pub async fn storage_from_env() -> Result<SharedStorage> {
    if let Ok(url) = env::var("STORAGE_POSTGRES_URL") {
        let table = env::var("STORAGE_TABLE").unwrap_or_else(|_| "bot_state".into());
        return build_postgres_storage(&url, &table).await;
    }
    if let Ok(url) = env::var("STORAGE_REDIS_URL") {
        let namespace = env::var("STORAGE_NAMESPACE").unwrap_or_else(|_| "bb".into());
        return build_redis_storage(&url, &namespace).await;
    }
    Ok(shared_memory_storage())
}

#[cfg(feature = "postgres")]
async fn build_postgres_storage(url: &str, table: &str) -> Result<SharedStorage> {
    let storage = PostgresStorage::connect(url, table)
        .await
        .map_err(|err| anyhow::anyhow!(err))?;
    Ok(Arc::new(storage))
}

#[cfg(not(feature = "postgres"))]
async fn build_postgres_storage(_url: &str, _table: &str) -> Result<SharedStorage> {
    warn!("postgres feature disabled; using in-memory storage");
    Ok(shared_memory_storage())
}

#[cfg(feature = "redis-store")]
async fn build_redis_storage(url: &str, namespace: &str) -> Result<SharedStorage> {
    let storage = RedisStorage::connect(url, namespace).await?;
    Ok(Arc::new(storage))
}

#[cfg(not(feature = "redis-store"))]
async fn build_redis_storage(_url: &str, _namespace: &str) -> Result<SharedStorage> {
    warn!("redis-store feature disabled; using in-memory storage");
    Ok(shared_memory_storage())
}
