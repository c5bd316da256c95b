use std::sync::Arc;

use async_trait::async_trait;
use bb_core::{BoxError, Storage, StorageError, StoreItem, StoreItems, WriteMode, new_etag};
use bb_telemetry::{Outcome, record_storage_op};
use futures::future::try_join_all;
use serde_json::Value;
use tracing::debug;

/// A row of the `(id, data, etag)` state table.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlRow {
    pub id: String,
    pub data: Value,
    pub etag: String,
}

/// Statement shapes for the state table, per SQL flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlDialect {
    Postgres,
    Mssql,
}

impl SqlDialect {
    pub fn create_table(self, table: &str) -> String {
        match self {
            SqlDialect::Postgres => format!(
                "CREATE TABLE IF NOT EXISTS {table} (id TEXT PRIMARY KEY, data JSONB NOT NULL, etag TEXT NOT NULL)"
            ),
            SqlDialect::Mssql => format!(
                "IF OBJECT_ID(N'{table}', N'U') IS NULL CREATE TABLE {table} (id NVARCHAR(255) NOT NULL PRIMARY KEY, data NVARCHAR(MAX) NOT NULL, etag NVARCHAR(64) NOT NULL)"
            ),
        }
    }

    pub fn select_many(self, table: &str) -> String {
        match self {
            SqlDialect::Postgres => {
                format!("SELECT id, data, etag FROM {table} WHERE id = ANY($1)")
            }
            // Ids are passed as a JSON array in @ids.
            SqlDialect::Mssql => format!(
                "SELECT id, data, etag FROM {table} WHERE id IN (SELECT value FROM OPENJSON(@ids))"
            ),
        }
    }

    pub fn upsert(self, table: &str) -> String {
        match self {
            SqlDialect::Postgres => format!(
                "INSERT INTO {table} (id, data, etag) VALUES ($1, $2, $3) \
                 ON CONFLICT (id) DO UPDATE SET data = EXCLUDED.data, etag = EXCLUDED.etag"
            ),
            SqlDialect::Mssql => format!(
                "MERGE {table} WITH (HOLDLOCK) AS t USING (SELECT @id AS id) AS s ON t.id = s.id \
                 WHEN MATCHED THEN UPDATE SET data = @data, etag = @etag \
                 WHEN NOT MATCHED THEN INSERT (id, data, etag) VALUES (@id, @data, @etag);"
            ),
        }
    }

    pub fn update_if_etag(self, table: &str) -> String {
        match self {
            SqlDialect::Postgres => {
                format!("UPDATE {table} SET data = $2, etag = $3 WHERE id = $1 AND etag = $4")
            }
            SqlDialect::Mssql => format!(
                "UPDATE {table} SET data = @data, etag = @etag WHERE id = @id AND etag = @expected"
            ),
        }
    }

    pub fn delete_many(self, table: &str) -> String {
        match self {
            SqlDialect::Postgres => format!("DELETE FROM {table} WHERE id = ANY($1)"),
            SqlDialect::Mssql => format!(
                "DELETE FROM {table} WHERE id IN (SELECT value FROM OPENJSON(@ids))"
            ),
        }
    }
}

/// Row operations over the state table. [`SqlDialect`] has the statements to run.
#[async_trait]
pub trait SqlTable: Send + Sync {
    async fn select_many(&self, ids: &[String]) -> Result<Vec<SqlRow>, BoxError>;
    async fn upsert(&self, row: SqlRow) -> Result<(), BoxError>;
    /// Returns the number of rows updated.
    async fn update_if_etag(&self, row: SqlRow, expected: &str) -> Result<u64, BoxError>;
    async fn delete_many(&self, ids: &[String]) -> Result<u64, BoxError>;
}

/// Storage over a relational `(id, data, etag)` table.
pub struct SqlStorage<C> {
    provider: &'static str,
    table: Arc<C>,
}

/// SQL Server flavour; `C` runs [`SqlDialect::Mssql`] statements.
pub type MssqlStorage<C> = SqlStorage<C>;

impl<C: SqlTable> SqlStorage<C> {
    pub fn new(provider: &'static str, table: Arc<C>) -> Self {
        Self { provider, table }
    }

    pub fn mssql(table: Arc<C>) -> Self {
        Self::new("mssql", table)
    }

    fn backend(&self, err: BoxError) -> StorageError {
        StorageError::backend(self.provider, err)
    }

    async fn write_one(&self, key: String, item: StoreItem) -> Result<(), StorageError> {
        let mode = WriteMode::for_item(&key, item.e_tag.as_deref())?;
        let row = SqlRow {
            id: key.clone(),
            data: item.document_value(),
            etag: new_etag(),
        };
        match mode {
            WriteMode::Unconditional => self.table.upsert(row).await.map_err(|e| self.backend(e)),
            WriteMode::Conditional(expected) => {
                let updated = self
                    .table
                    .update_if_etag(row, &expected)
                    .await
                    .map_err(|e| self.backend(e))?;
                if updated == 0 {
                    return Err(StorageError::ETagConflict { key });
                }
                Ok(())
            }
        }
    }
}

#[async_trait]
impl<C: SqlTable> Storage for SqlStorage<C> {
    async fn read(&self, keys: &[String]) -> Result<StoreItems, StorageError> {
        if keys.is_empty() {
            return Ok(StoreItems::new());
        }
        let rows = self.table.select_many(keys).await.map_err(|e| self.backend(e));
        let result = rows.and_then(|rows| {
            rows.into_iter()
                .map(|row| {
                    let item = StoreItem::from_value(row.data)?.with_etag(row.etag);
                    Ok((row.id, item))
                })
                .collect::<Result<StoreItems, StorageError>>()
        });
        if let Ok(items) = &result {
            debug!(provider = self.provider, requested = keys.len(), found = items.len(), "read");
        }
        record_storage_op(self.provider, "read", Outcome::of(&result));
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
        debug!(provider = self.provider, count, ok = result.is_ok(), "write");
        record_storage_op(self.provider, "write", Outcome::of(&result));
        result
    }

    async fn delete(&self, keys: &[String]) -> Result<(), StorageError> {
        if keys.is_empty() {
            return Ok(());
        }
        let result = self.table.delete_many(keys).await.map_err(|e| self.backend(e));
        if let Ok(deleted) = &result {
            debug!(provider = self.provider, requested = keys.len(), deleted, "delete");
        }
        record_storage_op(self.provider, "delete", Outcome::of(&result));
        result.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeTable {
        rows: Mutex<HashMap<String, SqlRow>>,
    }

    #[async_trait]
    impl SqlTable for FakeTable {
        async fn select_many(&self, ids: &[String]) -> Result<Vec<SqlRow>, BoxError> {
            let rows = self.rows.lock().unwrap();
            Ok(ids.iter().filter_map(|id| rows.get(id).cloned()).collect())
        }

        async fn upsert(&self, row: SqlRow) -> Result<(), BoxError> {
            self.rows.lock().unwrap().insert(row.id.clone(), row);
            Ok(())
        }

        async fn update_if_etag(&self, row: SqlRow, expected: &str) -> Result<u64, BoxError> {
            let mut rows = self.rows.lock().unwrap();
            match rows.get_mut(&row.id) {
                Some(current) if current.etag == expected => {
                    *current = row;
                    Ok(1)
                }
                _ => Ok(0),
            }
        }

        async fn delete_many(&self, ids: &[String]) -> Result<u64, BoxError> {
            let mut rows = self.rows.lock().unwrap();
            Ok(ids.iter().filter(|id| rows.remove(*id).is_some()).count() as u64)
        }
    }

    #[tokio::test]
    async fn mssql_storage_passes_conformance() {
        let store = MssqlStorage::mssql(Arc::new(FakeTable::default()));
        bb_testutil::storage::assert_conformance(&store).await;
    }

    #[tokio::test]
    async fn non_object_rows_are_reported() {
        let table = Arc::new(FakeTable::default());
        table.rows.lock().unwrap().insert(
            "bad".into(),
            SqlRow {
                id: "bad".into(),
                data: Value::from(3),
                etag: "1".into(),
            },
        );
        let store = SqlStorage::mssql(table);
        let err = store.read(&["bad".to_string()]).await.unwrap_err();
        assert!(matches!(err, StorageError::NotAnObject("number")));
    }

    #[test]
    fn postgres_dialect_statements() {
        let dialect = SqlDialect::Postgres;
        assert_eq!(
            dialect.create_table("bot_state"),
            "CREATE TABLE IF NOT EXISTS bot_state (id TEXT PRIMARY KEY, data JSONB NOT NULL, etag TEXT NOT NULL)"
        );
        assert_eq!(
            dialect.select_many("bot_state"),
            "SELECT id, data, etag FROM bot_state WHERE id = ANY($1)"
        );
        assert_eq!(
            dialect.upsert("bot_state"),
            "INSERT INTO bot_state (id, data, etag) VALUES ($1, $2, $3) \
             ON CONFLICT (id) DO UPDATE SET data = EXCLUDED.data, etag = EXCLUDED.etag"
        );
        assert_eq!(
            dialect.delete_many("bot_state"),
            "DELETE FROM bot_state WHERE id = ANY($1)"
        );
    }

    #[test]
    fn dialects_render_conditional_update() {
        assert_eq!(
            SqlDialect::Postgres.update_if_etag("bot_state"),
            "UPDATE bot_state SET data = $2, etag = $3 WHERE id = $1 AND etag = $4"
        );
        assert!(SqlDialect::Mssql.upsert("bot_state").starts_with("MERGE bot_state"));
        assert!(SqlDialect::Mssql.create_table("s").contains("NVARCHAR(MAX)"));
    }
}
