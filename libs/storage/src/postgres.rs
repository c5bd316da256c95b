use std::sync::Arc;

use async_trait::async_trait;
use bb_core::BoxError;
use serde_json::Value;
use sqlx::PgPool;
use tracing::info;

use crate::sql::{SqlDialect, SqlRow, SqlStorage, SqlTable};

pub const DEFAULT_TABLE: &str = "bot_state";

/// PostgreSQL state table driven through sqlx.
pub struct PgTable {
    pool: PgPool,
    table: String,
}

pub type PostgresStorage = SqlStorage<PgTable>;

impl PgTable {
    pub fn new(pool: PgPool) -> Self {
        Self::with_table(pool, DEFAULT_TABLE)
    }

    pub fn with_table(pool: PgPool, table: impl Into<String>) -> Self {
        Self {
            pool,
            table: table.into(),
        }
    }

    /// Creates the state table if it is missing.
    pub async fn ensure_table(&self) -> Result<(), BoxError> {
        sqlx::query(&SqlDialect::Postgres.create_table(&self.table))
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

impl SqlStorage<PgTable> {
    /// Connects, ensures the table exists and wraps it as storage.
    pub async fn connect(url: &str, table: &str) -> Result<Self, BoxError> {
        let pool = PgPool::connect(url).await?;
        let table = PgTable::with_table(pool, table);
        table.ensure_table().await?;
        info!(table = %table.table, "postgres storage ready");
        Ok(SqlStorage::new("postgres", Arc::new(table)))
    }
}

#[async_trait]
impl SqlTable for PgTable {
    async fn select_many(&self, ids: &[String]) -> Result<Vec<SqlRow>, BoxError> {
        let rows: Vec<(String, Value, String)> =
            sqlx::query_as(&SqlDialect::Postgres.select_many(&self.table))
                .bind(ids)
                .fetch_all(&self.pool)
                .await?;
        Ok(rows
            .into_iter()
            .map(|(id, data, etag)| SqlRow { id, data, etag })
            .collect())
    }

    async fn upsert(&self, row: SqlRow) -> Result<(), BoxError> {
        sqlx::query(&SqlDialect::Postgres.upsert(&self.table))
            .bind(&row.id)
            .bind(&row.data)
            .bind(&row.etag)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn update_if_etag(&self, row: SqlRow, expected: &str) -> Result<u64, BoxError> {
        let done = sqlx::query(&SqlDialect::Postgres.update_if_etag(&self.table))
            .bind(&row.id)
            .bind(&row.data)
            .bind(&row.etag)
            .bind(expected)
            .execute(&self.pool)
            .await?;
        Ok(done.rows_affected())
    }

    async fn delete_many(&self, ids: &[String]) -> Result<u64, BoxError> {
        let done = sqlx::query(&SqlDialect::Postgres.delete_many(&self.table))
            .bind(ids)
            .execute(&self.pool)
            .await?;
        Ok(done.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn highest_placeholder(sql: &str) -> usize {
        sql.split('$')
            .skip(1)
            .filter_map(|rest| {
                let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
                digits.parse().ok()
            })
            .max()
            .unwrap_or(0)
    }

    #[test]
    fn statements_take_as_many_parameters_as_the_table_binds() {
        let dialect = SqlDialect::Postgres;
        assert_eq!(highest_placeholder(&dialect.select_many(DEFAULT_TABLE)), 1);
        assert_eq!(highest_placeholder(&dialect.upsert(DEFAULT_TABLE)), 3);
        assert_eq!(highest_placeholder(&dialect.update_if_etag(DEFAULT_TABLE)), 4);
        assert_eq!(highest_placeholder(&dialect.delete_many(DEFAULT_TABLE)), 1);
        assert!(dialect.create_table(DEFAULT_TABLE).contains("data JSONB"));
    }

    #[test]
    fn conditional_update_matches_on_id_and_expected_etag() {
        let sql = SqlDialect::Postgres.update_if_etag("state");
        assert!(sql.starts_with("UPDATE state SET data = $2, etag = $3"));
        assert!(sql.ends_with("WHERE id = $1 AND etag = $4"));
    }
}
