use crate::models::UrlMapping;
use crate::storage::{Storage, StorageError, StorageResult};
use anyhow::Result;
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;

pub struct PostgresStorage {
    pool: Arc<PgPool>,
}

impl PostgresStorage {
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self {
            pool: Arc::new(pool),
        })
    }
}

#[async_trait]
impl Storage for PostgresStorage {
    async fn init(&self) -> StorageResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS urlmap (
                id BIGSERIAL PRIMARY KEY,
                shorturlid TEXT NOT NULL UNIQUE,
                longurl TEXT NOT NULL
            )
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS history (
                id BIGSERIAL PRIMARY KEY,
                shorturlid TEXT NOT NULL,
                visited BIGINT NOT NULL
            )
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_history_shorturlid_visited ON history(shorturlid, visited)",
        )
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    async fn exists(&self, short_id: &str) -> StorageResult<bool> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(1) FROM urlmap WHERE shorturlid = $1",
        )
        .bind(short_id)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(count > 0)
    }

    async fn insert_mapping(&self, short_id: &str, long_url: &str) -> StorageResult<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO urlmap (shorturlid, longurl)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(short_id)
        .bind(long_url)
        .execute(self.pool.as_ref())
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::Conflict);
        }

        Ok(())
    }

    async fn lookup(&self, short_id: &str) -> StorageResult<Option<String>> {
        let long_url = sqlx::query_scalar::<_, String>(
            r#"
            SELECT longurl
            FROM urlmap
            WHERE shorturlid = $1
            ORDER BY id ASC
            LIMIT 1
            "#,
        )
        .bind(short_id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(long_url)
    }

    async fn record_visit_at(&self, short_id: &str, visited_at: i64) -> StorageResult<()> {
        sqlx::query("INSERT INTO history (shorturlid, visited) VALUES ($1, $2)")
            .bind(short_id)
            .bind(visited_at)
            .execute(self.pool.as_ref())
            .await?;

        Ok(())
    }

    async fn count_visits_after(&self, short_id: &str, since: i64) -> StorageResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(1) FROM history WHERE shorturlid = $1 AND visited > $2",
        )
        .bind(short_id)
        .bind(since)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(count)
    }

    async fn list_mappings(&self, limit: i64, offset: i64) -> StorageResult<Vec<UrlMapping>> {
        let mappings = sqlx::query_as::<_, UrlMapping>(
            r#"
            SELECT shorturlid AS short_id, longurl AS long_url
            FROM urlmap
            ORDER BY id ASC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(mappings)
    }
}
