use crate::models::UrlMapping;
use crate::storage::{Storage, StorageError, StorageResult};
use anyhow::Result;
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::sync::Arc;

pub struct SqliteStorage {
    pool: Arc<SqlitePool>,
}

impl SqliteStorage {
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;
        Ok(Self {
            pool: Arc::new(pool),
        })
    }
}

#[async_trait]
impl Storage for SqliteStorage {
    async fn init(&self) -> StorageResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS urlmap (
                id INTEGER PRIMARY KEY,
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
                id INTEGER PRIMARY KEY,
                shorturlid TEXT NOT NULL,
                visited INTEGER NOT NULL
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
            "SELECT COUNT(1) FROM urlmap WHERE shorturlid = ?",
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
            VALUES (?, ?)
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
            WHERE shorturlid = ?
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
        sqlx::query("INSERT INTO history (shorturlid, visited) VALUES (?, ?)")
            .bind(short_id)
            .bind(visited_at)
            .execute(self.pool.as_ref())
            .await?;

        Ok(())
    }

    async fn count_visits_after(&self, short_id: &str, since: i64) -> StorageResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(1) FROM history WHERE shorturlid = ? AND visited > ?",
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
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(mappings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup() -> SqliteStorage {
        let storage = SqliteStorage::new("sqlite::memory:", 1).await.unwrap();
        storage.init().await.unwrap();
        storage
    }

    #[tokio::test]
    async fn test_init_is_idempotent() {
        let storage = setup().await;
        storage.init().await.unwrap();
        storage.init().await.unwrap();
        assert!(!storage.exists("abc1234").await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_insert_reports_conflict() {
        let storage = setup().await;
        storage
            .insert_mapping("abc1234", "https://example.com/a")
            .await
            .unwrap();

        let err = storage
            .insert_mapping("abc1234", "https://example.com/b")
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Conflict));

        assert_eq!(
            storage.lookup("abc1234").await.unwrap().as_deref(),
            Some("https://example.com/a")
        );
    }

    #[tokio::test]
    async fn test_lookup_takes_first_row_on_legacy_duplicates() {
        // Databases created before the UNIQUE constraint may hold duplicates.
        let storage = SqliteStorage::new("sqlite::memory:", 1).await.unwrap();
        sqlx::query("CREATE TABLE urlmap (id INTEGER PRIMARY KEY, shorturlid TEXT, longurl TEXT)")
            .execute(storage.pool.as_ref())
            .await
            .unwrap();
        storage.init().await.unwrap();

        storage.insert_mapping("dup0001", "https://first.example").await.unwrap();
        storage.insert_mapping("dup0001", "https://second.example").await.unwrap();

        assert_eq!(
            storage.lookup("dup0001").await.unwrap().as_deref(),
            Some("https://first.example")
        );
    }

    #[tokio::test]
    async fn test_storage_error_after_pool_close() {
        let storage = setup().await;
        storage.pool.close().await;

        let err = storage.exists("abc1234").await.unwrap_err();
        assert!(matches!(err, StorageError::Database(_)));
        assert!(storage.count_visits_after("abc1234", 0).await.is_err());
    }
}
