use crate::models::UrlMapping;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("short id already exists")]
    Conflict,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Seconds in the rolling windows reported by the info endpoint.
pub const DAY_SECS: i64 = 60 * 60 * 24;
pub const WEEK_SECS: i64 = DAY_SECS * 7;

/// Window value meaning "no lower bound".
pub const ALL_TIME: i64 = -1;

/// Lower bound (exclusive) of a visit window ending at `now`.
///
/// Non-positive windows count from the epoch.
pub fn window_start(now: i64, window_secs: i64) -> i64 {
    if window_secs > 0 {
        now - window_secs
    } else {
        0
    }
}

pub fn unix_now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Mapping store plus append-only visit log.
///
/// Every method either returns a well-formed result or a `StorageError`;
/// partial results are never returned.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Create tables and indexes if they are absent. Idempotent.
    async fn init(&self) -> StorageResult<()>;

    /// True iff a mapping exists for `short_id`.
    async fn exists(&self, short_id: &str) -> StorageResult<bool>;

    /// Insert a new mapping.
    ///
    /// Returns `StorageError::Conflict` when the backend's uniqueness
    /// constraint rejects the id. Callers are expected to have checked
    /// `exists` first; the window between the two calls is not atomic.
    async fn insert_mapping(&self, short_id: &str, long_url: &str) -> StorageResult<()>;

    /// The long URL for `short_id`, taking the earliest row if duplicates exist.
    async fn lookup(&self, short_id: &str) -> StorageResult<Option<String>>;

    /// Append a visit event with an explicit timestamp (seconds since epoch).
    async fn record_visit_at(&self, short_id: &str, visited_at: i64) -> StorageResult<()>;

    /// Count visit events with a timestamp strictly greater than `since`.
    async fn count_visits_after(&self, short_id: &str, since: i64) -> StorageResult<i64>;

    /// Mappings in insertion order.
    async fn list_mappings(&self, limit: i64, offset: i64) -> StorageResult<Vec<UrlMapping>>;

    /// Append a visit event stamped with the current time.
    async fn record_visit(&self, short_id: &str) -> StorageResult<()> {
        self.record_visit_at(short_id, unix_now()).await
    }

    /// Count visits newer than `now - window_secs`; non-positive windows count all time.
    async fn count_visits_since(&self, short_id: &str, window_secs: i64) -> StorageResult<i64> {
        self.count_visits_after(short_id, window_start(unix_now(), window_secs))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_start_positive_window() {
        assert_eq!(window_start(1_000_000, DAY_SECS), 1_000_000 - 86_400);
        assert_eq!(window_start(1_000_000, WEEK_SECS), 1_000_000 - 604_800);
    }

    #[test]
    fn test_window_start_non_positive_means_all_time() {
        assert_eq!(window_start(1_000_000, ALL_TIME), 0);
        assert_eq!(window_start(1_000_000, 0), 0);
        assert_eq!(window_start(1_000_000, -42), 0);
    }
}
