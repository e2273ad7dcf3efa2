//! Process-lifetime storage backend
//!
//! Selected with `DATABASE_BACKEND=memory`. Nothing is persisted: every
//! mapping and visit is lost when the process exits. Useful for local
//! development and tests.

use crate::models::{UrlMapping, VisitEvent};
use crate::storage::{Storage, StorageError, StorageResult};
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

struct StoredMapping {
    seq: u64,
    long_url: String,
}

#[derive(Default)]
pub struct MemoryStorage {
    mappings: DashMap<String, StoredMapping>,
    history: DashMap<String, Vec<VisitEvent>>,
    next_seq: AtomicU64,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn init(&self) -> StorageResult<()> {
        Ok(())
    }

    async fn exists(&self, short_id: &str) -> StorageResult<bool> {
        Ok(self.mappings.contains_key(short_id))
    }

    async fn insert_mapping(&self, short_id: &str, long_url: &str) -> StorageResult<()> {
        match self.mappings.entry(short_id.to_string()) {
            Entry::Occupied(_) => Err(StorageError::Conflict),
            Entry::Vacant(slot) => {
                slot.insert(StoredMapping {
                    seq: self.next_seq.fetch_add(1, Ordering::Relaxed),
                    long_url: long_url.to_string(),
                });
                Ok(())
            }
        }
    }

    async fn lookup(&self, short_id: &str) -> StorageResult<Option<String>> {
        Ok(self
            .mappings
            .get(short_id)
            .map(|entry| entry.long_url.clone()))
    }

    async fn record_visit_at(&self, short_id: &str, visited_at: i64) -> StorageResult<()> {
        self.history
            .entry(short_id.to_string())
            .or_default()
            .push(VisitEvent {
                short_id: short_id.to_string(),
                timestamp: visited_at,
            });
        Ok(())
    }

    async fn count_visits_after(&self, short_id: &str, since: i64) -> StorageResult<i64> {
        let count = self
            .history
            .get(short_id)
            .map(|events| events.iter().filter(|e| e.timestamp > since).count())
            .unwrap_or(0);
        Ok(count as i64)
    }

    async fn list_mappings(&self, limit: i64, offset: i64) -> StorageResult<Vec<UrlMapping>> {
        let mut rows: Vec<(u64, UrlMapping)> = self
            .mappings
            .iter()
            .map(|entry| {
                (
                    entry.seq,
                    UrlMapping {
                        short_id: entry.key().clone(),
                        long_url: entry.long_url.clone(),
                    },
                )
            })
            .collect();
        rows.sort_by_key(|(seq, _)| *seq);

        Ok(rows
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .map(|(_, mapping)| mapping)
            .collect())
    }
}
