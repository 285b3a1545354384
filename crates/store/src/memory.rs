//! In-memory store implementations for tests and local development.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use notify_core::types::{InteractionRecord, NotificationKind};
use notify_core::NotifyResult;

use crate::history::HistoryStore;
use crate::kv::KeyValueStore;

/// History store holding rows in memory, per user.
#[derive(Default)]
pub struct MemoryHistoryStore {
    rows: DashMap<String, Vec<InteractionRecord>>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, user_id: &str, record: InteractionRecord) {
        self.rows
            .entry(user_id.to_string())
            .or_default()
            .push(record);
    }
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
    async fn recent_interactions(
        &self,
        user_id: &str,
        limit: usize,
    ) -> NotifyResult<Vec<InteractionRecord>> {
        let mut rows = self
            .rows
            .get(user_id)
            .map(|r| r.clone())
            .unwrap_or_default();
        rows.sort_by(|a, b| b.sent_at.cmp(&a.sent_at));
        rows.truncate(limit);
        Ok(rows)
    }

    async fn sent_today(
        &self,
        user_id: &str,
        kind: NotificationKind,
        now: DateTime<Utc>,
    ) -> NotifyResult<u64> {
        let day = now.date_naive();
        Ok(self
            .rows
            .get(user_id)
            .map(|rows| {
                rows.iter()
                    .filter(|r| r.kind == kind && r.sent_at.date_naive() == day)
                    .count() as u64
            })
            .unwrap_or(0))
    }
}

/// Key-value store holding blobs in memory.
#[derive(Default)]
pub struct MemoryKvStore {
    entries: DashMap<String, String>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryKvStore {
    async fn get(&self, key: &str) -> NotifyResult<Option<String>> {
        Ok(self.entries.get(key).map(|v| v.clone()))
    }

    async fn set(&self, key: &str, value: &str) -> NotifyResult<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
