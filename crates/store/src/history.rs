//! Read-only access to the remote notification-interaction history.
//! The engine never writes here; delivery receipts are recorded upstream.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use clickhouse::Row;
use notify_core::config::ClickHouseConfig;
use notify_core::types::{InteractionRecord, NotificationKind};
use notify_core::{NotifyError, NotifyResult};
use serde::Deserialize;
use tracing::info;

/// Read-only interaction history, sortable newest-first and filterable by
/// kind and calendar day.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Up to `limit` most-recent rows for `user_id`, newest first.
    async fn recent_interactions(
        &self,
        user_id: &str,
        limit: usize,
    ) -> NotifyResult<Vec<InteractionRecord>>;

    /// Notifications of `kind` already sent to `user_id` on the calendar
    /// day (UTC) containing `now`.
    async fn sent_today(
        &self,
        user_id: &str,
        kind: NotificationKind,
        now: DateTime<Utc>,
    ) -> NotifyResult<u64>;
}

#[derive(Debug, Row, Deserialize)]
struct InteractionRow {
    kind: String,
    sent_at: u32,
    read_at: Option<u32>,
    clicked_at: Option<u32>,
    action_taken: u8,
}

fn timestamp(secs: u32) -> DateTime<Utc> {
    Utc.timestamp_opt(i64::from(secs), 0)
        .single()
        .unwrap_or_default()
}

impl From<InteractionRow> for InteractionRecord {
    fn from(row: InteractionRow) -> Self {
        Self {
            kind: NotificationKind::from_wire(&row.kind),
            sent_at: timestamp(row.sent_at),
            read_at: row.read_at.map(timestamp),
            clicked_at: row.clicked_at.map(timestamp),
            action_taken: row.action_taken != 0,
        }
    }
}

/// ClickHouse-backed history store over the app's interaction events table.
pub struct ClickHouseHistoryStore {
    client: clickhouse::Client,
    table: String,
}

impl ClickHouseHistoryStore {
    pub fn new(config: &ClickHouseConfig) -> Self {
        let client = clickhouse::Client::default()
            .with_url(&config.url)
            .with_database(&config.database);
        info!(url = %config.url, database = %config.database, "ClickHouse history store ready");
        Self {
            client,
            table: config.history_table.clone(),
        }
    }
}

#[async_trait]
impl HistoryStore for ClickHouseHistoryStore {
    async fn recent_interactions(
        &self,
        user_id: &str,
        limit: usize,
    ) -> NotifyResult<Vec<InteractionRecord>> {
        let rows = self
            .client
            .query(&format!(
                "SELECT kind, toUnixTimestamp(sent_at) AS sent_at, \
                 toUnixTimestamp(read_at) AS read_at, \
                 toUnixTimestamp(clicked_at) AS clicked_at, \
                 action_taken \
                 FROM {} WHERE user_id = ? ORDER BY sent_at DESC LIMIT ?",
                self.table
            ))
            .bind(user_id)
            .bind(limit as u64)
            .fetch_all::<InteractionRow>()
            .await
            .map_err(|e| NotifyError::History(e.to_string()))?;

        Ok(rows.into_iter().map(InteractionRecord::from).collect())
    }

    async fn sent_today(
        &self,
        user_id: &str,
        kind: NotificationKind,
        now: DateTime<Utc>,
    ) -> NotifyResult<u64> {
        let day = now.date_naive();
        self.client
            .query(&format!(
                "SELECT count() FROM {} WHERE user_id = ? AND kind = ? AND toDate(sent_at) = ?",
                self.table
            ))
            .bind(user_id)
            .bind(kind.as_str())
            .bind(day.to_string())
            .fetch_one::<u64>()
            .await
            .map_err(|e| NotifyError::History(e.to_string()))
    }
}
