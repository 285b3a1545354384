//! Durable key-value blob cache. Best-effort by contract: callers log
//! failures and continue with in-memory state.

use async_trait::async_trait;
use notify_core::config::RedisConfig;
use notify_core::{NotifyError, NotifyResult};
use redis::AsyncCommands;
use tracing::info;

/// String-keyed blob storage, namespaced per user and data kind.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> NotifyResult<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> NotifyResult<()>;
}

/// Redis-backed durable cache.
pub struct RedisKvStore {
    client: redis::Client,
    ttl_secs: u64,
}

impl RedisKvStore {
    /// Connect to Redis and verify connectivity.
    pub async fn new(config: &RedisConfig) -> anyhow::Result<Self> {
        let url = config
            .urls
            .first()
            .cloned()
            .unwrap_or_else(|| "redis://localhost:6379".to_string());

        info!(url = %url, "Connecting to Redis");

        let client = redis::Client::open(url.as_str())?;

        let mut conn = client.get_multiplexed_async_connection().await?;
        let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        info!(response = %pong, "Redis connection established");

        Ok(Self {
            client,
            ttl_secs: config.ttl_secs,
        })
    }
}

#[async_trait]
impl KeyValueStore for RedisKvStore {
    async fn get(&self, key: &str) -> NotifyResult<Option<String>> {
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| NotifyError::Cache(e.to_string()))?;
        let value: Option<String> = conn
            .get(key)
            .await
            .map_err(|e| NotifyError::Cache(e.to_string()))?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> NotifyResult<()> {
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| NotifyError::Cache(e.to_string()))?;
        conn.set_ex::<_, _, ()>(key, value, self.ttl_secs)
            .await
            .map_err(|e| NotifyError::Cache(e.to_string()))?;
        Ok(())
    }
}
