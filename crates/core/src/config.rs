use serde::Deserialize;

/// Root engine configuration. Loaded from environment variables with the
/// prefix `NOTIFY__`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub redis: RedisConfig,
    #[serde(default)]
    pub clickhouse: ClickHouseConfig,
    #[serde(default)]
    pub engine: EngineConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    #[serde(default = "default_redis_urls")]
    pub urls: Vec<String>,
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClickHouseConfig {
    #[serde(default = "default_clickhouse_url")]
    pub url: String,
    #[serde(default = "default_clickhouse_db")]
    pub database: String,
    #[serde(default = "default_history_table")]
    pub history_table: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Most-recent history rows considered by behavior analysis.
    #[serde(default = "default_analysis_history_limit")]
    pub analysis_history_limit: usize,
    /// Most-recent history rows considered by insights generation.
    #[serde(default = "default_insights_history_limit")]
    pub insights_history_limit: usize,
    #[serde(default = "default_time_zone")]
    pub time_zone: String,
}

// Default functions
fn default_redis_urls() -> Vec<String> {
    vec!["redis://localhost:6379".to_string()]
}
fn default_ttl_secs() -> u64 {
    86_400
}
fn default_connect_timeout_ms() -> u64 {
    5000
}
fn default_clickhouse_url() -> String {
    "http://localhost:8123".to_string()
}
fn default_clickhouse_db() -> String {
    "lumen".to_string()
}
fn default_history_table() -> String {
    "notification_interactions".to_string()
}
fn default_analysis_history_limit() -> usize {
    500
}
fn default_insights_history_limit() -> usize {
    200
}
fn default_time_zone() -> String {
    "UTC".to_string()
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            urls: default_redis_urls(),
            ttl_secs: default_ttl_secs(),
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }
}

impl Default for ClickHouseConfig {
    fn default() -> Self {
        Self {
            url: default_clickhouse_url(),
            database: default_clickhouse_db(),
            history_table: default_history_table(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            analysis_history_limit: default_analysis_history_limit(),
            insights_history_limit: default_insights_history_limit(),
            time_zone: default_time_zone(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            redis: RedisConfig::default(),
            clickhouse: ClickHouseConfig::default(),
            engine: EngineConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder().add_source(
            config::Environment::with_prefix("NOTIFY")
                .separator("__")
                .try_parsing(true)
                .list_separator(","),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }
}
