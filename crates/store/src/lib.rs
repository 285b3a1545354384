//! Storage seams for the notification engine: read-only interaction
//! history, a best-effort durable key-value cache, and the per-user
//! profile store layered on top.

pub mod history;
pub mod kv;
pub mod memory;
pub mod profile;

pub use history::{ClickHouseHistoryStore, HistoryStore};
pub use kv::{KeyValueStore, RedisKvStore};
pub use memory::{MemoryHistoryStore, MemoryKvStore};
pub use profile::ProfileStore;
