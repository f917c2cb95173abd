//! In-memory cache for upstream data
//!
//! Provides a single-flight TTL cache shared by every data adapter, so that
//! spreadsheet extraction, database aggregation and AI calls run at most
//! once per key and lifetime. Nothing is persisted; a restart starts cold.

pub mod key;
pub mod manager;
pub mod ttl;

// Re-export main types
pub use key::{cache_key, prompt_key};
pub use manager::{Cache, CacheStats, EntryInfo, GetOptions};
pub use ttl::{CacheTtl, DemoMode, TtlCategory, TtlPolicy};
