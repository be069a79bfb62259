//! Key-value response cache.
//!
//! This module provides:
//!
//! - The `KvStore` seam the resolver depends on
//! - A SQLite implementation (tokio-rusqlite) with versioned schema upgrades
//! - Deterministic cache keys derived from request intents
//! - The `ResponseCache` facade with detached, best-effort writes

pub mod entries;
pub mod facade;
pub mod key;
pub mod sqlite;

use async_trait::async_trait;

pub use crate::Error;

pub use sqlite::CacheDb;
pub use facade::ResponseCache;
pub use key::cache_key;

/// Async key-value store with per-entry expiry.
///
/// Implementations provide atomic get/put per key; expiry is the store's
/// responsibility and is never read back by callers.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Fetch a live value.
    async fn get(&self, key: &str) -> Result<Option<String>, Error>;

    /// Write a value that expires after `ttl_seconds`.
    async fn put(&self, key: &str, value: &str, ttl_seconds: i64) -> Result<(), Error>;
}
