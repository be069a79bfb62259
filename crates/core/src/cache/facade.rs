//! Typed cache facade used by the resolver.
//!
//! Reads are awaited and store errors propagate. Writes are detached onto a
//! task tracker: a failed write is logged and never reaches the response.

use std::sync::Arc;

use tokio_util::task::TaskTracker;

use super::KvStore;
use crate::Error;

/// Response cache over an arbitrary key-value store.
#[derive(Clone)]
pub struct ResponseCache {
    store: Arc<dyn KvStore>,
    ttl_seconds: i64,
    writes: TaskTracker,
}

impl ResponseCache {
    pub fn new(store: Arc<dyn KvStore>, ttl_seconds: i64) -> Self {
        Self { store, ttl_seconds, writes: TaskTracker::new() }
    }

    /// Look up a cached body. An empty body reads as a miss.
    ///
    /// # Errors
    ///
    /// Store-level failures propagate instead of reading as a miss, so a
    /// broken store never silently re-charges the upstream.
    pub async fn lookup(&self, key: &str) -> Result<Option<String>, Error> {
        let hit = self.store.get(key).await.inspect_err(|e| {
            tracing::error!("cache read failed for {}: {}", key, e);
        })?;
        let hit = hit.filter(|body| !body.is_empty());

        if hit.is_some() {
            tracing::info!("serving from cache: {}", key);
        } else {
            tracing::debug!("cache miss: {}", key);
        }

        Ok(hit)
    }

    /// Populate the cache without blocking the caller.
    pub fn store(&self, key: String, value: String) {
        let store = Arc::clone(&self.store);
        let ttl = self.ttl_seconds;
        self.writes.spawn(async move {
            match store.put(&key, &value, ttl).await {
                Ok(()) => tracing::debug!("cached {} ({} bytes, ttl {}s)", key, value.len(), ttl),
                Err(e) => tracing::warn!("cache write failed for {}: {}", key, e),
            }
        });
    }

    /// Number of writes still in flight.
    pub fn pending_writes(&self) -> usize {
        self.writes.len()
    }

    /// Wait for every write dispatched so far.
    ///
    /// Reopens the tracker afterwards, so it must not overlap `shutdown`.
    #[cfg(any(test, feature = "test-util"))]
    pub async fn flush(&self) {
        self.writes.close();
        self.writes.wait().await;
        self.writes.reopen();
    }

    /// Drain outstanding writes before the process exits.
    pub async fn shutdown(&self) {
        let pending = self.writes.len();
        if pending > 0 {
            tracing::info!("waiting for {} pending cache writes", pending);
        }
        self.writes.close();
        self.writes.wait().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheDb;
    use async_trait::async_trait;

    struct BrokenStore;

    #[async_trait]
    impl KvStore for BrokenStore {
        async fn get(&self, _key: &str) -> Result<Option<String>, Error> {
            Err(Error::Store("store offline".into()))
        }

        async fn put(&self, _key: &str, _value: &str, _ttl_seconds: i64) -> Result<(), Error> {
            Err(Error::Store("store offline".into()))
        }
    }

    #[tokio::test]
    async fn test_store_then_lookup() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let cache = ResponseCache::new(Arc::new(db), 86_400);

        cache.store("search:cats:web:1".into(), "[]".into());
        cache.flush().await;

        assert_eq!(cache.lookup("search:cats:web:1").await.unwrap().as_deref(), Some("[]"));
        assert_eq!(cache.pending_writes(), 0);
    }

    #[tokio::test]
    async fn test_lookup_miss() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let cache = ResponseCache::new(Arc::new(db), 86_400);
        assert!(cache.lookup("absent").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_empty_body_is_a_miss() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.put_entry("cache:https://example.com/", "", 3600).await.unwrap();

        let cache = ResponseCache::new(Arc::new(db), 86_400);
        assert!(cache.lookup("cache:https://example.com/").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_writes_carry_configured_ttl() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let cache = ResponseCache::new(Arc::new(db.clone()), 86_400);

        cache.store("k".into(), "v".into());
        cache.flush().await;

        let ttl: i64 = db
            .conn
            .call(|conn| {
                conn.query_row("SELECT expires_at - stored_at FROM kv_cache WHERE key = 'k'", [], |row| row.get(0))
            })
            .await
            .unwrap();
        assert_eq!(ttl, 86_400);
    }

    #[tokio::test]
    async fn test_read_error_propagates() {
        let cache = ResponseCache::new(Arc::new(BrokenStore), 86_400);
        let err = cache.lookup("k").await.unwrap_err();
        assert_eq!(err.status_code(), 500);
    }

    #[tokio::test]
    async fn test_write_error_is_swallowed() {
        let cache = ResponseCache::new(Arc::new(BrokenStore), 86_400);
        cache.store("k".into(), "v".into());
        cache.flush().await;
        assert_eq!(cache.pending_writes(), 0);
    }

    #[tokio::test]
    async fn test_flush_keeps_cache_usable() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let cache = ResponseCache::new(Arc::new(db), 60);
        cache.flush().await;

        cache.store("a".into(), "1".into());
        cache.shutdown().await;
        assert_eq!(cache.lookup("a").await.unwrap().as_deref(), Some("1"));
    }
}
