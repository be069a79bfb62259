//! In-memory doubles for resolver and router tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use scout_core::{AppConfig, Error, KvStore};

pub(crate) use scout_client::testing::{FakeTransport, Reply};

/// Defaults with the private-address guard off (tests never resolve DNS).
pub(crate) fn test_config() -> AppConfig {
    AppConfig { block_private_targets: false, ..AppConfig::default() }
}

pub(crate) fn config_with_key() -> AppConfig {
    AppConfig { google_api_key: Some("test-key".into()), ..test_config() }
}

/// HashMap-backed store with switchable failures.
#[derive(Default)]
pub(crate) struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
    puts: AtomicUsize,
    ttls: Mutex<Vec<i64>>,
    fail_reads: bool,
    fail_writes: bool,
}

impl MemoryStore {
    pub(crate) fn failing_reads() -> Self {
        Self { fail_reads: true, ..Self::default() }
    }

    pub(crate) fn failing_writes() -> Self {
        Self { fail_writes: true, ..Self::default() }
    }

    /// Number of write attempts, failed ones included.
    pub(crate) fn puts(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    /// TTL passed with each write attempt, in order.
    pub(crate) fn ttls(&self) -> Vec<i64> {
        self.ttls.lock().unwrap().clone()
    }

    pub(crate) fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.lock().unwrap().keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, Error> {
        if self.fail_reads {
            return Err(Error::Store("read refused".into()));
        }
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    async fn put(&self, key: &str, value: &str, ttl_seconds: i64) -> Result<(), Error> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.ttls.lock().unwrap().push(ttl_seconds);
        if self.fail_writes {
            return Err(Error::Store("write refused".into()));
        }
        self.entries.lock().unwrap().insert(key.to_string(), value.to_string());
        Ok(())
    }
}
