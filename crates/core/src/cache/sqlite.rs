//! SQLite backing store for the response cache.
//!
//! The schema version lives in `PRAGMA user_version`. Each pending script
//! commits together with its version bump, so a crash mid-upgrade leaves the
//! previous version intact and the script is retried on the next open.

use std::path::Path;

use tokio_rusqlite::Connection;

use crate::Error;

const PRAGMAS: &str = "PRAGMA journal_mode=WAL;
     PRAGMA synchronous=NORMAL;
     PRAGMA temp_store=MEMORY;";

/// Schema scripts; script `i` upgrades the store to version `i + 1`.
const SCHEMA: &[&str] = &[include_str!("../../migrations/001_kv_cache.sql")];

/// Handle to the SQLite key-value cache.
///
/// Database work runs on tokio-rusqlite's background thread.
#[derive(Clone, Debug)]
pub struct CacheDb {
    pub(crate) conn: Connection,
}

impl CacheDb {
    /// Open (or create) the cache file and bring its schema up to date.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be opened, a schema script fails, or the
    /// file was written by a newer schema than this build knows.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let conn = Connection::open(path).await.map_err(|e| Error::Database(e.into()))?;
        Self::prepare(conn).await
    }

    pub async fn open_in_memory() -> Result<Self, Error> {
        let conn = Connection::open_in_memory().await.map_err(|e| Error::Database(e.into()))?;
        Self::prepare(conn).await
    }

    /// Current schema version of the open store.
    pub async fn schema_version(&self) -> Result<i64, Error> {
        self.conn
            .call(|conn| conn.pragma_query_value(None, "user_version", |row| row.get::<_, i64>(0)))
            .await
            .map_err(Error::from)
    }

    async fn prepare(conn: Connection) -> Result<Self, Error> {
        let applied = conn
            .call(|conn| -> Result<i64, Error> {
                conn.execute_batch(PRAGMAS)?;
                upgrade(conn)
            })
            .await
            .map_err(Error::from)?;

        if applied > 0 {
            tracing::debug!("cache schema upgraded by {} step(s) to version {}", applied, SCHEMA.len());
        }

        Ok(Self { conn })
    }
}

/// Apply every script past the stored version. Returns how many ran.
fn upgrade(conn: &mut tokio_rusqlite::rusqlite::Connection) -> Result<i64, Error> {
    let latest = SCHEMA.len() as i64;
    let current: i64 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

    if current > latest {
        return Err(Error::MigrationFailed(format!(
            "cache schema version {current} is newer than this build supports ({latest})"
        )));
    }

    for (version, script) in (current + 1..=latest).zip(SCHEMA.iter().skip(current as usize)) {
        let tx = conn.transaction()?;
        tx.execute_batch(script)
            .map_err(|e| Error::MigrationFailed(format!("schema version {version}: {e}")))?;
        tx.pragma_update(None, "user_version", version)?;
        tx.commit()?;
    }

    Ok(latest - current)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn table_exists(db: &CacheDb, name: &'static str) -> bool {
        db.conn
            .call(move |conn| {
                conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name=?1)",
                    [name],
                    |row| row.get(0),
                )
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_open_in_memory_creates_schema() {
        let db = CacheDb::open_in_memory().await.unwrap();
        assert!(table_exists(&db, "kv_cache").await);
        assert_eq!(db.schema_version().await.unwrap(), SCHEMA.len() as i64);
    }

    #[tokio::test]
    async fn test_prepare_is_idempotent() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.put_entry("k", "v", 60).await.unwrap();

        let reopened = CacheDb::prepare(db.conn.clone()).await.unwrap();
        assert_eq!(reopened.schema_version().await.unwrap(), SCHEMA.len() as i64);
        assert_eq!(reopened.get_entry("k").await.unwrap().as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn test_newer_schema_is_refused() {
        let conn = Connection::open_in_memory().await.unwrap();
        conn.call(|conn| conn.pragma_update(None, "user_version", 99_i64)).await.unwrap();

        let err = CacheDb::prepare(conn).await.unwrap_err();
        assert!(matches!(err, Error::MigrationFailed(_)));
        assert_eq!(err.status_code(), 500);
    }

    #[tokio::test]
    async fn test_failed_upgrade_leaves_version_untouched() {
        let conn = Connection::open_in_memory().await.unwrap();
        // A view cannot be indexed, so the first script fails part-way.
        conn.call(|conn| conn.execute_batch("CREATE VIEW kv_cache AS SELECT 1 AS key;")).await.unwrap();

        let err = CacheDb::prepare(conn.clone()).await.unwrap_err();
        assert!(matches!(err, Error::MigrationFailed(_)));

        let version: i64 =
            conn.call(|conn| conn.pragma_query_value(None, "user_version", |row| row.get(0))).await.unwrap();
        assert_eq!(version, 0);
    }
}
