use super::KvStore;
use anyhow::Context;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// File-backed key-value store (one `kv` table).
#[derive(Clone)]
pub struct SqliteKv {
    pub conn: Arc<Mutex<Connection>>,
}

pub struct KvStats {
    pub keys: Option<u64>,
    pub bytes: Option<u64>,
    pub last_write_at: Option<String>,
    pub version: Option<String>,
}

impl SqliteKv {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open sqlite db {}", path.display()))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn memory() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory().context("failed to open in-memory sqlite db")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn init_schema(&self) -> anyhow::Result<()> {
        let conn = self.lock()?;
        conn.execute_batch(super::schema::DDL)?;
        conn.pragma_update(None, "user_version", super::schema::SCHEMA_VERSION)?;
        Ok(())
    }

    fn lock(&self) -> anyhow::Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow::anyhow!("sqlite connection lock poisoned"))
    }

    /// Keys starting with `prefix`, sorted.
    pub fn keys(&self, prefix: &str) -> anyhow::Result<Vec<String>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT key FROM kv WHERE substr(key, 1, ?2) = ?1 ORDER BY key")?;
        let rows = stmt.query_map(params![prefix, prefix.chars().count() as i64], |row| {
            row.get::<_, String>(0)
        })?;

        let mut out = Vec::new();
        for r in rows {
            out.push(r?);
        }
        Ok(out)
    }

    pub fn stats_best_effort(&self) -> anyhow::Result<KvStats> {
        let conn = self.lock()?;

        let keys: Option<u64> = conn
            .query_row("SELECT COUNT(*) FROM kv", [], |r| {
                r.get::<_, i64>(0).map(|x| x as u64)
            })
            .ok();
        let bytes: Option<u64> = conn
            .query_row("SELECT COALESCE(SUM(length(value)), 0) FROM kv", [], |r| {
                r.get::<_, i64>(0).map(|x| x as u64)
            })
            .ok();
        let last_write_at: Option<String> = conn
            .query_row("SELECT MAX(updated_at) FROM kv", [], |r| {
                r.get::<_, Option<String>>(0)
            })
            .ok()
            .flatten();
        let version: Option<String> = conn
            .query_row("PRAGMA user_version", [], |r| r.get(0))
            .ok()
            .map(|v: i64| v.to_string());

        Ok(KvStats {
            keys,
            bytes,
            last_write_at,
            version,
        })
    }
}

impl KvStore for SqliteKv {
    fn get_item(&self, key: &str) -> anyhow::Result<Option<String>> {
        let conn = self.lock()?;
        let value = conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()
            .with_context(|| format!("failed to read key {}", key))?;
        Ok(value)
    }

    fn set_item(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let conn = self.lock()?;
        let updated_at = chrono::Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO kv(key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET
                value=excluded.value,
                updated_at=excluded.updated_at",
            params![key, value, updated_at],
        )
        .with_context(|| format!("failed to write key {}", key))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_overwrites() {
        let kv = SqliteKv::memory().unwrap();
        kv.init_schema().unwrap();

        assert_eq!(kv.get_item("a").unwrap(), None);
        kv.set_item("a", "1").unwrap();
        kv.set_item("a", "2").unwrap();
        assert_eq!(kv.get_item("a").unwrap().as_deref(), Some("2"));

        let stats = kv.stats_best_effort().unwrap();
        assert_eq!(stats.keys, Some(1));
        assert_eq!(stats.bytes, Some(1));
        assert_eq!(stats.version.as_deref(), Some("1"));
    }

    #[test]
    fn test_keys_by_prefix() {
        let kv = SqliteKv::memory().unwrap();
        kv.init_schema().unwrap();
        kv.set_item("calcResultsMeta", "[]").unwrap();
        kv.set_item("calcResultsLines:700000002", "[]").unwrap();
        kv.set_item("calcResultsLines:700000001", "[]").unwrap();

        let keys = kv.keys("calcResultsLines:").unwrap();
        assert_eq!(
            keys,
            vec!["calcResultsLines:700000001", "calcResultsLines:700000002"]
        );
    }

    #[test]
    fn test_get_without_schema_is_an_error() {
        let kv = SqliteKv::memory().unwrap();
        assert!(kv.get_item("a").is_err());
    }
}
