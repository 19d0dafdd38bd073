//! Key-value persistence for result documents.
//!
//! Every document is a JSON value stored under a string key. Backends only
//! move strings; (de)serialization happens in [`load`] and [`save`].

use serde::de::DeserializeOwned;
use serde::Serialize;

pub mod memory;
pub mod schema;
pub mod sqlite;

pub use memory::MemoryKv;
pub use sqlite::SqliteKv;

/// Key holding the array of every `ResultMeta`.
pub const META_KEY: &str = "calcResultsMeta";
/// Prefix of the per-result line documents.
pub const LINES_KEY_PREFIX: &str = "calcResultsLines:";

pub fn lines_key(result_id: i64) -> String {
    format!("{}{}", LINES_KEY_PREFIX, result_id)
}

pub trait KvStore: Send + Sync {
    fn get_item(&self, key: &str) -> anyhow::Result<Option<String>>;
    fn set_item(&self, key: &str, value: &str) -> anyhow::Result<()>;
}

impl<T: KvStore + ?Sized> KvStore for &T {
    fn get_item(&self, key: &str) -> anyhow::Result<Option<String>> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> anyhow::Result<()> {
        (**self).set_item(key, value)
    }
}

/// Reads and parses `key`, falling back on a missing key, a failed read,
/// unparseable data or a stored `null`. Never fails.
pub fn load<S, T>(store: &S, key: &str, fallback: T) -> T
where
    S: KvStore + ?Sized,
    T: DeserializeOwned,
{
    let raw = match store.get_item(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return fallback,
        Err(e) => {
            tracing::warn!(event = "kv.read_failed", key, error = %e, "using fallback");
            return fallback;
        }
    };

    match serde_json::from_str::<Option<T>>(&raw) {
        Ok(Some(v)) => v,
        Ok(None) => fallback,
        Err(e) => {
            tracing::warn!(event = "kv.corrupt_value", key, error = %e, "using fallback");
            fallback
        }
    }
}

/// Serializes `value` and overwrites whatever was stored under `key`.
pub fn save<S, T>(store: &S, key: &str, value: &T) -> anyhow::Result<()>
where
    S: KvStore + ?Sized,
    T: Serialize + ?Sized,
{
    let raw = serde_json::to_string(value)?;
    tracing::debug!(event = "kv.write", key, bytes = raw.len());
    store.set_item(key, &raw)
}
