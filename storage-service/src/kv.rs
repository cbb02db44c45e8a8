//! Key-value store accessor.
//!
//! Thin passthrough over redis. Listing exposes the underlying SCAN cursor
//! so callers can page through large keyspaces; values are opportunistically
//! parsed as JSON, falling back to the raw string.

use common::errors::AppResult;
use redis::aio::ConnectionManager;
use serde_json::Value;

/// One page of keys from a cursor scan.
#[derive(Debug)]
pub struct KeyPage {
    /// Keys returned by this scan step.
    pub keys: Vec<String>,
    /// Cursor to pass to the next call; 0 means the scan is complete.
    pub cursor: u64,
}

impl KeyPage {
    /// True when the scan has covered the whole keyspace.
    pub fn complete(&self) -> bool {
        self.cursor == 0
    }
}

/// Redis-backed key-value accessor.
pub struct KvStore {
    conn: ConnectionManager,
}

impl KvStore {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }

    /// One SCAN step from `cursor`, hinting `count` keys per step.
    pub async fn list_keys(&self, cursor: u64, count: u32) -> AppResult<KeyPage> {
        let mut conn = self.conn.clone();
        let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
            .arg(cursor)
            .arg("COUNT")
            .arg(count)
            .query_async(&mut conn)
            .await?;
        Ok(KeyPage { keys, cursor: next })
    }

    /// Fetches the raw string value for `key`, or `None` when absent.
    pub async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = redis::cmd("GET")
            .arg(key)
            .query_async(&mut conn)
            .await?;
        Ok(value)
    }
}

/// Parses a stored value as JSON when possible.
///
/// Returns the parsed document and `true`, or the raw string and `false`.
pub fn parse_value(raw: String) -> (Value, bool) {
    match serde_json::from_str::<Value>(&raw) {
        Ok(parsed) => (parsed, true),
        Err(_) => (Value::String(raw), false),
    }
}
