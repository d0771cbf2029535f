//! The key-value store adapter.
//!
//! Values are JSON documents stored under string keys. Reads never fail: a
//! value that no longer decodes is deleted and the caller's default returned.
//! Writes are checked against the configured quota; on exhaustion one cleanup
//! pass (search history trimmed) is attempted before a single retry.

use chrono::Utc;
use rusqlite::{params, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};
use yearbook_shared::constants::{CLEANUP_SEARCH_HISTORY_KEEP, QUOTA_WARNING_THRESHOLD};

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::keys;

const USAGE_SQL: &str =
    "SELECT COALESCE(SUM(LENGTH(CAST(key AS BLOB)) + LENGTH(CAST(value AS BLOB))), 0) FROM kv";

/// Snapshot of how much of the quota is in use.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageUsage {
    pub used_bytes: u64,
    pub quota_bytes: u64,
    pub percent_used: f64,
}

impl StorageUsage {
    pub fn near_capacity(&self) -> bool {
        self.percent_used > QUOTA_WARNING_THRESHOLD * 100.0
    }
}

enum WriteFailure {
    Quota,
    Backend(rusqlite::Error),
}

impl Database {
    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// Read and decode `key`, falling back to `default` when it is missing or
    /// corrupt.
    pub fn get<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        self.get_opt(key).unwrap_or(default)
    }

    /// Read and decode `key`. A value that fails to decode is removed.
    pub fn get_opt<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.get_raw(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                error!(key, error = %e, "failed to read key");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, error = %e, "corrupt value, removing key");
                if let Err(e) = self.remove(key) {
                    error!(key, error = %e, "could not remove corrupt value");
                }
                None
            }
        }
    }

    /// The stored JSON text of `key`, undecoded.
    pub fn get_raw(&self, key: &str) -> Result<Option<String>> {
        let raw = self
            .conn()
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(raw)
    }

    pub fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        let mut stmt = self
            .conn()
            .prepare("SELECT key FROM kv WHERE substr(key, 1, length(?1)) = ?1 ORDER BY key")?;
        let rows = stmt.query_map(params![prefix], |row| row.get(0))?;
        rows.collect::<std::result::Result<Vec<String>, _>>()
            .map_err(StoreError::Sqlite)
    }

    pub fn usage(&self) -> Result<StorageUsage> {
        let used: i64 = self.conn().query_row(USAGE_SQL, [], |row| row.get(0))?;
        let used_bytes = used.max(0) as u64;
        let quota_bytes = self.config().quota_bytes;
        let percent_used = if quota_bytes == 0 {
            100.0
        } else {
            used_bytes as f64 / quota_bytes as f64 * 100.0
        };

        let usage = StorageUsage {
            used_bytes,
            quota_bytes,
            percent_used,
        };
        if usage.near_capacity() {
            warn!(percent_used, "storage quota warning");
        }
        Ok(usage)
    }

    // ------------------------------------------------------------------
    // Writes
    // ------------------------------------------------------------------

    /// Encode and store `value` under `key`.
    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let json = serde_json::to_string(value)?;
        self.put_raw(key, &json)
    }

    /// Store already-encoded text under `key`, with the same quota handling as
    /// [`Database::set`]. The text is not checked for being valid JSON.
    pub fn put_raw(&self, key: &str, json: &str) -> Result<()> {
        match self.write(key, json) {
            Ok(()) => Ok(()),
            Err(WriteFailure::Quota) => {
                warn!(key, "storage quota exceeded, cleaning up");
                if let Err(e) = self.cleanup_old_data() {
                    error!(error = %e, "cleanup failed");
                    return Err(StoreError::QuotaExceeded);
                }
                match self.write(key, json) {
                    Ok(()) => Ok(()),
                    Err(WriteFailure::Quota) => {
                        error!(key, "still over quota after cleanup");
                        Err(StoreError::QuotaExceeded)
                    }
                    Err(WriteFailure::Backend(e)) => {
                        error!(key, error = %e, "write failed");
                        Err(StoreError::Storage(e.to_string()))
                    }
                }
            }
            Err(WriteFailure::Backend(e)) => {
                error!(key, error = %e, "write failed");
                Err(StoreError::Storage(e.to_string()))
            }
        }
    }

    pub fn remove(&self, key: &str) -> Result<bool> {
        let affected = self
            .conn()
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(affected > 0)
    }

    fn write(&self, key: &str, json: &str) -> std::result::Result<(), WriteFailure> {
        let others: i64 = self
            .conn()
            .query_row(&format!("{USAGE_SQL} WHERE key <> ?1"), params![key], |row| {
                row.get(0)
            })
            .map_err(WriteFailure::Backend)?;

        let needed = others.max(0) as u64 + key.len() as u64 + json.len() as u64;
        if needed > self.config().quota_bytes {
            return Err(WriteFailure::Quota);
        }

        self.conn()
            .execute(
                "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                params![key, json, Utc::now().to_rfc3339()],
            )
            .map_err(WriteFailure::Backend)?;

        debug!(key, bytes = json.len(), "stored");
        Ok(())
    }

    /// Free space by keeping only the newest search history entries.
    /// Returns the number of entries dropped.
    fn cleanup_old_data(&self) -> Result<usize> {
        let mut history: Vec<serde_json::Value> = self.get(keys::SEARCH_HISTORY, Vec::new());
        if history.len() <= CLEANUP_SEARCH_HISTORY_KEEP {
            return Ok(0);
        }

        let dropped = history.len() - CLEANUP_SEARCH_HISTORY_KEEP;
        history.truncate(CLEANUP_SEARCH_HISTORY_KEEP);
        let json = serde_json::to_string(&history)?;
        match self.write(keys::SEARCH_HISTORY, &json) {
            Ok(()) => {}
            Err(WriteFailure::Quota) => return Err(StoreError::QuotaExceeded),
            Err(WriteFailure::Backend(e)) => return Err(StoreError::Storage(e.to_string())),
        }

        tracing::info!(dropped, "trimmed search history to free storage");
        Ok(dropped)
    }

    // ------------------------------------------------------------------
    // Collection helpers
    // ------------------------------------------------------------------

    pub(crate) fn load<T: DeserializeOwned>(&self, key: &str) -> Vec<T> {
        self.get(key, Vec::new())
    }

    pub(crate) fn save<T: Serialize>(&self, key: &str, items: &[T]) -> Result<()> {
        self.set(key, items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;

    fn db_with_quota(quota_bytes: u64) -> Database {
        let config = StoreConfig {
            quota_bytes,
            ..StoreConfig::default()
        };
        Database::open_in_memory(config).unwrap()
    }

    #[test]
    fn missing_key_yields_default() {
        let db = db_with_quota(1 << 20);
        assert_eq!(db.get("nope", 7), 7);
        assert_eq!(db.get_opt::<i32>("nope"), None);
    }

    #[test]
    fn corrupt_value_is_removed() {
        let db = db_with_quota(1 << 20);
        db.put_raw("broken", "{not json").unwrap();

        let value: Vec<i32> = db.get("broken", vec![1, 2]);
        assert_eq!(value, vec![1, 2]);
        assert_eq!(db.get_raw("broken").unwrap(), None);
    }

    #[test]
    fn wrong_shape_counts_as_corrupt() {
        let db = db_with_quota(1 << 20);
        db.set("numbers", &"a string").unwrap();
        let value: Vec<i32> = db.get("numbers", Vec::new());
        assert!(value.is_empty());
        assert_eq!(db.get_raw("numbers").unwrap(), None);
    }

    #[test]
    fn quota_exceeded_is_reported() {
        let db = db_with_quota(1 << 20);
        let used = db.usage().unwrap().used_bytes;

        let tight = db_with_quota(used + 64);
        let big = "x".repeat(512);
        let err = tight.set("big", &big).unwrap_err();
        assert!(matches!(err, StoreError::QuotaExceeded));
        assert_eq!(err.storage_failure(), Some(crate::StorageFailure::Quota));
        assert_eq!(err.to_string(), "Storage full. Please delete some old data.");
        assert_eq!(tight.get_raw("big").unwrap(), None);
    }

    #[test]
    fn cleanup_trims_search_history_then_retries() {
        let db = db_with_quota(1 << 20);
        let entry = serde_json::json!({ "school": "x".repeat(200), "searchedAt": "2024-01-01T00:00:00Z" });
        db.set(keys::SEARCH_HISTORY, &vec![entry; 10]).unwrap();
        let used = db.usage().unwrap().used_bytes;

        // Rebuild with a quota that only fits after five entries are dropped.
        let config = StoreConfig {
            quota_bytes: used + 400,
            ..StoreConfig::default()
        };
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quota.db");
        {
            let seed = Database::open_at(&path, StoreConfig::default()).unwrap();
            let raw = db.get_raw(keys::SEARCH_HISTORY).unwrap().unwrap();
            seed.put_raw(keys::SEARCH_HISTORY, &raw).unwrap();
        }
        let tight = Database::open_at(&path, config).unwrap();

        tight.set("payload", &"y".repeat(800)).unwrap();
        let history: Vec<serde_json::Value> = tight.get(keys::SEARCH_HISTORY, Vec::new());
        assert_eq!(history.len(), CLEANUP_SEARCH_HISTORY_KEEP);
    }

    #[test]
    fn overwriting_a_key_does_not_double_count() {
        let db = db_with_quota(1 << 20);
        db.set("k", &"v".repeat(100)).unwrap();
        let before = db.usage().unwrap().used_bytes;
        db.set("k", &"w".repeat(100)).unwrap();
        assert_eq!(db.usage().unwrap().used_bytes, before);
    }

    #[test]
    fn prefix_listing() {
        let db = db_with_quota(1 << 20);
        db.set("rateLimit_upload_a", &1).unwrap();
        db.set("rateLimit_report_a", &1).unwrap();
        db.set("other", &1).unwrap();
        let keys = db.keys_with_prefix("rateLimit_").unwrap();
        assert_eq!(keys, vec!["rateLimit_report_a", "rateLimit_upload_a"]);
    }
}
