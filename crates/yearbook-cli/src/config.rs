//! CLI configuration loaded from environment variables.
//!
//! Every setting is optional; unset or unparsable values keep the store
//! defaults.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use yearbook_store::{Database, StoreConfig};

#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Database file.
    /// Env: `YEARBOOK_DB_PATH`
    /// Default: `yearbook.db` in the platform data directory.
    pub db_path: Option<PathBuf>,

    /// Env: `YEARBOOK_QUOTA_BYTES`, `YEARBOOK_ADMIN_EMAIL`,
    /// `YEARBOOK_UPLOAD_LIMIT`, `YEARBOOK_REPORT_LIMIT`,
    /// `YEARBOOK_RATE_WINDOW_SECS`.
    pub store: StoreConfig,
}

fn parsed<T: FromStr>(name: &str, raw: Option<String>) -> Option<T> {
    let raw = raw?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(var = name, value = %raw, "invalid value, using default");
            None
        }
    }
}

impl CliConfig {
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(path) = lookup("YEARBOOK_DB_PATH").filter(|p| !p.trim().is_empty()) {
            config.db_path = Some(PathBuf::from(path));
        }

        if let Some(email) = lookup("YEARBOOK_ADMIN_EMAIL").filter(|e| !e.trim().is_empty()) {
            config.store.primary_admin_email = email.trim().to_string();
        }

        if let Some(bytes) = parsed::<u64>("YEARBOOK_QUOTA_BYTES", lookup("YEARBOOK_QUOTA_BYTES")) {
            config.store.quota_bytes = bytes;
        }

        if let Some(n) = parsed::<u32>("YEARBOOK_UPLOAD_LIMIT", lookup("YEARBOOK_UPLOAD_LIMIT")) {
            config.store.upload_rate_limit = n;
        }

        if let Some(n) = parsed::<u32>("YEARBOOK_REPORT_LIMIT", lookup("YEARBOOK_REPORT_LIMIT")) {
            config.store.report_rate_limit = n;
        }

        if let Some(secs) =
            parsed::<u64>("YEARBOOK_RATE_WINDOW_SECS", lookup("YEARBOOK_RATE_WINDOW_SECS"))
        {
            config.store.rate_limit_window = Duration::from_secs(secs);
        }

        config
    }

    pub fn open(&self) -> yearbook_store::Result<Database> {
        match &self.db_path {
            Some(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent)?;
                }
                Database::open_at(path, self.store.clone())
            }
            None => Database::new(self.store.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_map(pairs: &[(&str, &str)]) -> CliConfig {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        CliConfig::from_vars(|key| map.get(key).cloned())
    }

    #[test]
    fn test_default_config() {
        let config = from_map(&[]);
        assert!(config.db_path.is_none());
        assert_eq!(config.store.quota_bytes, 5 * 1024 * 1024);
        assert_eq!(config.store.primary_admin_email, "admin@yearbook.com");
        assert_eq!(config.store.rate_limit_window, Duration::from_secs(60));
    }

    #[test]
    fn test_overrides() {
        let config = from_map(&[
            ("YEARBOOK_DB_PATH", "/tmp/yb.db"),
            ("YEARBOOK_QUOTA_BYTES", "1024"),
            ("YEARBOOK_ADMIN_EMAIL", " root@school.org "),
            ("YEARBOOK_UPLOAD_LIMIT", "3"),
            ("YEARBOOK_REPORT_LIMIT", "2"),
            ("YEARBOOK_RATE_WINDOW_SECS", "5"),
        ]);
        assert_eq!(config.db_path, Some(PathBuf::from("/tmp/yb.db")));
        assert_eq!(config.store.quota_bytes, 1024);
        assert_eq!(config.store.primary_admin_email, "root@school.org");
        assert_eq!(config.store.upload_rate_limit, 3);
        assert_eq!(config.store.report_rate_limit, 2);
        assert_eq!(config.store.rate_limit_window, Duration::from_secs(5));
    }

    #[test]
    fn test_invalid_values_keep_defaults() {
        let config = from_map(&[("YEARBOOK_QUOTA_BYTES", "lots"), ("YEARBOOK_UPLOAD_LIMIT", "-1")]);
        assert_eq!(config.store.quota_bytes, 5 * 1024 * 1024);
        assert_eq!(config.store.upload_rate_limit, 10);
    }

    #[test]
    fn test_open_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let config = CliConfig {
            db_path: Some(dir.path().join("nested/deeper/yearbook.db")),
            ..CliConfig::default()
        };
        let db = config.open().unwrap();
        assert!(db.path().is_some());
    }
}
