//! Store tunables. Every field has a default taken from `yearbook_shared::constants`.

use std::time::Duration;

use yearbook_shared::constants::{
    DEFAULT_PRIMARY_ADMIN_EMAIL, DEFAULT_QUOTA_BYTES, MAX_AUTOCOMPLETE_RESULTS,
    MAX_NOTIFICATIONS, MAX_SEARCH_HISTORY, RATE_LIMIT_REPORTS, RATE_LIMIT_UPLOADS,
    RATE_LIMIT_WINDOW_SECS, RESULTS_PER_PAGE,
};

#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Capacity of the key-value store, summed over key and value bytes.
    pub quota_bytes: u64,

    /// Email of the legacy primary admin, seeded as superadmin.
    pub primary_admin_email: String,

    /// Uploads allowed per user per window.
    pub upload_rate_limit: u32,

    /// Reports allowed per reporter per window.
    pub report_rate_limit: u32,

    pub rate_limit_window: Duration,

    pub max_search_history: usize,

    pub results_per_page: usize,

    pub max_autocomplete_results: usize,

    pub max_notifications: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            quota_bytes: DEFAULT_QUOTA_BYTES,
            primary_admin_email: DEFAULT_PRIMARY_ADMIN_EMAIL.to_string(),
            upload_rate_limit: RATE_LIMIT_UPLOADS,
            report_rate_limit: RATE_LIMIT_REPORTS,
            rate_limit_window: Duration::from_secs(RATE_LIMIT_WINDOW_SECS),
            max_search_history: MAX_SEARCH_HISTORY,
            results_per_page: RESULTS_PER_PAGE,
            max_autocomplete_results: MAX_AUTOCOMPLETE_RESULTS,
            max_notifications: MAX_NOTIFICATIONS,
        }
    }
}

impl StoreConfig {
    pub fn is_primary_admin_email(&self, email: &str) -> bool {
        email.trim().eq_ignore_ascii_case(self.primary_admin_email.trim())
    }
}
