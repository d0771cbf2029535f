/// Application name
pub const APP_NAME: &str = "YearBook";

/// Identifier recorded for actions taken without a logged-in user
pub const ANONYMOUS: &str = "anonymous";

/// Display name recorded for anonymous reporters
pub const ANONYMOUS_USERNAME: &str = "Anonymous";

/// Legacy primary admin account, seeded as superadmin
pub const DEFAULT_PRIMARY_ADMIN_EMAIL: &str = "admin@yearbook.com";

/// Username length bounds (inclusive)
pub const MIN_USERNAME_LENGTH: usize = 3;
pub const MAX_USERNAME_LENGTH: usize = 20;

/// Minimum password length
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Minimum trimmed length of school, city and country names
pub const MIN_PLACE_NAME_LENGTH: usize = 2;

/// Earliest accepted yearbook year
pub const MIN_YEAR: i32 = 1900;

/// Maximum decoded image size in bytes (10 MiB)
pub const MAX_IMAGE_SIZE: usize = 10 * 1024 * 1024;

/// Maximum comment length in characters
pub const MAX_COMMENT_LENGTH: usize = 1000;

/// Results per search page
pub const RESULTS_PER_PAGE: usize = 12;

/// Search history bound
pub const MAX_SEARCH_HISTORY: usize = 10;

/// Entries kept in search history when storage is full
pub const CLEANUP_SEARCH_HISTORY_KEEP: usize = 5;

/// Autocomplete suggestion bound
pub const MAX_AUTOCOMPLETE_RESULTS: usize = 5;

/// Minimum query length before autocomplete suggests anything
pub const MIN_AUTOCOMPLETE_QUERY: usize = 2;

/// Notification ring buffer bound
pub const MAX_NOTIFICATIONS: usize = 50;

/// Rate limits per window
pub const RATE_LIMIT_UPLOADS: u32 = 10;
pub const RATE_LIMIT_REPORTS: u32 = 5;

/// Rate limit window in seconds
pub const RATE_LIMIT_WINDOW_SECS: u64 = 60;

/// Default storage quota in bytes (5 MiB, typical browser local storage)
pub const DEFAULT_QUOTA_BYTES: u64 = 5 * 1024 * 1024;

/// Fraction of the quota after which usage is logged as a warning
pub const QUOTA_WARNING_THRESHOLD: f64 = 0.9;

/// A user counts as active if they uploaded within this many days
pub const ACTIVE_USER_WINDOW_DAYS: i64 = 30;

/// Leaderboard length on the admin dashboard
pub const LEADERBOARD_SIZE: usize = 5;

/// Popularity score weights
pub const SCORE_LIKE_WEIGHT: f64 = 2.0;
pub const SCORE_COMMENT_WEIGHT: f64 = 1.5;
pub const SCORE_VIEW_WEIGHT: f64 = 0.1;

/// Backup file format version
pub const BACKUP_VERSION: &str = "1.0";
