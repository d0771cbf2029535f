//! Fixed storage keys. Each collection key holds one JSON array, except
//! [`POPULAR_SEARCHES`], which holds an object keyed by canonical filter.

pub const USERS: &str = "yearbook_users";
pub const UPLOADS: &str = "yearbook_uploads";
pub const REPORTS: &str = "yearbook_reports";
pub const FAVORITES: &str = "yearbook_favorites";
pub const LIKES: &str = "yearbook_likes";
pub const COMMENTS: &str = "yearbook_comments";
pub const NOTIFICATIONS: &str = "yearbook_notifications";
pub const NOTIFICATIONS_READ: &str = "yearbook_notifications_read";
pub const SEARCH_HISTORY: &str = "yearbook_search_history";
pub const POPULAR_SEARCHES: &str = "yearbook_popular_searches";

/// Public profile of the last logged-in user (password stripped).
pub const CURRENT_USER: &str = "currentUser";

/// Prefix of per-(action, actor) rate limit windows.
pub const RATE_LIMIT_PREFIX: &str = "rateLimit_";

/// Collections created empty on a fresh store.
pub const ARRAY_COLLECTIONS: [&str; 9] = [
    USERS,
    UPLOADS,
    REPORTS,
    FAVORITES,
    LIKES,
    COMMENTS,
    NOTIFICATIONS,
    NOTIFICATIONS_READ,
    SEARCH_HISTORY,
];
