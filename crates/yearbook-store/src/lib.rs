//! # yearbook-store
//!
//! Persistence for the Yearbook Memories site. Every collection is a JSON
//! document under a fixed key in a small SQLite-backed key-value table; the
//! repositories load a collection, change it in memory and write it back.
//!
//! The crate exposes a synchronous [`Database`] handle. Entity operations
//! live in per-entity modules as `impl Database` blocks and take an explicit
//! [`Session`] describing the caller.

pub mod backup;
pub mod comments;
pub mod config;
pub mod database;
pub mod export;
pub mod favorites;
pub mod keys;
pub mod kv;
pub mod likes;
pub mod migrations;
pub mod models;
pub mod notifications;
pub mod query;
pub mod rate_limit;
pub mod reports;
pub mod search_history;
pub mod session;
pub mod stats;
pub mod uploads;
pub mod users;

mod error;

pub use backup::{parse_backup, BackupPayload, ImportStats};
pub use config::StoreConfig;
pub use database::Database;
pub use error::{Result, StorageFailure, StoreError};
pub use export::csv_escape;
pub use kv::StorageUsage;
pub use likes::LikeOutcome;
pub use models::*;
pub use notifications::NotificationEntry;
pub use query::{
    paginate, quick_query, sort_uploads, AutocompleteField, FilterLogic, Page, SortBy,
    UploadFilter,
};
pub use rate_limit::{RateLimitAction, RateLimitDecision};
pub use search_history::{PopularSearch, SearchHistoryEntry};
pub use session::Session;
pub use stats::{AdminStats, PostRank, RoleBreakdown, UploaderRank};
pub use users::DeletedUserSummary;
