use thiserror::Error;
use yearbook_shared::ValidationError;

/// Errors produced by the store layer.
///
/// Every repository and service call reports failure through this type; the
/// only failure swallowed internally is a corrupt JSON value, which is
/// dropped and treated as missing.
#[derive(Error, Debug)]
pub enum StoreError {
    /// One or more field validators failed.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// A lookup by id or key found nothing.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// The caller lacks the capability for this action.
    #[error("{0}")]
    Forbidden(String),

    /// The action would duplicate existing state; nothing was written.
    #[error("{0}")]
    Duplicate(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Too many {action} attempts. Please wait {reset_in} seconds.")]
    RateLimited { action: &'static str, reset_in: u64 },

    /// The write did not fit in the storage quota, even after cleanup.
    #[error("Storage full. Please delete some old data.")]
    QuotaExceeded,

    /// The write failed for a reason other than capacity.
    #[error("Failed to save data: {0}")]
    Storage(String),

    /// A backup file was malformed or of an unsupported version.
    #[error("Invalid backup: {0}")]
    Backup(String),

    /// SQLite error on a read path.
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Failed to determine a platform data directory.
    #[error("Could not determine application data directory")]
    NoDataDir,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Migration error: {0}")]
    Migration(String),
}

/// Classification of a failed write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageFailure {
    Quota,
    Unknown,
}

impl StoreError {
    pub fn storage_failure(&self) -> Option<StorageFailure> {
        match self {
            StoreError::QuotaExceeded => Some(StorageFailure::Quota),
            StoreError::Storage(_) => Some(StorageFailure::Unknown),
            _ => None,
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        StoreError::Forbidden(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        StoreError::Validation(ValidationError::single(message))
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;
