//! Database connection management.
//!
//! The [`Database`] struct owns a [`rusqlite::Connection`] holding the
//! key-value table, and guarantees that migrations and the primary-admin seed
//! have run before any other operation.
//!
//! Repository methods are spread over the sibling modules as `impl Database`
//! blocks. They are synchronous and single-threaded; the handle is not `Sync`.

use std::cell::Cell;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use rusqlite::Connection;

use crate::config::StoreConfig;
use crate::error::{Result, StoreError};
use crate::migrations;

/// Wrapper around a [`rusqlite::Connection`] plus the store configuration.
pub struct Database {
    conn: Connection,
    config: StoreConfig,
    in_transaction: Cell<bool>,
}

impl Database {
    /// Open (or create) the default store.
    ///
    /// The database file is placed in the platform-appropriate data directory:
    /// - Linux:   `~/.local/share/yearbook/yearbook.db`
    /// - macOS:   `~/Library/Application Support/com.yearbook.yearbook/yearbook.db`
    /// - Windows: `{FOLDERID_RoamingAppData}\yearbook\yearbook\data\yearbook.db`
    pub fn new(config: StoreConfig) -> Result<Self> {
        let project_dirs =
            ProjectDirs::from("com", "yearbook", "yearbook").ok_or(StoreError::NoDataDir)?;

        let data_dir = project_dirs.data_dir();
        std::fs::create_dir_all(data_dir)?;

        let db_path = data_dir.join("yearbook.db");

        tracing::info!(path = %db_path.display(), "opening store");

        Self::open_at(&db_path, config)
    }

    /// Open (or create) a store at an explicit path.
    pub fn open_at(path: &Path, config: StoreConfig) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Self::init(conn, config)
    }

    /// Open a throwaway store that lives only as long as the handle.
    pub fn open_in_memory(config: StoreConfig) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn, config)
    }

    fn init(conn: Connection, config: StoreConfig) -> Result<Self> {
        migrations::run_migrations(&conn)?;

        let db = Self {
            conn,
            config,
            in_transaction: Cell::new(false),
        };
        db.seed_primary_admin()?;
        Ok(db)
    }

    /// Return a reference to the underlying `rusqlite::Connection`.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Return the filesystem path of the open database (if any).
    pub fn path(&self) -> Option<PathBuf> {
        self.conn.path().filter(|p| !p.is_empty()).map(PathBuf::from)
    }

    /// Run `f` inside a single SQLite transaction.
    ///
    /// Everything `f` writes through [`Database::set`] commits together or
    /// not at all. Nested calls join the outer transaction. Writes made
    /// outside `atomically` are independent single-key writes with no
    /// rollback, exactly like the browser storage this replaces.
    pub fn atomically<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Self) -> Result<T>,
    {
        if self.in_transaction.get() {
            return f(self);
        }

        let tx = self.conn.unchecked_transaction()?;
        self.in_transaction.set(true);
        let result = f(self);
        self.in_transaction.set(false);

        match result {
            Ok(value) => {
                tx.commit()?;
                Ok(value)
            }
            Err(e) => {
                tracing::debug!(error = %e, "rolling back transaction");
                tx.rollback()?;
                Err(e)
            }
        }
    }
}
