//! Database connection management.
//!
//! The [`Database`] struct owns a [`rusqlite::Connection`] and guarantees that
//! migrations are run before any other operation.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use rusqlite::Connection;

use slackterm_shared::constants::APP_NAME;

use crate::error::{Result, StoreError};
use crate::migrations;

/// Wrapper around a [`rusqlite::Connection`].
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) the default identity cache.
    ///
    /// The database file is placed in the platform-appropriate cache directory:
    /// - Linux:   `~/.cache/slack-term/users.db`
    /// - macOS:   `~/Library/Caches/slack-term/users.db`
    /// - Windows: `{FOLDERID_LocalAppData}\slack-term\cache\users.db`
    pub fn open_default() -> Result<Self> {
        let cache_dir = default_cache_dir()?;
        std::fs::create_dir_all(&cache_dir)?;

        let db_path = cache_dir.join("users.db");

        tracing::info!(path = %db_path.display(), "opening identity cache");

        Self::open_at(&db_path)
    }

    /// Open (or create) a database at an explicit path.
    ///
    /// This is useful for tests and for embedding the store inside custom
    /// directory layouts.
    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        conn.pragma_update(None, "journal_mode", "WAL")?;

        migrations::run_migrations(&conn)?;

        Ok(Self { conn })
    }

    /// Open a private in-memory database. Nothing survives the handle.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        migrations::run_migrations(&conn)?;
        Ok(Self { conn })
    }

    /// Return a reference to the underlying `rusqlite::Connection`.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Return the filesystem path of the open database (if any).
    pub fn path(&self) -> Option<PathBuf> {
        self.conn.path().map(PathBuf::from)
    }
}

/// Per-user cache directory for slack-term (`~/.cache/slack-term` on Linux).
pub fn default_cache_dir() -> Result<PathBuf> {
    let project_dirs = ProjectDirs::from("", "", APP_NAME).ok_or(StoreError::NoCacheDir)?;
    Ok(project_dirs.cache_dir().to_path_buf())
}
