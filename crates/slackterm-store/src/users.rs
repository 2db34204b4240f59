use chrono::Utc;
use rusqlite::{params, OptionalExtension};

use crate::database::Database;
use crate::error::Result;
use crate::models::CachedIdentity;

impl Database {
    /// Insert or replace the display name of a user, stamped with the
    /// current time.
    pub fn upsert_user(&self, user_id: &str, display_name: &str) -> Result<()> {
        self.upsert_user_at(user_id, display_name, Utc::now().timestamp())
    }

    /// Insert or replace with an explicit `updated_at` (epoch seconds).
    pub fn upsert_user_at(&self, user_id: &str, display_name: &str, updated_at: i64) -> Result<()> {
        self.conn().execute(
            "INSERT INTO users (user_id, username, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(user_id) DO UPDATE SET
                 username = excluded.username,
                 updated_at = excluded.updated_at",
            params![user_id, display_name, updated_at],
        )?;
        Ok(())
    }

    /// Fetch a row regardless of its age.
    pub fn get_user(&self, user_id: &str) -> Result<Option<CachedIdentity>> {
        let identity = self
            .conn()
            .query_row(
                "SELECT user_id, username, updated_at FROM users WHERE user_id = ?1",
                params![user_id],
                |row| {
                    Ok(CachedIdentity {
                        user_id: row.get(0)?,
                        display_name: row.get(1)?,
                        updated_at: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(identity)
    }

    /// Fetch a row only if it is still within the TTL. Stale rows read as
    /// absent; they are superseded by the next upsert, never deleted.
    pub fn get_fresh_user(&self, user_id: &str) -> Result<Option<CachedIdentity>> {
        let now = Utc::now().timestamp();
        Ok(self
            .get_user(user_id)?
            .filter(|identity| identity.is_fresh_at(now)))
    }

    pub fn count_users(&self) -> Result<u64> {
        let count: i64 = self
            .conn()
            .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}
