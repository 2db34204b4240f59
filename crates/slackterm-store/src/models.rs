//! Domain model structs persisted in the identity cache.

use slackterm_shared::constants::IDENTITY_TTL_SECS;

// ---------------------------------------------------------------------------
// CachedIdentity
// ---------------------------------------------------------------------------

/// A resolved user display name with the time it was last resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedIdentity {
    /// Remote user id, primary key of the `users` table.
    pub user_id: String,
    pub display_name: String,
    /// Unix epoch seconds of the last successful remote resolution.
    pub updated_at: i64,
}

impl CachedIdentity {
    /// An entry is fresh while it is no older than the TTL.
    pub fn is_fresh_at(&self, now: i64) -> bool {
        now - self.updated_at <= IDENTITY_TTL_SECS
    }
}
