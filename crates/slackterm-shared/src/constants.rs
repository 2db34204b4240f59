/// Application name, also used for cache/data directory names
pub const APP_NAME: &str = "slack-term";

/// Default Web API base URL (method names are appended)
pub const DEFAULT_API_URL: &str = "https://slack.com/api/";

/// Durable identity cache freshness window (7 days)
pub const IDENTITY_TTL_SECS: i64 = 7 * 24 * 60 * 60;

/// Rate limiter bucket size
pub const RATE_LIMIT_TOKENS: u32 = 20;

/// Rate limiter refill interval in milliseconds (Tier 3 is roughly 1/sec)
pub const RATE_LIMIT_INTERVAL_MS: u64 = 1_000;

/// Page size for conversation listing
pub const CONVERSATION_PAGE_LIMIT: u32 = 1_000;

/// Page size for thread reply listing
pub const REPLIES_PAGE_LIMIT: u32 = 200;

/// Number of history messages fetched per channel load
pub const DEFAULT_HISTORY_COUNT: u32 = 100;

/// How far back channel history reaches, in days
pub const DEFAULT_HISTORY_DAYS: u32 = 3;

/// Keepalive ping interval on the event stream, in seconds
pub const EVENT_PING_INTERVAL_SECS: u64 = 30;

/// Placeholder name for a user that could not be resolved
pub fn unknown_user(user_id: &str) -> String {
    format!("unknown ({user_id})")
}
