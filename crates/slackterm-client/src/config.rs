//! Client configuration loaded from environment variables.
//!
//! Only the token is mandatory; everything else has a default suitable for
//! a regular workspace.

use std::time::Duration;

use slackterm_shared::constants::{
    DEFAULT_HISTORY_COUNT, DEFAULT_HISTORY_DAYS, RATE_LIMIT_INTERVAL_MS, RATE_LIMIT_TOKENS,
};

use crate::error::{ClientError, Result};

#[derive(Clone)]
pub struct ClientConfig {
    /// API token.
    /// Env: `SLACK_TOKEN` (required)
    pub token: String,

    /// Session cookie sent alongside browser (`xoxc-`) tokens.
    /// Env: `SLACK_COOKIE`
    pub cookie: Option<String>,

    /// Base URL of the Web API.
    /// Env: `SLACK_API_URL`
    /// Default: `https://slack.com/api/`
    pub api_url: Option<String>,

    /// List only the conversations the user belongs to (`users.conversations`)
    /// instead of paging through every conversation in the workspace.
    /// Env: `SLACK_ENTERPRISE` (true/false)
    /// Default: `false`
    pub enterprise: bool,

    /// Replace `:name:` codes with emoji.
    /// Env: `SLACK_EMOJI` (true/false)
    /// Default: `true`
    pub emoji: bool,

    /// Env: `SLACK_HISTORY_COUNT`
    /// Default: `100`
    pub history_count: u32,

    /// Env: `SLACK_HISTORY_DAYS`
    /// Default: `3`
    pub history_days: u32,

    /// Env: `SLACK_RATE_TOKENS`
    /// Default: `20`
    pub rate_tokens: u32,

    /// Env: `SLACK_RATE_INTERVAL_MS`
    /// Default: `1000`
    pub rate_interval: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            cookie: None,
            api_url: None,
            enterprise: false,
            emoji: true,
            history_count: DEFAULT_HISTORY_COUNT,
            history_days: DEFAULT_HISTORY_DAYS,
            rate_tokens: RATE_LIMIT_TOKENS,
            rate_interval: Duration::from_millis(RATE_LIMIT_INTERVAL_MS),
        }
    }
}

// Keep the token out of log lines.
impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("token", &"<redacted>")
            .field("cookie", &self.cookie.as_ref().map(|_| "<redacted>"))
            .field("api_url", &self.api_url)
            .field("enterprise", &self.enterprise)
            .field("emoji", &self.emoji)
            .field("history_count", &self.history_count)
            .field("history_days", &self.history_days)
            .field("rate_tokens", &self.rate_tokens)
            .field("rate_interval", &self.rate_interval)
            .finish()
    }
}

impl ClientConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        config.token = get("SLACK_TOKEN")
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| ClientError::Config("SLACK_TOKEN is not set".to_string()))?;

        config.cookie = get("SLACK_COOKIE").filter(|c| !c.is_empty());
        config.api_url = get("SLACK_API_URL").filter(|u| !u.is_empty());

        if let Some(val) = get("SLACK_ENTERPRISE") {
            config.enterprise = flag(&val);
        }

        if let Some(val) = get("SLACK_EMOJI") {
            config.emoji = flag(&val);
        }

        if let Some(val) = get("SLACK_HISTORY_COUNT") {
            config.history_count = positive("SLACK_HISTORY_COUNT", &val, config.history_count);
        }

        if let Some(val) = get("SLACK_HISTORY_DAYS") {
            config.history_days = positive("SLACK_HISTORY_DAYS", &val, config.history_days);
        }

        if let Some(val) = get("SLACK_RATE_TOKENS") {
            config.rate_tokens = positive("SLACK_RATE_TOKENS", &val, config.rate_tokens);
        }

        if let Some(val) = get("SLACK_RATE_INTERVAL_MS") {
            let ms = positive("SLACK_RATE_INTERVAL_MS", &val, RATE_LIMIT_INTERVAL_MS as u32);
            config.rate_interval = Duration::from_millis(u64::from(ms));
        }

        Ok(config)
    }
}

fn flag(val: &str) -> bool {
    val != "false" && val != "0"
}

fn positive(key: &str, val: &str, default: u32) -> u32 {
    match val.parse::<u32>() {
        Ok(n) if n > 0 => n,
        _ => {
            tracing::warn!(key, value = %val, "Invalid value, using default");
            default
        }
    }
}
