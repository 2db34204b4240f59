//! The remote API seam.
//!
//! [`SlackApi`] lists every call the client makes against the remote
//! service. The production implementation is
//! [`HttpSlackClient`](crate::http::HttpSlackClient); tests substitute an
//! in-memory double. Implementations perform no rate limiting of their own,
//! callers pass through [`RateLimiter`](crate::RateLimiter) first.

use async_trait::async_trait;

use slackterm_shared::protocol::{RawConversation, RawMessage, RawUser};

use crate::error::Result;

/// One page of a cursor-paginated listing. An empty `next_cursor` marks the
/// last page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_cursor: String,
}

impl<T> Page<T> {
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            next_cursor: String::new(),
        }
    }

    pub fn is_last(&self) -> bool {
        self.next_cursor.is_empty()
    }
}

/// Conversation type filter accepted by the listing endpoints.
pub const TYPE_PUBLIC_CHANNEL: &str = "public_channel";
pub const TYPE_PRIVATE_CHANNEL: &str = "private_channel";
pub const TYPE_IM: &str = "im";
pub const TYPE_MPIM: &str = "mpim";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversationsRequest {
    pub types: Vec<&'static str>,
    pub exclude_archived: bool,
    pub limit: u32,
    pub cursor: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryRequest {
    pub channel: String,
    pub limit: u32,
    /// Lower time bound (epoch seconds as a string), empty for none.
    pub oldest: String,
    /// Upper time bound, empty for none.
    pub latest: String,
    pub inclusive: bool,
    pub cursor: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RepliesRequest {
    pub channel: String,
    /// Timestamp of the thread parent.
    pub ts: String,
    pub limit: u32,
    pub cursor: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostMessage {
    pub channel: String,
    pub text: String,
    /// Reply into this thread when non-empty.
    pub thread_ts: String,
    pub username: String,
}

/// Identity of the token owner, from `auth.test`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthIdentity {
    pub user_id: String,
    pub user: String,
    pub team: String,
}

#[async_trait]
pub trait SlackApi: Send + Sync {
    /// Validate the token and report whom it belongs to.
    async fn auth_test(&self) -> Result<AuthIdentity>;

    /// `conversations.list`: every conversation of the requested types.
    async fn list_conversations(&self, req: &ConversationsRequest) -> Result<Page<RawConversation>>;

    /// `users.conversations`: only conversations the user belongs to.
    async fn user_conversations(&self, req: &ConversationsRequest) -> Result<Page<RawConversation>>;

    /// `conversations.history`, newest first.
    async fn history(&self, req: &HistoryRequest) -> Result<Page<RawMessage>>;

    /// `conversations.replies`: the thread parent followed by its replies.
    async fn replies(&self, req: &RepliesRequest) -> Result<Page<RawMessage>>;

    async fn user_info(&self, user_id: &str) -> Result<RawUser>;

    async fn user_presence(&self, user_id: &str) -> Result<String>;

    async fn set_presence(&self, presence: &str) -> Result<()>;

    async fn post_message(&self, msg: &PostMessage) -> Result<()>;

    /// Execute a slash command in a channel.
    async fn send_command(&self, channel: &str, command: &str, text: &str) -> Result<()>;

    /// Move the read marker of a conversation to `ts`.
    async fn mark_read(&self, channel: &str, ts: &str) -> Result<()>;

    /// Open a live event session and return its websocket URL.
    async fn connect_events(&self) -> Result<String>;
}
