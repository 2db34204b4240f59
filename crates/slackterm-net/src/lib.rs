// Remote service plumbing: Web API client, live event stream and rate limiting.

pub mod api;
pub mod error;
pub mod events;
pub mod http;
pub mod rate_limit;

pub use api::{
    AuthIdentity, ConversationsRequest, HistoryRequest, Page, PostMessage, RepliesRequest,
    SlackApi,
};
pub use error::{ApiError, Result};
pub use events::{spawn_event_stream, StreamCommand};
pub use http::HttpSlackClient;
pub use rate_limit::RateLimiter;
