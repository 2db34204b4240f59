use thiserror::Error;

use slackterm_net::ApiError;
use slackterm_store::StoreError;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Identity cache error: {0}")]
    Store(#[from] StoreError),

    #[error("Configuration error: {0}")]
    Config(String),

    /// A live event that does not produce a displayable message.
    #[error("Ignored event subtype: {0}")]
    IgnoredEvent(String),

    #[error("No channels available")]
    NoChannels,

    #[error("Unknown thread alias: {0}")]
    UnknownThread(String),

    #[error("Not a slash command: {0}")]
    NotACommand(String),

    #[error("Invalid command: {0}")]
    InvalidCommand(String),
}

impl ClientError {
    /// Authorization failures end the session instead of being retried.
    pub fn is_auth(&self) -> bool {
        matches!(self, ClientError::Api(e) if e.is_auth())
    }
}

/// A user lookup that failed remotely. Carries the placeholder name the
/// caller may display instead.
#[derive(Debug, Error)]
#[error("Could not resolve user, using {placeholder:?}: {source}")]
pub struct UnresolvedUser {
    pub placeholder: String,
    #[source]
    pub source: ApiError,
}

pub type Result<T> = std::result::Result<T, ClientError>;
