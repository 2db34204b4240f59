use thiserror::Error;

/// Errors raised while talking to the remote service.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with `"ok": false`.
    #[error("Remote error in {method}: {error}")]
    Remote { method: String, error: String },

    #[error("Malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Event stream error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("Not authorized: {0}")]
    Unauthorized(String),
}

impl ApiError {
    /// Authorization failures are fatal at startup; everything else is
    /// worth retrying.
    pub fn is_auth(&self) -> bool {
        match self {
            ApiError::Unauthorized(_) => true,
            ApiError::Remote { error, .. } => matches!(
                error.as_str(),
                "not_authed" | "invalid_auth" | "account_inactive" | "token_revoked"
            ),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
