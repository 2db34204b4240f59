//! [`SlackApi`] over the Web API using `reqwest`.
//!
//! Every method is a form-encoded POST to `<api_url><method>` authenticated
//! with a bearer token. Responses share an envelope: `"ok": true` plus the
//! payload fields, or `"ok": false` with an `"error"` code.

use async_trait::async_trait;
use reqwest::header::COOKIE;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, trace};

use slackterm_shared::constants::DEFAULT_API_URL;
use slackterm_shared::protocol::{RawConversation, RawMessage, RawUser};

use crate::api::{
    AuthIdentity, ConversationsRequest, HistoryRequest, Page, PostMessage, RepliesRequest,
    SlackApi,
};
use crate::error::{ApiError, Result};

/// Production remote client.
#[derive(Debug, Clone)]
pub struct HttpSlackClient {
    http: reqwest::Client,
    api_url: String,
    token: String,
    /// Browser session cookie, required by some enterprise workspaces
    /// alongside an `xoxc-` token.
    cookie: Option<String>,
}

impl HttpSlackClient {
    pub fn new(token: impl Into<String>, api_url: Option<&str>, cookie: Option<String>) -> Result<Self> {
        let mut api_url = api_url.unwrap_or(DEFAULT_API_URL).to_string();
        if !api_url.ends_with('/') {
            api_url.push('/');
        }

        let http = reqwest::Client::builder()
            .user_agent(concat!("slack-term/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            api_url,
            token: token.into(),
            cookie: cookie.filter(|c| !c.is_empty()),
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    async fn call(&self, method: &str, params: &[(&str, String)]) -> Result<Value> {
        let url = format!("{}{}", self.api_url, method);
        trace!(method, "calling remote API");

        let mut request = self.http.post(&url).bearer_auth(&self.token).form(params);
        if let Some(ref cookie) = self.cookie {
            request = request.header(COOKIE, cookie);
        }

        let body: Value = request.send().await?.error_for_status()?.json().await?;
        check_ok(method, body)
    }
}

/// Unwrap the response envelope.
fn check_ok(method: &str, body: Value) -> Result<Value> {
    if body.get("ok").and_then(Value::as_bool).unwrap_or(false) {
        return Ok(body);
    }

    let error = body
        .get("error")
        .and_then(Value::as_str)
        .unwrap_or("unknown_error")
        .to_string();
    debug!(method, error = %error, "remote call rejected");
    Err(ApiError::Remote {
        method: method.to_string(),
        error,
    })
}

/// Decode a payload field, treating a missing or null field as the default.
fn field<T: DeserializeOwned + Default>(body: &mut Value, key: &str) -> Result<T> {
    match body.get_mut(key).map(Value::take) {
        None | Some(Value::Null) => Ok(T::default()),
        Some(value) => Ok(serde_json::from_value(value)?),
    }
}

fn next_cursor(body: &Value) -> String {
    body.pointer("/response_metadata/next_cursor")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn page<T: DeserializeOwned>(mut body: Value, key: &str) -> Result<Page<T>> {
    let items: Vec<T> = field(&mut body, key)?;
    Ok(Page {
        items,
        next_cursor: next_cursor(&body),
    })
}

fn conversation_params(req: &ConversationsRequest) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("types", req.types.join(",")),
        ("exclude_archived", req.exclude_archived.to_string()),
        ("limit", req.limit.to_string()),
    ];
    if !req.cursor.is_empty() {
        params.push(("cursor", req.cursor.clone()));
    }
    params
}

fn push_non_empty(params: &mut Vec<(&'static str, String)>, key: &'static str, value: &str) {
    if !value.is_empty() {
        params.push((key, value.to_string()));
    }
}

#[async_trait]
impl SlackApi for HttpSlackClient {
    async fn auth_test(&self) -> Result<AuthIdentity> {
        let body = self.call("auth.test", &[]).await.map_err(|e| match e {
            ApiError::Remote { error, .. } => ApiError::Unauthorized(error),
            other => other,
        })?;

        let text = |key: &str| {
            body.get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        Ok(AuthIdentity {
            user_id: text("user_id"),
            user: text("user"),
            team: text("team"),
        })
    }

    async fn list_conversations(&self, req: &ConversationsRequest) -> Result<Page<RawConversation>> {
        let body = self
            .call("conversations.list", &conversation_params(req))
            .await?;
        page(body, "channels")
    }

    async fn user_conversations(&self, req: &ConversationsRequest) -> Result<Page<RawConversation>> {
        let body = self
            .call("users.conversations", &conversation_params(req))
            .await?;
        page(body, "channels")
    }

    async fn history(&self, req: &HistoryRequest) -> Result<Page<RawMessage>> {
        let mut params = vec![
            ("channel", req.channel.clone()),
            ("limit", req.limit.to_string()),
            ("inclusive", req.inclusive.to_string()),
        ];
        push_non_empty(&mut params, "oldest", &req.oldest);
        push_non_empty(&mut params, "latest", &req.latest);
        push_non_empty(&mut params, "cursor", &req.cursor);

        let body = self.call("conversations.history", &params).await?;
        page(body, "messages")
    }

    async fn replies(&self, req: &RepliesRequest) -> Result<Page<RawMessage>> {
        let mut params = vec![
            ("channel", req.channel.clone()),
            ("ts", req.ts.clone()),
            ("limit", req.limit.to_string()),
        ];
        push_non_empty(&mut params, "cursor", &req.cursor);

        let body = self.call("conversations.replies", &params).await?;
        page(body, "messages")
    }

    async fn user_info(&self, user_id: &str) -> Result<RawUser> {
        let mut body = self
            .call("users.info", &[("user", user_id.to_string())])
            .await?;
        field(&mut body, "user")
    }

    async fn user_presence(&self, user_id: &str) -> Result<String> {
        let mut body = self
            .call("users.getPresence", &[("user", user_id.to_string())])
            .await?;
        field(&mut body, "presence")
    }

    async fn set_presence(&self, presence: &str) -> Result<()> {
        self.call("users.setPresence", &[("presence", presence.to_string())])
            .await?;
        Ok(())
    }

    async fn post_message(&self, msg: &PostMessage) -> Result<()> {
        let mut params = vec![
            ("channel", msg.channel.clone()),
            ("text", msg.text.clone()),
            ("as_user", "true".to_string()),
            ("link_names", "1".to_string()),
        ];
        push_non_empty(&mut params, "thread_ts", &msg.thread_ts);
        push_non_empty(&mut params, "username", &msg.username);

        self.call("chat.postMessage", &params).await?;
        Ok(())
    }

    async fn send_command(&self, channel: &str, command: &str, text: &str) -> Result<()> {
        let params = [
            ("channel", channel.to_string()),
            ("command", command.to_string()),
            ("text", text.to_string()),
        ];
        self.call("chat.command", &params).await?;
        Ok(())
    }

    async fn mark_read(&self, channel: &str, ts: &str) -> Result<()> {
        let params = [("channel", channel.to_string()), ("ts", ts.to_string())];
        self.call("conversations.mark", &params).await?;
        Ok(())
    }

    async fn connect_events(&self) -> Result<String> {
        let mut body = self.call("rtm.connect", &[]).await?;
        field(&mut body, "url")
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_check_ok_envelope() {
        assert!(check_ok("auth.test", json!({"ok": true, "user_id": "U1"})).is_ok());

        let err = check_ok("users.info", json!({"ok": false, "error": "user_not_found"}))
            .unwrap_err();
        assert!(matches!(
            err,
            ApiError::Remote { ref method, ref error }
                if method == "users.info" && error == "user_not_found"
        ));

        let err = check_ok("users.info", json!({})).unwrap_err();
        assert!(err.to_string().contains("unknown_error"));
    }

    #[test]
    fn test_conversation_page_decoding() {
        let body = json!({
            "ok": true,
            "channels": [
                {"id": "C1", "name": "general", "is_channel": true, "is_member": true},
                {"id": "D1", "is_im": true, "user": "U2", "unread_count": 3}
            ],
            "response_metadata": {"next_cursor": "dXNlcjpVMDYxTkZUVDI="}
        });

        let page: Page<RawConversation> = page(body, "channels").unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[1].user, "U2");
        assert_eq!(page.items[1].unread_count, 3);
        assert!(!page.is_last());
    }

    #[test]
    fn test_missing_list_is_empty_last_page() {
        let page: Page<RawMessage> = page(json!({"ok": true}), "messages").unwrap();
        assert!(page.items.is_empty());
        assert!(page.is_last());
    }

    #[test]
    fn test_conversation_params() {
        let req = ConversationsRequest {
            types: vec!["public_channel", "im"],
            exclude_archived: true,
            limit: 1000,
            cursor: String::new(),
        };
        let params = conversation_params(&req);
        assert!(params.contains(&("types", "public_channel,im".to_string())));
        assert!(!params.iter().any(|(k, _)| *k == "cursor"));
    }

    #[test]
    fn test_api_url_gets_trailing_slash() {
        let client = HttpSlackClient::new("xoxp-test", Some("http://localhost:9000/api"), None)
            .unwrap();
        assert_eq!(client.api_url(), "http://localhost:9000/api/");
    }

    #[test]
    fn test_auth_error_classification() {
        let err = ApiError::Remote {
            method: "conversations.list".into(),
            error: "invalid_auth".into(),
        };
        assert!(err.is_auth());
        assert!(!ApiError::Remote {
            method: "users.info".into(),
            error: "user_not_found".into()
        }
        .is_auth());
    }
}
