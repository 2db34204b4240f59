//! JSON shapes exchanged with the remote messaging service.
//!
//! Only the fields the client reads are modelled; everything else in the
//! payloads is ignored. All fields default so that partially populated
//! objects (bot messages, archived conversations, ...) still decode.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ProtocolError;

// ---------------------------------------------------------------------------
// Conversations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Topic {
    pub value: String,
}

/// A conversation as returned by `conversations.list` / `users.conversations`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawConversation {
    pub id: String,
    pub name: String,
    pub is_channel: bool,
    pub is_group: bool,
    pub is_im: bool,
    pub is_mpim: bool,
    pub is_private: bool,
    pub is_member: bool,
    pub is_open: bool,
    pub is_archived: bool,
    /// Counterpart user id for direct messages.
    pub user: String,
    pub unread_count: u64,
    pub topic: Topic,
}

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawField {
    pub title: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawAttachment {
    pub title: String,
    pub text: String,
    pub pretext: String,
    pub fields: Vec<RawField>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawFile {
    pub id: String,
    pub title: String,
    pub url_private: String,
}

/// A history item, thread reply, or the payload of a live message event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawMessage {
    pub user: String,
    pub bot_id: String,
    /// Display name some bots post under.
    pub username: String,
    pub text: String,
    pub ts: String,
    pub thread_ts: String,
    pub subtype: String,
    pub attachments: Vec<RawAttachment>,
    pub files: Vec<RawFile>,
}

impl RawMessage {
    /// A thread parent carries its own timestamp as the thread timestamp.
    pub fn is_thread_parent(&self) -> bool {
        !self.thread_ts.is_empty() && self.thread_ts == self.ts
    }
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawUser {
    pub id: String,
    pub name: String,
    pub real_name: String,
    pub deleted: bool,
}

// ---------------------------------------------------------------------------
// Live events
// ---------------------------------------------------------------------------

/// A message arriving on the live event stream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageEvent {
    #[serde(default)]
    pub channel: String,
    #[serde(flatten)]
    pub message: RawMessage,
    /// Replacement message for `message_changed` events.
    #[serde(rename = "message")]
    pub sub_message: Option<Box<RawMessage>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventErrorBody {
    pub code: i64,
    pub msg: String,
}

/// Typed view of the live event stream.
///
/// `Connected` and `Disconnected` are produced locally by the stream task,
/// everything else is decoded from frames.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteEvent {
    Connected,
    Hello,
    Message(MessageEvent),
    PresenceChange { user: String, presence: String },
    Error(EventErrorBody),
    Goodbye,
    Disconnected { reason: String },
    Other(String),
}

impl RemoteEvent {
    /// Decode one text frame from the event stream.
    pub fn from_json(frame: &str) -> Result<Self, ProtocolError> {
        let value: Value = serde_json::from_str(frame)?;
        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let event = match kind.as_str() {
            "hello" => RemoteEvent::Hello,
            "goodbye" => RemoteEvent::Goodbye,
            "message" => RemoteEvent::Message(serde_json::from_value(value)?),
            "presence_change" => {
                let user = value
                    .get("user")
                    .and_then(Value::as_str)
                    .ok_or(ProtocolError::MissingField("user"))?
                    .to_string();
                let presence = value
                    .get("presence")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                RemoteEvent::PresenceChange { user, presence }
            }
            "error" => {
                let body = value
                    .get("error")
                    .cloned()
                    .map(serde_json::from_value)
                    .transpose()?
                    .unwrap_or_default();
                RemoteEvent::Error(body)
            }
            _ => RemoteEvent::Other(kind),
        };

        Ok(event)
    }

    /// Short label used in log lines.
    pub fn label(&self) -> &str {
        match self {
            RemoteEvent::Connected => "connected",
            RemoteEvent::Hello => "hello",
            RemoteEvent::Message(_) => "message",
            RemoteEvent::PresenceChange { .. } => "presence_change",
            RemoteEvent::Error(_) => "error",
            RemoteEvent::Goodbye => "goodbye",
            RemoteEvent::Disconnected { .. } => "disconnected",
            RemoteEvent::Other(kind) => kind,
        }
    }
}
