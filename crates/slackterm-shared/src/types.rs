use std::fmt;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Conversation kinds
// ---------------------------------------------------------------------------

/// The four conversation surfaces the remote service exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationKind {
    Channel,
    Group,
    MultiParty,
    Direct,
}

impl ConversationKind {
    /// Bucket order of the aggregated sidebar. The first entry after
    /// aggregation is the default selection, so this order is part of the
    /// contract with the presentation layer.
    pub const ORDER: [ConversationKind; 4] = [
        ConversationKind::Channel,
        ConversationKind::Group,
        ConversationKind::MultiParty,
        ConversationKind::Direct,
    ];

    /// Position of this kind in [`ConversationKind::ORDER`].
    pub fn bucket_index(self) -> usize {
        match self {
            ConversationKind::Channel => 0,
            ConversationKind::Group => 1,
            ConversationKind::MultiParty => 2,
            ConversationKind::Direct => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ConversationKind::Channel => "channel",
            ConversationKind::Group => "group",
            ConversationKind::MultiParty => "mpim",
            ConversationKind::Direct => "im",
        }
    }
}

impl fmt::Display for ConversationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Presence
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Presence {
    Active,
    Away,
    #[default]
    Unknown,
}

impl Presence {
    /// Parse the remote presence string (`"active"` / `"away"`).
    pub fn from_remote(value: &str) -> Self {
        match value {
            "active" => Presence::Active,
            "away" => Presence::Away,
            _ => Presence::Unknown,
        }
    }
}

// ---------------------------------------------------------------------------
// ChannelEntry
// ---------------------------------------------------------------------------

/// Display style hints carried through untouched for the renderer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleHints {
    pub prefix: String,
    pub icon: String,
    pub text: String,
}

/// One conversation surface in the aggregated sidebar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelEntry {
    /// Remote conversation id, unique within an aggregated list.
    pub id: String,
    /// Display name. For direct messages this is the counterpart's
    /// resolved name, never the raw remote field.
    pub name: String,
    pub topic: String,
    /// Counterpart user id for direct messages, empty otherwise.
    pub user_id: String,
    pub presence: Presence,
    kind: ConversationKind,
    /// Set when the remote reported unread messages, or a live event
    /// arrived for a channel that is not selected.
    pub notification: bool,
    pub style: StyleHints,
}

impl ChannelEntry {
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: ConversationKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            topic: String::new(),
            user_id: String::new(),
            presence: Presence::Unknown,
            kind,
            notification: false,
            style: StyleHints::default(),
        }
    }

    pub fn kind(&self) -> ConversationKind {
        self.kind
    }

    pub fn is_direct(&self) -> bool {
        self.kind == ConversationKind::Direct
    }
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// Key of a nested sub-message.
///
/// Attachments and files carry no timestamp of their own, so they are keyed
/// by a local sequence number and the remote file id respectively.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubKey {
    Attachment(usize),
    File(String),
    Reply(String),
}

impl fmt::Display for SubKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubKey::Attachment(index) => write!(f, "{index}"),
            SubKey::File(id) | SubKey::Reply(id) => f.write_str(id),
        }
    }
}

/// A nested attachment, file or thread reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubMessage {
    pub key: SubKey,
    pub message: Message,
}

/// One displayable unit of conversation content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Remote timestamp string (`"1700000000.000100"`), used as both the
    /// ordering key and the primary key within a channel.
    pub id: String,
    pub time: DateTime<Utc>,
    pub name: String,
    pub content: String,
    /// Thread alias when this message is a thread parent, empty otherwise.
    pub thread: String,
    /// Attachments, files and replies. Always one level deep.
    pub messages: Vec<SubMessage>,
}

impl Message {
    pub fn is_thread_parent(&self) -> bool {
        !self.thread.is_empty()
    }

    /// Look up a nested sub-message by key.
    pub fn sub(&self, key: &SubKey) -> Option<&Message> {
        self.messages
            .iter()
            .find(|sub| &sub.key == key)
            .map(|sub| &sub.message)
    }

    /// Nested replies in the order they were attached.
    pub fn replies(&self) -> impl Iterator<Item = &Message> {
        self.messages
            .iter()
            .filter(|sub| matches!(sub.key, SubKey::Reply(_)))
            .map(|sub| &sub.message)
    }
}

/// Convert a remote timestamp string into a display time. Unparseable
/// values map to the epoch.
pub fn parse_timestamp(ts: &str) -> DateTime<Utc> {
    let secs = ts.parse::<f64>().map(|f| f as i64).unwrap_or(0);
    Utc.timestamp_opt(secs, 0).single().unwrap_or_default()
}

// ---------------------------------------------------------------------------
// ThreadReference
// ---------------------------------------------------------------------------

/// A short, typeable alias for a thread's real timestamp identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ThreadReference {
    pub alias: String,
    pub thread_ts: String,
}
