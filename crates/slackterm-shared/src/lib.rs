//! Types shared by every slack-term crate: the display model, the remote
//! wire shapes, thread aliasing and the emoji table.

pub mod constants;
pub mod emoji;
pub mod error;
pub mod protocol;
pub mod thread;
pub mod types;

pub use error::ProtocolError;
pub use thread::{thread_alias, ThreadTable};
pub use types::{
    parse_timestamp, ChannelEntry, ConversationKind, Message, Presence, StyleHints, SubKey,
    SubMessage, ThreadReference,
};
