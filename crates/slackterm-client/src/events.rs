//! Results of background work, reported back to the presentation layer.

use tokio::sync::mpsc;

use slackterm_shared::{ChannelEntry, Message, ThreadReference};

#[derive(Debug, Clone)]
pub enum ClientEvent {
    ChannelsLoaded(Vec<ChannelEntry>),
    HistoryLoaded {
        channel_id: String,
        messages: Vec<Message>,
        threads: Vec<ThreadReference>,
    },
    /// A message or command was accepted by the server.
    Sent { channel_id: String },
    Failed {
        operation: &'static str,
        error: String,
    },
}

impl ClientEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ClientEvent::ChannelsLoaded(_) => "channels-loaded",
            ClientEvent::HistoryLoaded { .. } => "history-loaded",
            ClientEvent::Sent { .. } => "sent",
            ClientEvent::Failed { .. } => "failed",
        }
    }
}

pub type EventSender = mpsc::UnboundedSender<ClientEvent>;

pub fn emit_event(tx: &EventSender, event: ClientEvent) {
    let name = event.name();
    if let Err(e) = tx.send(event) {
        tracing::error!(event = name, error = %e, "Failed to emit event");
    }
}
