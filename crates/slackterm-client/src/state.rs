//! View model owned by the presentation layer.
//!
//! [`AppState`] holds the channel list, the selection and the messages on
//! screen. It is only mutated from the presentation task; background work
//! reports through [`ClientEvent`](crate::events::ClientEvent)s and the
//! dispatcher's [`StateUpdate`]s.

use tokio::sync::watch;

use slackterm_shared::{ChannelEntry, Message, ThreadReference};

use crate::dispatcher::StateUpdate;

pub struct AppState {
    /// Replaced wholesale on every channel fetch.
    pub channels: Vec<ChannelEntry>,

    /// Id of the channel on screen.
    selected: Option<String>,

    /// History of the selected channel, oldest first.
    pub messages: Vec<Message>,

    /// Thread references of the loaded history.
    pub threads: Vec<ThreadReference>,

    /// Last connection status line.
    pub status: Option<String>,

    /// Whether the live event stream is currently delivering events.
    pub live_events: bool,

    selection_tx: watch::Sender<Option<String>>,
}

impl AppState {
    pub fn new() -> Self {
        let (selection_tx, _) = watch::channel(None);
        Self {
            channels: Vec::new(),
            selected: None,
            messages: Vec::new(),
            threads: Vec::new(),
            status: None,
            live_events: false,
            selection_tx,
        }
    }

    /// Receiver for the dispatcher, always holding the current selection.
    pub fn subscribe_selection(&self) -> watch::Receiver<Option<String>> {
        self.selection_tx.subscribe()
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn selected_channel(&self) -> Option<&ChannelEntry> {
        let id = self.selected.as_deref()?;
        self.channels.iter().find(|c| c.id == id)
    }

    /// Install a freshly fetched list. The selection survives if its channel
    /// is still listed, otherwise the first entry becomes selected.
    pub fn replace_channels(&mut self, channels: Vec<ChannelEntry>) {
        self.channels = channels;

        let still_listed = self
            .selected
            .as_deref()
            .is_some_and(|id| self.channels.iter().any(|c| c.id == id));

        if !still_listed {
            match self.channels.first().map(|c| c.id.clone()) {
                Some(first) => {
                    self.select(&first);
                }
                None => self.set_selection(None),
            }
        }
    }

    /// Select a channel by id. Clears its notification flag and the
    /// messages of the previous selection.
    pub fn select(&mut self, channel_id: &str) -> bool {
        let Some(entry) = self.channels.iter_mut().find(|c| c.id == channel_id) else {
            return false;
        };
        entry.notification = false;

        if self.selected.as_deref() != Some(channel_id) {
            self.messages.clear();
            self.threads.clear();
            self.set_selection(Some(channel_id.to_string()));
        }
        true
    }

    /// Select by display name, returning the channel id.
    pub fn select_by_name(&mut self, name: &str) -> Option<String> {
        let id = self
            .channels
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.id.clone())?;
        self.select(&id);
        Some(id)
    }

    /// Apply a dispatcher update. Returns the channel whose history must be
    /// reloaded, if any.
    pub fn apply(&mut self, update: StateUpdate) -> Option<String> {
        match update {
            StateUpdate::ReloadHistory(channel_id) => {
                (self.selected.as_deref() == Some(channel_id.as_str())).then_some(channel_id)
            }
            StateUpdate::Notify(channel_id) => {
                if let Some(entry) = self.channels.iter_mut().find(|c| c.id == channel_id) {
                    entry.notification = true;
                }
                None
            }
            StateUpdate::Presence { user_id, presence } => {
                for entry in self
                    .channels
                    .iter_mut()
                    .filter(|c| c.is_direct() && c.user_id == user_id)
                {
                    entry.presence = presence;
                }
                None
            }
            StateUpdate::Connection { live, status } => {
                self.live_events = live;
                self.status = Some(status);
                None
            }
            StateUpdate::Status(text) => {
                self.status = Some(text);
                None
            }
        }
    }

    /// After posting to `channel_id`, the history has to be reloaded by hand
    /// unless the event stream will echo the message back.
    pub fn reload_after_send(&self, channel_id: &str) -> bool {
        !self.live_events && self.selected.as_deref() == Some(channel_id)
    }

    /// Install loaded history unless the user has moved on to another
    /// channel in the meantime.
    pub fn accept_history(
        &mut self,
        channel_id: &str,
        messages: Vec<Message>,
        threads: Vec<ThreadReference>,
    ) -> bool {
        if self.selected.as_deref() != Some(channel_id) {
            tracing::debug!(channel = channel_id, "Discarding stale history");
            return false;
        }
        self.messages = messages;
        self.threads = threads;
        true
    }

    fn set_selection(&mut self, selected: Option<String>) {
        self.selected = selected.clone();
        self.selection_tx.send_replace(selected);
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use slackterm_shared::{parse_timestamp, ConversationKind, Presence};

    use super::*;

    fn entries() -> Vec<ChannelEntry> {
        let mut alice = ChannelEntry::new("D1", "alice", ConversationKind::Direct);
        alice.user_id = "U2".into();
        alice.presence = Presence::Away;
        vec![
            ChannelEntry::new("C1", "general", ConversationKind::Channel),
            ChannelEntry::new("C2", "random", ConversationKind::Channel),
            alice,
        ]
    }

    fn msg(id: &str) -> Message {
        Message {
            id: id.into(),
            time: parse_timestamp(id),
            name: "alice".into(),
            content: "hi".into(),
            thread: String::new(),
            messages: Vec::new(),
        }
    }

    #[test]
    fn test_first_entry_is_default_selection() {
        let mut state = AppState::new();
        let selection = state.subscribe_selection();

        state.replace_channels(entries());
        assert_eq!(state.selected(), Some("C1"));
        assert_eq!(selection.borrow().as_deref(), Some("C1"));

        state.select("C2");
        state.replace_channels(entries());
        assert_eq!(state.selected(), Some("C2"));

        state.replace_channels(Vec::new());
        assert_eq!(state.selected(), None);
        assert!(state.selected_channel().is_none());
    }

    #[test]
    fn test_apply_updates() {
        let mut state = AppState::new();
        state.replace_channels(entries());

        assert_eq!(state.apply(StateUpdate::Notify("C2".into())), None);
        assert!(state.channels[1].notification);

        state.apply(StateUpdate::Presence {
            user_id: "U2".into(),
            presence: Presence::Active,
        });
        assert_eq!(state.channels[2].presence, Presence::Active);

        assert_eq!(
            state.apply(StateUpdate::ReloadHistory("C1".into())),
            Some("C1".to_string())
        );
        assert_eq!(state.apply(StateUpdate::ReloadHistory("C2".into())), None);

        state.apply(StateUpdate::Status("Connected".into()));
        assert_eq!(state.status.as_deref(), Some("Connected"));

        assert!(state.select("C2"));
        assert!(!state.channels[1].notification);
        assert!(!state.select("nope"));
    }

    #[test]
    fn test_reload_after_send_follows_stream_liveness() {
        let mut state = AppState::new();
        state.replace_channels(entries());
        assert!(state.reload_after_send("C1"));
        assert!(!state.reload_after_send("C2"));

        state.apply(StateUpdate::Connection {
            live: true,
            status: "Connected".into(),
        });
        assert!(!state.reload_after_send("C1"));

        // Unrelated status lines leave the stream state alone.
        state.apply(StateUpdate::Status("Receiving live events".into()));
        assert!(!state.reload_after_send("C1"));

        state.apply(StateUpdate::Connection {
            live: false,
            status: "Disconnected: stream ended".into(),
        });
        assert!(state.reload_after_send("C1"));
        assert_eq!(state.status.as_deref(), Some("Disconnected: stream ended"));
    }

    #[test]
    fn test_stale_history_is_discarded() {
        let mut state = AppState::new();
        state.replace_channels(entries());

        assert!(state.accept_history("C1", vec![msg("1.0")], Vec::new()));
        assert_eq!(state.messages.len(), 1);

        state.select_by_name("random");
        assert!(state.messages.is_empty());
        assert!(!state.accept_history("C1", vec![msg("2.0")], Vec::new()));
        assert!(state.messages.is_empty());
    }
}
