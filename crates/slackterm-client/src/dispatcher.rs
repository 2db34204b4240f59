//! Correlates live events with the current view.
//!
//! The dispatcher task consumes [`RemoteEvent`]s from the event stream and
//! turns each into at most one [`StateUpdate`] for the presentation layer.
//! It never touches the channel list itself; the selection is read from a
//! `watch` channel written by whoever owns the view.

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use slackterm_shared::protocol::RemoteEvent;
use slackterm_shared::Presence;

#[derive(Debug, Clone, PartialEq)]
pub enum StateUpdate {
    /// A message arrived in the channel on screen; reload its history.
    ReloadHistory(String),
    /// A new message arrived in another channel.
    Notify(String),
    Presence { user_id: String, presence: Presence },
    /// The event stream came up or went away.
    Connection { live: bool, status: String },
    /// Server notices and errors for the status line.
    Status(String),
}

/// Edits, deletions and reply bookkeeping change existing history but are
/// not new activity.
fn is_new_message(subtype: &str) -> bool {
    !matches!(
        subtype,
        "message_changed" | "message_deleted" | "message_replied"
    )
}

pub fn correlate(event: &RemoteEvent, selected: Option<&str>) -> Option<StateUpdate> {
    match event {
        RemoteEvent::Message(ev) if ev.channel.is_empty() => None,
        RemoteEvent::Message(ev) => {
            if selected == Some(ev.channel.as_str()) {
                Some(StateUpdate::ReloadHistory(ev.channel.clone()))
            } else if is_new_message(&ev.message.subtype) {
                Some(StateUpdate::Notify(ev.channel.clone()))
            } else {
                None
            }
        }
        RemoteEvent::PresenceChange { user, presence } => Some(StateUpdate::Presence {
            user_id: user.clone(),
            presence: Presence::from_remote(presence),
        }),
        RemoteEvent::Connected => Some(StateUpdate::Connection {
            live: true,
            status: "Connected".to_string(),
        }),
        RemoteEvent::Hello => Some(StateUpdate::Status("Receiving live events".to_string())),
        RemoteEvent::Goodbye => Some(StateUpdate::Status(
            "Server is closing the event stream".to_string(),
        )),
        RemoteEvent::Error(body) => Some(StateUpdate::Status(format!(
            "Event stream error {}: {}",
            body.code, body.msg
        ))),
        RemoteEvent::Disconnected { reason } => Some(StateUpdate::Connection {
            live: false,
            status: format!("Disconnected: {reason}"),
        }),
        RemoteEvent::Other(_) => None,
    }
}

/// Spawn the dispatcher loop. It ends when the event channel closes.
pub fn spawn_dispatcher(
    mut events: mpsc::Receiver<RemoteEvent>,
    selection: watch::Receiver<Option<String>>,
    sink: mpsc::Sender<StateUpdate>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            let update = {
                let selected = selection.borrow();
                correlate(&event, selected.as_deref())
            };

            match &event {
                RemoteEvent::Error(body) => {
                    warn!(code = body.code, msg = %body.msg, "Event stream error")
                }
                RemoteEvent::Disconnected { reason } => {
                    warn!(reason = %reason, "Event stream disconnected")
                }
                other => debug!(event = other.label(), ?update, "Event dispatched"),
            }

            if let Some(update) = update {
                if sink.send(update).await.is_err() {
                    debug!("State update receiver gone, dropping update");
                }
            }
        }

        info!("Dispatcher terminated");
    })
}

#[cfg(test)]
mod tests {
    use slackterm_shared::protocol::{EventErrorBody, MessageEvent};

    use super::*;
    use crate::test_utils::message;

    fn message_in(channel: &str) -> RemoteEvent {
        RemoteEvent::Message(MessageEvent {
            channel: channel.to_string(),
            message: message("1.0", "U1", "hi"),
            sub_message: None,
        })
    }

    #[test]
    fn test_correlate_messages() {
        assert_eq!(
            correlate(&message_in("C1"), Some("C1")),
            Some(StateUpdate::ReloadHistory("C1".into()))
        );
        assert_eq!(
            correlate(&message_in("C2"), Some("C1")),
            Some(StateUpdate::Notify("C2".into()))
        );
        assert_eq!(
            correlate(&message_in("C2"), None),
            Some(StateUpdate::Notify("C2".into()))
        );
        assert_eq!(correlate(&message_in(""), Some("C1")), None);
    }

    #[test]
    fn test_only_new_messages_notify() {
        for subtype in ["message_changed", "message_deleted", "message_replied"] {
            let mut event = message_in("C2");
            if let RemoteEvent::Message(ev) = &mut event {
                ev.message.subtype = subtype.to_string();
            }
            assert_eq!(correlate(&event, Some("C1")), None, "{subtype}");
            assert_eq!(
                correlate(&event, Some("C2")),
                Some(StateUpdate::ReloadHistory("C2".into())),
                "{subtype}"
            );
        }

        let mut broadcast = message_in("C2");
        if let RemoteEvent::Message(ev) = &mut broadcast {
            ev.message.subtype = "thread_broadcast".to_string();
        }
        assert_eq!(
            correlate(&broadcast, Some("C1")),
            Some(StateUpdate::Notify("C2".into()))
        );
    }

    #[test]
    fn test_correlate_presence_and_lifecycle() {
        let presence = RemoteEvent::PresenceChange {
            user: "U2".into(),
            presence: "active".into(),
        };
        assert_eq!(
            correlate(&presence, None),
            Some(StateUpdate::Presence {
                user_id: "U2".into(),
                presence: Presence::Active
            })
        );

        let error = RemoteEvent::Error(EventErrorBody {
            code: 1,
            msg: "Socket URL has expired".into(),
        });
        assert!(matches!(
            correlate(&error, None),
            Some(StateUpdate::Status(text)) if text.contains("expired")
        ));
        assert!(matches!(
            correlate(&RemoteEvent::Connected, None),
            Some(StateUpdate::Connection { live: true, .. })
        ));
        assert_eq!(correlate(&RemoteEvent::Other("user_typing".into()), None), None);
    }

    #[tokio::test]
    async fn test_dispatcher_follows_selection() {
        let (event_tx, event_rx) = mpsc::channel(8);
        let (select_tx, select_rx) = watch::channel(Some("C1".to_string()));
        let (update_tx, mut update_rx) = mpsc::channel(8);

        let handle = spawn_dispatcher(event_rx, select_rx, update_tx);

        event_tx.send(message_in("C1")).await.unwrap();
        assert_eq!(
            update_rx.recv().await,
            Some(StateUpdate::ReloadHistory("C1".into()))
        );

        select_tx.send(Some("C2".to_string())).unwrap();
        event_tx.send(message_in("C1")).await.unwrap();
        assert_eq!(update_rx.recv().await, Some(StateUpdate::Notify("C1".into())));

        // Ignored events produce nothing and the loop keeps going.
        event_tx.send(RemoteEvent::Other("pong".into())).await.unwrap();
        event_tx
            .send(RemoteEvent::Disconnected {
                reason: "stream ended".into(),
            })
            .await
            .unwrap();
        assert!(matches!(
            update_rx.recv().await,
            Some(StateUpdate::Connection { live: false, status }) if status.contains("stream ended")
        ));

        drop(event_tx);
        handle.await.unwrap();
        assert_eq!(update_rx.recv().await, None);
    }
}
