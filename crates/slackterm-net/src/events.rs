//! Live event stream over a websocket, with a tokio mpsc command/event pattern.
//!
//! The socket runs in a dedicated tokio task. Callers steer it through
//! [`StreamCommand`]s and consume decoded [`RemoteEvent`]s. The task reports
//! `Connected` once the handshake succeeds and exactly one `Disconnected`
//! when the transport goes away, after which the event channel closes.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::json;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, trace, warn};

use slackterm_shared::constants::EVENT_PING_INTERVAL_SECS;
use slackterm_shared::protocol::RemoteEvent;

use crate::error::Result;

/// Commands sent *into* the stream task.
#[derive(Debug)]
pub enum StreamCommand {
    /// Close the socket and stop the task.
    Shutdown,
}

/// Connect to `url` and spawn the stream task.
///
/// Fails only if the websocket handshake fails; later transport errors are
/// reported as [`RemoteEvent::Disconnected`].
pub async fn spawn_event_stream(
    url: &str,
) -> Result<(mpsc::Sender<StreamCommand>, mpsc::Receiver<RemoteEvent>)> {
    spawn_event_stream_with_ping(url, Duration::from_secs(EVENT_PING_INTERVAL_SECS)).await
}

pub async fn spawn_event_stream_with_ping(
    url: &str,
    ping_interval: Duration,
) -> Result<(mpsc::Sender<StreamCommand>, mpsc::Receiver<RemoteEvent>)> {
    let (ws, _response) = tokio_tungstenite::connect_async(url).await?;
    info!("Event stream connected");

    let (cmd_tx, mut cmd_rx) = mpsc::channel::<StreamCommand>(16);
    let (event_tx, event_rx) = mpsc::channel::<RemoteEvent>(256);

    tokio::spawn(async move {
        let (mut sink, mut stream) = ws.split();
        let mut ping = tokio::time::interval(ping_interval);
        // The first tick completes immediately.
        ping.tick().await;
        let mut ping_id: u64 = 0;

        if event_tx.send(RemoteEvent::Connected).await.is_err() {
            return;
        }

        let reason = loop {
            tokio::select! {
                cmd = cmd_rx.recv() => {
                    match cmd {
                        Some(StreamCommand::Shutdown) | None => {
                            if let Err(e) = sink.send(Message::Close(None)).await {
                                debug!(error = %e, "Close frame not delivered");
                            }
                            break "shutdown".to_string();
                        }
                    }
                }

                _ = ping.tick() => {
                    ping_id += 1;
                    let frame = json!({ "id": ping_id, "type": "ping" }).to_string();
                    if let Err(e) = sink.send(Message::Text(frame)).await {
                        break e.to_string();
                    }
                }

                frame = stream.next() => {
                    match frame {
                        Some(Ok(Message::Text(text))) => match RemoteEvent::from_json(&text) {
                            Ok(RemoteEvent::Other(kind)) => {
                                trace!(kind = %kind, "Ignoring event");
                            }
                            Ok(event) => {
                                trace!(event = event.label(), "Event received");
                                if event_tx.send(event).await.is_err() {
                                    break "receiver dropped".to_string();
                                }
                            }
                            Err(e) => warn!(error = %e, "Undecodable event frame"),
                        },
                        Some(Ok(Message::Close(frame))) => {
                            break frame
                                .map(|f| f.reason.to_string())
                                .filter(|r| !r.is_empty())
                                .unwrap_or_else(|| "closed by server".to_string());
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => break e.to_string(),
                        None => break "stream ended".to_string(),
                    }
                }
            }
        };

        info!(reason = %reason, "Event stream terminated");
        let _ = event_tx.send(RemoteEvent::Disconnected { reason }).await;
    });

    Ok((cmd_tx, event_rx))
}
