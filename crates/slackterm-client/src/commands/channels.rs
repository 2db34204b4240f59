use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::events::{emit_event, ClientEvent, EventSender};
use crate::service::SlackService;

pub fn spawn_load_channels(service: Arc<SlackService>, events: EventSender) -> JoinHandle<()> {
    tokio::spawn(async move {
        match service.load_channels().await {
            Ok(channels) => {
                info!(count = channels.len(), "Channel list refreshed");
                emit_event(&events, ClientEvent::ChannelsLoaded(channels));
            }
            Err(e) => {
                warn!(error = %e, "Failed to load channels");
                emit_event(
                    &events,
                    ClientEvent::Failed {
                        operation: "load_channels",
                        error: e.to_string(),
                    },
                );
            }
        }
    })
}

/// Load the history of `channel_id`. The result carries the channel id so
/// the receiver can drop it if the selection changed meanwhile.
pub fn spawn_load_history(
    service: Arc<SlackService>,
    channel_id: String,
    events: EventSender,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        match service.load_history(&channel_id).await {
            Ok((messages, threads)) => emit_event(
                &events,
                ClientEvent::HistoryLoaded {
                    channel_id,
                    messages,
                    threads,
                },
            ),
            Err(e) => {
                warn!(channel = %channel_id, error = %e, "Failed to load history");
                emit_event(
                    &events,
                    ClientEvent::Failed {
                        operation: "load_history",
                        error: e.to_string(),
                    },
                );
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc;

    use slackterm_net::RateLimiter;

    use super::*;
    use crate::config::ClientConfig;
    use crate::identity::IdentityCache;
    use crate::test_utils::{message, public_channel, MockSlackApi};

    async fn service(api: MockSlackApi) -> Arc<SlackService> {
        let api = Arc::new(api.with_auth("U0", "me"));
        let limiter = RateLimiter::default();
        let identities = Arc::new(IdentityCache::without_store(api.clone(), limiter.clone()));
        let service = SlackService::connect_with(api, limiter, identities, ClientConfig::default())
            .await
            .ok()
            .unwrap();
        Arc::new(service)
    }

    #[tokio::test]
    async fn test_load_channels_reports_event() {
        let svc = service(
            MockSlackApi::default().with_conversations(vec![vec![public_channel("C1", "general")]]),
        )
        .await;
        let (tx, mut rx) = mpsc::unbounded_channel();

        spawn_load_channels(svc, tx).await.unwrap();
        match rx.recv().await {
            Some(ClientEvent::ChannelsLoaded(channels)) => assert_eq!(channels[0].id, "C1"),
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_workspace_reports_failure() {
        let svc = service(MockSlackApi::default()).await;
        let (tx, mut rx) = mpsc::unbounded_channel();

        spawn_load_channels(svc, tx).await.unwrap();
        assert!(matches!(
            rx.recv().await,
            Some(ClientEvent::Failed { operation: "load_channels", .. })
        ));
    }

    #[tokio::test]
    async fn test_load_history_carries_channel_id() {
        let svc = service(
            MockSlackApi::default()
                .with_user("U1", "alice")
                .with_history(vec![message("100.0", "U1", "hi")]),
        )
        .await;
        let (tx, mut rx) = mpsc::unbounded_channel();

        spawn_load_history(svc, "C7".into(), tx).await.unwrap();
        match rx.recv().await {
            Some(ClientEvent::HistoryLoaded {
                channel_id,
                messages,
                ..
            }) => {
                assert_eq!(channel_id, "C7");
                assert_eq!(messages.len(), 1);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }
}
