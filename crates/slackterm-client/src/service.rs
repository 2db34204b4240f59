//! [`SlackService`]: the single entry point the presentation layer talks to.
//!
//! It owns the remote client, the shared rate limiter, the identity cache
//! and the thread table, and hands them to the aggregator and the message
//! builder so that every outbound call shares one token bucket.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{info, warn};

use slackterm_net::{
    spawn_event_stream, HttpSlackClient, PostMessage, RateLimiter, SlackApi, StreamCommand,
};
use slackterm_shared::constants::APP_NAME;
use slackterm_shared::protocol::{MessageEvent, RemoteEvent};
use slackterm_shared::{ChannelEntry, Message, Presence, ThreadReference, ThreadTable};

use crate::channels::ChannelAggregator;
use crate::commands::messaging::SlashCommand;
use crate::config::ClientConfig;
use crate::error::{ClientError, Result, UnresolvedUser};
use crate::identity::IdentityCache;
use crate::messages::MessageBuilder;

pub struct SlackService {
    api: Arc<dyn SlackApi>,
    limiter: RateLimiter,
    identities: Arc<IdentityCache>,
    threads: Arc<ThreadTable>,
    aggregator: ChannelAggregator,
    builder: MessageBuilder,
    config: ClientConfig,
    current_user_id: String,
    current_username: String,
}

impl SlackService {
    /// Authenticate against the workspace. Fails if the token is rejected.
    pub async fn connect(config: ClientConfig) -> Result<Self> {
        let api: Arc<dyn SlackApi> = Arc::new(HttpSlackClient::new(
            config.token.clone(),
            config.api_url.as_deref(),
            config.cookie.clone(),
        )?);
        let limiter = RateLimiter::new(config.rate_tokens, config.rate_interval);
        let identities = Arc::new(IdentityCache::open_default(api.clone(), limiter.clone()));

        Self::connect_with(api, limiter, identities, config).await
    }

    /// Like [`connect`](Self::connect) with caller-provided collaborators.
    pub async fn connect_with(
        api: Arc<dyn SlackApi>,
        limiter: RateLimiter,
        identities: Arc<IdentityCache>,
        config: ClientConfig,
    ) -> Result<Self> {
        limiter.acquire().await;
        let me = api.auth_test().await?;

        let current_username = if !me.user.is_empty() {
            identities.prime(&me.user_id, &me.user);
            me.user.clone()
        } else {
            match identities.resolve(&me.user_id).await {
                Ok(name) => name,
                Err(_) => APP_NAME.to_string(),
            }
        };
        info!(user = %current_username, team = %me.team, "Authenticated");

        let threads = Arc::new(ThreadTable::new());
        let aggregator = ChannelAggregator::new(api.clone(), limiter.clone(), identities.clone());
        let builder = MessageBuilder::new(
            api.clone(),
            limiter.clone(),
            identities.clone(),
            threads.clone(),
            config.emoji,
        );

        let service = Self {
            api,
            limiter,
            identities,
            threads,
            aggregator,
            builder,
            config,
            current_user_id: me.user_id,
            current_username,
        };

        if let Err(e) = service.set_user_as_active().await {
            warn!(error = %e, "Could not set presence");
        }

        Ok(service)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn current_user_id(&self) -> &str {
        &self.current_user_id
    }

    pub fn current_username(&self) -> &str {
        &self.current_username
    }

    pub fn threads(&self) -> &ThreadTable {
        &self.threads
    }

    // -----------------------------------------------------------------------
    // Channels and identities
    // -----------------------------------------------------------------------

    pub async fn fetch_all(&self, include_public: bool) -> Result<Vec<ChannelEntry>> {
        self.aggregator.fetch_all(include_public).await
    }

    /// The sidebar list for the configured mode. An empty list is an error:
    /// there is nothing to show.
    pub async fn load_channels(&self) -> Result<Vec<ChannelEntry>> {
        let channels = if self.config.enterprise {
            self.aggregator.fetch_for_user().await?
        } else {
            self.aggregator.fetch_all(true).await?
        };

        if channels.is_empty() {
            return Err(ClientError::NoChannels);
        }
        Ok(channels)
    }

    pub async fn resolve(&self, user_id: &str) -> std::result::Result<String, UnresolvedUser> {
        self.identities.resolve(user_id).await
    }

    pub async fn presence(&self, user_id: &str) -> Result<Presence> {
        self.aggregator.presence(user_id).await
    }

    // -----------------------------------------------------------------------
    // Messages
    // -----------------------------------------------------------------------

    pub async fn build_history(
        &self,
        channel_id: &str,
        count: u32,
        days_back: u32,
    ) -> Result<(Vec<Message>, Vec<ThreadReference>)> {
        self.builder.build_history(channel_id, count, days_back).await
    }

    /// History with the configured count and time window.
    pub async fn load_history(&self, channel_id: &str) -> Result<(Vec<Message>, Vec<ThreadReference>)> {
        self.builder
            .build_history(channel_id, self.config.history_count, self.config.history_days)
            .await
    }

    pub async fn build_from_live_event(
        &self,
        event: &MessageEvent,
        channel_id: &str,
    ) -> Result<Message> {
        self.builder.build_from_live_event(event, channel_id).await
    }

    pub async fn message_by_id(&self, channel_id: &str, ts: &str) -> Result<Option<Message>> {
        self.builder.message_by_id(channel_id, ts).await
    }

    // -----------------------------------------------------------------------
    // Sending
    // -----------------------------------------------------------------------

    pub async fn send_message(&self, channel_id: &str, text: &str) -> Result<()> {
        self.post(channel_id, text, "").await
    }

    pub async fn send_reply(&self, channel_id: &str, thread_ts: &str, text: &str) -> Result<()> {
        self.post(channel_id, text, thread_ts).await
    }

    /// Run a slash command typed by the user. `/thread <alias> <text>`
    /// replies to a known thread; anything else goes to the server as is.
    pub async fn send_command(&self, channel_id: &str, input: &str) -> Result<()> {
        match SlashCommand::parse(input)? {
            SlashCommand::Thread { alias, text } => {
                let thread_ts = self
                    .threads
                    .lookup(&alias)
                    .ok_or(ClientError::UnknownThread(alias))?;
                self.send_reply(channel_id, &thread_ts, &text).await
            }
            SlashCommand::Remote { command, text } => {
                self.limiter.acquire().await;
                self.api.send_command(channel_id, &command, &text).await?;
                info!(channel = channel_id, command = %command, "Command sent");
                Ok(())
            }
        }
    }

    /// Send a line of input: slash commands are executed, anything else is
    /// posted as a message.
    pub async fn submit(&self, channel_id: &str, input: &str) -> Result<()> {
        if SlashCommand::is_command(input) {
            self.send_command(channel_id, input).await
        } else {
            self.send_message(channel_id, input).await
        }
    }

    /// Move the read marker of a conversation to now.
    pub async fn mark_as_read(&self, channel_id: &str) -> Result<()> {
        let ts = format!("{:.6}", Utc::now().timestamp() as f64);
        self.limiter.acquire().await;
        self.api.mark_read(channel_id, &ts).await?;
        Ok(())
    }

    pub async fn set_user_as_active(&self) -> Result<()> {
        self.limiter.acquire().await;
        self.api.set_presence("auto").await?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Live events
    // -----------------------------------------------------------------------

    pub async fn open_event_stream(
        &self,
    ) -> Result<(mpsc::Sender<StreamCommand>, mpsc::Receiver<RemoteEvent>)> {
        self.limiter.acquire().await;
        let url = self.api.connect_events().await?;
        Ok(spawn_event_stream(&url).await?)
    }

    async fn post(&self, channel_id: &str, text: &str, thread_ts: &str) -> Result<()> {
        let msg = PostMessage {
            channel: channel_id.to_string(),
            text: text.to_string(),
            thread_ts: thread_ts.to_string(),
            username: self.current_username.clone(),
        };
        self.limiter.acquire().await;
        self.api.post_message(&msg).await?;
        info!(channel = channel_id, thread = thread_ts, "Message sent");
        Ok(())
    }
}
