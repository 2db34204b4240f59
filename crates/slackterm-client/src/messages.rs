//! Turning raw history items and live events into display messages.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{debug, info, warn};

use slackterm_net::{HistoryRequest, RateLimiter, RepliesRequest, SlackApi};
use slackterm_shared::constants::REPLIES_PAGE_LIMIT;
use slackterm_shared::protocol::{MessageEvent, RawAttachment, RawFile, RawMessage};
use slackterm_shared::{parse_timestamp, Message, SubKey, SubMessage, ThreadReference, ThreadTable};

use crate::error::{ClientError, Result};
use crate::format::BodyFormatter;
use crate::identity::IdentityCache;

pub const EDITED_SUFFIX: &str = " (edited)";

pub struct MessageBuilder {
    api: Arc<dyn SlackApi>,
    limiter: RateLimiter,
    identities: Arc<IdentityCache>,
    formatter: BodyFormatter,
    threads: Arc<ThreadTable>,
}

impl MessageBuilder {
    pub fn new(
        api: Arc<dyn SlackApi>,
        limiter: RateLimiter,
        identities: Arc<IdentityCache>,
        threads: Arc<ThreadTable>,
        emoji: bool,
    ) -> Self {
        let formatter = BodyFormatter::new(identities.clone(), emoji);
        Self {
            api,
            limiter,
            identities,
            formatter,
            threads,
        }
    }

    /// Load up to `count` messages from the last `days_back` days, oldest
    /// first, along with a reference for every thread parent among them.
    pub async fn build_history(
        &self,
        channel_id: &str,
        count: u32,
        days_back: u32,
    ) -> Result<(Vec<Message>, Vec<ThreadReference>)> {
        self.limiter.acquire().await;

        // A window reaching past the representable range means no lower bound.
        let oldest = Utc::now()
            .checked_sub_signed(Duration::days(i64::from(days_back)))
            .map_or(0, |t| t.timestamp().max(0));
        let req = HistoryRequest {
            channel: channel_id.to_string(),
            limit: count,
            oldest: oldest.to_string(),
            inclusive: false,
            ..Default::default()
        };
        let page = self.api.history(&req).await?;

        let mut messages = Vec::with_capacity(page.items.len());
        let mut threads = Vec::new();
        for raw in &page.items {
            let msg = self.build_message(raw, channel_id).await;
            if msg.is_thread_parent() {
                threads.push(ThreadReference {
                    alias: msg.thread.clone(),
                    thread_ts: raw.ts.clone(),
                });
            }
            messages.push(msg);
        }

        // The API answers newest first.
        messages.reverse();

        info!(
            channel = channel_id,
            messages = messages.len(),
            threads = threads.len(),
            "History loaded"
        );
        Ok((messages, threads))
    }

    /// Fetch the single message with timestamp `ts`.
    pub async fn message_by_id(&self, channel_id: &str, ts: &str) -> Result<Option<Message>> {
        self.limiter.acquire().await;

        let req = HistoryRequest {
            channel: channel_id.to_string(),
            limit: 1,
            latest: ts.to_string(),
            inclusive: true,
            ..Default::default()
        };
        let page = self.api.history(&req).await?;

        match page.items.first() {
            Some(raw) => Ok(Some(self.build_message(raw, channel_id).await)),
            None => Ok(None),
        }
    }

    pub async fn build_from_live_event(
        &self,
        event: &MessageEvent,
        channel_id: &str,
    ) -> Result<Message> {
        match event.message.subtype.as_str() {
            "message_changed" => {
                let mut raw = event
                    .sub_message
                    .as_deref()
                    .cloned()
                    .ok_or_else(|| ClientError::IgnoredEvent("message_changed".to_string()))?;
                raw.text.push_str(EDITED_SUFFIX);
                Ok(self.build_message(&raw, channel_id).await)
            }
            subtype @ ("message_replied" | "message_deleted") => {
                Err(ClientError::IgnoredEvent(subtype.to_string()))
            }
            _ => Ok(self.build_message(&event.message, channel_id).await),
        }
    }

    /// A full message: body, attachments, files and, for thread parents,
    /// the thread's replies.
    async fn build_message(&self, raw: &RawMessage, channel_id: &str) -> Message {
        let mut msg = self.build_leaf(raw).await;

        if raw.is_thread_parent() {
            let reference = self.threads.register(&raw.ts);
            msg.thread = reference.alias;

            match self.fetch_replies(channel_id, &raw.ts).await {
                Ok(replies) => {
                    for reply in replies
                        .iter()
                        .filter(|r| r.ts != raw.ts && !r.is_thread_parent())
                    {
                        let message = self.build_leaf(reply).await;
                        msg.messages.push(SubMessage {
                            key: SubKey::Reply(reply.ts.clone()),
                            message,
                        });
                    }
                }
                Err(e) => {
                    warn!(channel = channel_id, thread = %raw.ts, error = %e, "Could not load thread replies");
                }
            }
        }

        msg
    }

    /// Everything except thread replies; replies themselves are built this
    /// way so threads never nest.
    async fn build_leaf(&self, raw: &RawMessage) -> Message {
        let time = parse_timestamp(&raw.ts);
        let mut messages = Vec::new();

        for (index, content) in flatten_attachments(&raw.attachments).into_iter().enumerate() {
            messages.push(SubMessage {
                key: SubKey::Attachment(index),
                message: content_only(index.to_string(), time, content),
            });
        }

        for file in &raw.files {
            messages.push(SubMessage {
                key: SubKey::File(file.id.clone()),
                message: content_only(file.id.clone(), time, file_line(file)),
            });
        }

        Message {
            id: raw.ts.clone(),
            time,
            name: self.author_name(raw).await,
            content: self.formatter.format(&raw.text).await,
            thread: String::new(),
            messages,
        }
    }

    async fn author_name(&self, raw: &RawMessage) -> String {
        if !raw.user.is_empty() {
            return self.identities.resolve_or_placeholder(&raw.user).await;
        }
        if raw.bot_id.is_empty() {
            return "unknown".to_string();
        }
        if raw.username.is_empty() {
            "unknown bot".to_string()
        } else {
            raw.username.clone()
        }
    }

    async fn fetch_replies(&self, channel_id: &str, thread_ts: &str) -> Result<Vec<RawMessage>> {
        let mut req = RepliesRequest {
            channel: channel_id.to_string(),
            ts: thread_ts.to_string(),
            limit: REPLIES_PAGE_LIMIT,
            cursor: String::new(),
        };
        let mut replies = Vec::new();

        loop {
            self.limiter.acquire().await;
            let page = self.api.replies(&req).await?;
            replies.extend(page.items);

            if page.next_cursor.is_empty() {
                break;
            }
            req.cursor = page.next_cursor;
        }

        debug!(thread = thread_ts, count = replies.len(), "Thread replies fetched");
        Ok(replies)
    }
}

fn content_only(id: String, time: chrono::DateTime<Utc>, content: String) -> Message {
    Message {
        id,
        time,
        name: String::new(),
        content,
        thread: String::new(),
        messages: Vec::new(),
    }
}

/// One line per field (`"title value"`), then pretext, text and title.
pub fn flatten_attachments(attachments: &[RawAttachment]) -> Vec<String> {
    let mut lines = Vec::new();
    for att in attachments {
        for field in &att.fields {
            lines.push(format!("{} {}", field.title, field.value));
        }
        for part in [&att.pretext, &att.text, &att.title] {
            if !part.is_empty() {
                lines.push(part.clone());
            }
        }
    }
    lines
}

fn file_line(file: &RawFile) -> String {
    format!("{} {}", file.title, file.url_private)
}
