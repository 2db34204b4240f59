//! Conversation listing: fetch every page, classify into buckets, order.
//!
//! The resulting list is always channels, then private groups, then
//! multi-party conversations, then direct messages, each bucket sorted by
//! name. The first entry is the default selection.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info};

use slackterm_net::api::{TYPE_IM, TYPE_MPIM, TYPE_PRIVATE_CHANNEL, TYPE_PUBLIC_CHANNEL};
use slackterm_net::{ConversationsRequest, RateLimiter, SlackApi};
use slackterm_shared::constants::{unknown_user, CONVERSATION_PAGE_LIMIT};
use slackterm_shared::protocol::RawConversation;
use slackterm_shared::{ChannelEntry, ConversationKind, Presence};

use crate::error::Result;
use crate::identity::IdentityCache;

/// Bucket for a raw conversation, or `None` if it should not be listed.
///
/// With `members_only`, channels and groups the user has not joined are
/// dropped. Multi-party conversations are only listed while open.
pub fn classify(raw: &RawConversation, members_only: bool) -> Option<ConversationKind> {
    if raw.is_im {
        return Some(ConversationKind::Direct);
    }

    if members_only && !raw.is_member {
        return None;
    }

    if raw.is_mpim {
        return raw.is_open.then_some(ConversationKind::MultiParty);
    }

    if raw.is_group || (raw.is_channel && raw.is_private) {
        return Some(ConversationKind::Group);
    }

    raw.is_channel.then_some(ConversationKind::Channel)
}

pub struct ChannelAggregator {
    api: Arc<dyn SlackApi>,
    limiter: RateLimiter,
    identities: Arc<IdentityCache>,
}

impl ChannelAggregator {
    pub fn new(api: Arc<dyn SlackApi>, limiter: RateLimiter, identities: Arc<IdentityCache>) -> Self {
        Self {
            api,
            limiter,
            identities,
        }
    }

    /// List every conversation in the workspace the user can see.
    ///
    /// Enumerating public channels is slow in large organisations, so
    /// `include_public = false` leaves them out of both the request and
    /// the result. Any failed page aborts the whole fetch.
    pub async fn fetch_all(&self, include_public: bool) -> Result<Vec<ChannelEntry>> {
        let mut types = vec![TYPE_PRIVATE_CHANNEL, TYPE_IM, TYPE_MPIM];
        if include_public {
            types.insert(0, TYPE_PUBLIC_CHANNEL);
        }

        let raw = self.paginate(types, false).await?;
        let entries = self.aggregate(raw, include_public, true).await;
        info!(count = entries.len(), include_public, "Channels loaded");
        Ok(entries)
    }

    /// List only the conversations the user belongs to.
    pub async fn fetch_for_user(&self) -> Result<Vec<ChannelEntry>> {
        let types = vec![TYPE_PUBLIC_CHANNEL, TYPE_PRIVATE_CHANNEL, TYPE_IM, TYPE_MPIM];

        let raw = self.paginate(types, true).await?;
        let entries = self.aggregate(raw, true, false).await;
        info!(count = entries.len(), "User conversations loaded");
        Ok(entries)
    }

    pub async fn presence(&self, user_id: &str) -> Result<Presence> {
        self.limiter.acquire().await;
        let presence = self.api.user_presence(user_id).await?;
        Ok(Presence::from_remote(&presence))
    }

    async fn paginate(
        &self,
        types: Vec<&'static str>,
        user_scoped: bool,
    ) -> Result<Vec<RawConversation>> {
        let mut req = ConversationsRequest {
            types,
            exclude_archived: true,
            limit: CONVERSATION_PAGE_LIMIT,
            cursor: String::new(),
        };
        let mut all = Vec::new();
        let mut pages = 0usize;

        loop {
            self.limiter.acquire().await;
            let page = if user_scoped {
                self.api.user_conversations(&req).await?
            } else {
                self.api.list_conversations(&req).await?
            };

            pages += 1;
            all.extend(page.items);

            if page.next_cursor.is_empty() {
                break;
            }
            req.cursor = page.next_cursor;
        }

        debug!(pages, count = all.len(), "Conversation pages fetched");
        Ok(all)
    }

    async fn aggregate(
        &self,
        raw: Vec<RawConversation>,
        include_public: bool,
        members_only: bool,
    ) -> Vec<ChannelEntry> {
        let mut buckets: [Vec<ChannelEntry>; 4] = Default::default();
        let mut seen_ids: HashSet<String> = HashSet::new();
        let mut seen_users: HashSet<String> = HashSet::new();

        for conv in raw {
            let Some(kind) = classify(&conv, members_only) else {
                continue;
            };
            if kind == ConversationKind::Channel && !include_public {
                continue;
            }
            if seen_ids.contains(&conv.id) {
                continue;
            }

            let mut entry = ChannelEntry::new(conv.id.clone(), conv.name.clone(), kind);
            entry.topic = conv.topic.value;
            entry.user_id = conv.user;
            entry.notification = conv.unread_count > 0;

            if kind == ConversationKind::Direct {
                if seen_users.contains(&entry.user_id) {
                    continue;
                }
                // Counterparts that cannot be resolved (deleted users, for
                // instance) are left out.
                match self.identities.resolve(&entry.user_id).await {
                    Ok(name) if name != unknown_user(&entry.user_id) => entry.name = name,
                    _ => {
                        debug!(channel = %entry.id, user = %entry.user_id, "Skipping unresolvable direct message");
                        continue;
                    }
                }
                entry.presence = Presence::Away;
                seen_users.insert(entry.user_id.clone());
            }

            seen_ids.insert(entry.id.clone());
            buckets[kind.bucket_index()].push(entry);
        }

        for bucket in &mut buckets {
            bucket.sort_by(|a, b| a.name.cmp(&b.name));
        }

        ConversationKind::ORDER
            .iter()
            .flat_map(|kind| std::mem::take(&mut buckets[kind.bucket_index()]))
            .collect()
    }
}
