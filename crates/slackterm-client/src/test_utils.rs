//! In-memory [`SlackApi`] double shared by the unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use slackterm_net::{
    ApiError, AuthIdentity, ConversationsRequest, HistoryRequest, Page, PostMessage,
    RepliesRequest, Result, SlackApi,
};
use slackterm_shared::protocol::{RawConversation, RawMessage, RawUser, Topic};

#[derive(Debug, Default)]
pub struct CallCounts {
    pub user_info: AtomicUsize,
    pub list_conversations: AtomicUsize,
    pub user_conversations: AtomicUsize,
    pub history: AtomicUsize,
    pub replies: AtomicUsize,
}

#[derive(Debug, Default)]
pub struct MockSlackApi {
    pub users: HashMap<String, String>,
    pub presences: HashMap<String, String>,
    /// Pages served in order; the cursor is the page index.
    pub conversation_pages: Vec<Vec<RawConversation>>,
    /// Page index that answers with an error.
    pub fail_conversations_at: Option<usize>,
    /// Newest first, like the remote API.
    pub history: Vec<RawMessage>,
    pub fail_history: bool,
    /// Thread ts → pages of `conversations.replies`.
    pub replies: HashMap<String, Vec<Vec<RawMessage>>>,
    pub fail_replies: bool,
    pub auth: Option<AuthIdentity>,

    pub calls: CallCounts,
    pub history_requests: Mutex<Vec<HistoryRequest>>,
    pub posted: Mutex<Vec<PostMessage>>,
    pub commands: Mutex<Vec<(String, String, String)>>,
    pub marked: Mutex<Vec<(String, String)>>,
    pub presence_set: Mutex<Vec<String>>,
}

fn remote(method: &str, error: &str) -> ApiError {
    ApiError::Remote {
        method: method.to_string(),
        error: error.to_string(),
    }
}

fn page_at<T: Clone>(pages: &[Vec<T>], cursor: &str) -> Page<T> {
    let index: usize = if cursor.is_empty() {
        0
    } else {
        cursor.parse().unwrap_or(usize::MAX)
    };
    let items = pages.get(index).cloned().unwrap_or_default();
    let next_cursor = if index + 1 < pages.len() {
        (index + 1).to_string()
    } else {
        String::new()
    };
    Page { items, next_cursor }
}

impl MockSlackApi {
    pub fn with_user(mut self, user_id: &str, name: &str) -> Self {
        self.users.insert(user_id.to_string(), name.to_string());
        self
    }

    pub fn with_conversations(mut self, pages: Vec<Vec<RawConversation>>) -> Self {
        self.conversation_pages = pages;
        self
    }

    pub fn with_history(mut self, newest_first: Vec<RawMessage>) -> Self {
        self.history = newest_first;
        self
    }

    pub fn with_replies(mut self, thread_ts: &str, pages: Vec<Vec<RawMessage>>) -> Self {
        self.replies.insert(thread_ts.to_string(), pages);
        self
    }

    pub fn with_auth(mut self, user_id: &str, user: &str) -> Self {
        self.auth = Some(AuthIdentity {
            user_id: user_id.to_string(),
            user: user.to_string(),
            team: "T1".to_string(),
        });
        self
    }

    fn conversations(&self, req: &ConversationsRequest) -> Result<Page<RawConversation>> {
        let page = page_at(&self.conversation_pages, &req.cursor);
        let index = req.cursor.parse::<usize>().unwrap_or(0);
        if self.fail_conversations_at == Some(index) {
            return Err(remote("conversations.list", "ratelimited"));
        }
        Ok(page)
    }
}

#[async_trait]
impl SlackApi for MockSlackApi {
    async fn auth_test(&self) -> Result<AuthIdentity> {
        self.auth
            .clone()
            .ok_or_else(|| ApiError::Unauthorized("invalid_auth".to_string()))
    }

    async fn list_conversations(&self, req: &ConversationsRequest) -> Result<Page<RawConversation>> {
        self.calls.list_conversations.fetch_add(1, Ordering::SeqCst);
        self.conversations(req)
    }

    async fn user_conversations(&self, req: &ConversationsRequest) -> Result<Page<RawConversation>> {
        self.calls.user_conversations.fetch_add(1, Ordering::SeqCst);
        self.conversations(req)
    }

    async fn history(&self, req: &HistoryRequest) -> Result<Page<RawMessage>> {
        self.calls.history.fetch_add(1, Ordering::SeqCst);
        self.history_requests.lock().unwrap().push(req.clone());
        if self.fail_history {
            return Err(remote("conversations.history", "channel_not_found"));
        }

        let mut items: Vec<RawMessage> = self
            .history
            .iter()
            .filter(|m| req.latest.is_empty() || m.ts.as_str() <= req.latest.as_str())
            .cloned()
            .collect();
        items.truncate(req.limit as usize);
        Ok(Page::last(items))
    }

    async fn replies(&self, req: &RepliesRequest) -> Result<Page<RawMessage>> {
        self.calls.replies.fetch_add(1, Ordering::SeqCst);
        if self.fail_replies {
            return Err(remote("conversations.replies", "thread_not_found"));
        }
        let pages = self.replies.get(&req.ts).cloned().unwrap_or_default();
        Ok(page_at(&pages, &req.cursor))
    }

    async fn user_info(&self, user_id: &str) -> Result<RawUser> {
        self.calls.user_info.fetch_add(1, Ordering::SeqCst);
        self.users
            .get(user_id)
            .map(|name| RawUser {
                id: user_id.to_string(),
                name: name.clone(),
                ..Default::default()
            })
            .ok_or_else(|| remote("users.info", "user_not_found"))
    }

    async fn user_presence(&self, user_id: &str) -> Result<String> {
        self.presences
            .get(user_id)
            .cloned()
            .ok_or_else(|| remote("users.getPresence", "user_not_found"))
    }

    async fn set_presence(&self, presence: &str) -> Result<()> {
        self.presence_set.lock().unwrap().push(presence.to_string());
        Ok(())
    }

    async fn post_message(&self, msg: &PostMessage) -> Result<()> {
        self.posted.lock().unwrap().push(msg.clone());
        Ok(())
    }

    async fn send_command(&self, channel: &str, command: &str, text: &str) -> Result<()> {
        self.commands.lock().unwrap().push((
            channel.to_string(),
            command.to_string(),
            text.to_string(),
        ));
        Ok(())
    }

    async fn mark_read(&self, channel: &str, ts: &str) -> Result<()> {
        self.marked
            .lock()
            .unwrap()
            .push((channel.to_string(), ts.to_string()));
        Ok(())
    }

    async fn connect_events(&self) -> Result<String> {
        Err(remote("rtm.connect", "not_supported"))
    }
}

// ---------------------------------------------------------------------------
// Raw fixtures
// ---------------------------------------------------------------------------

pub fn public_channel(id: &str, name: &str) -> RawConversation {
    RawConversation {
        id: id.to_string(),
        name: name.to_string(),
        is_channel: true,
        is_member: true,
        topic: Topic {
            value: format!("{name} topic"),
        },
        ..Default::default()
    }
}

pub fn private_group(id: &str, name: &str) -> RawConversation {
    RawConversation {
        id: id.to_string(),
        name: name.to_string(),
        is_group: true,
        is_private: true,
        is_member: true,
        ..Default::default()
    }
}

pub fn multi_party(id: &str, name: &str, open: bool) -> RawConversation {
    RawConversation {
        id: id.to_string(),
        name: name.to_string(),
        is_group: true,
        is_mpim: true,
        is_private: true,
        is_member: true,
        is_open: open,
        ..Default::default()
    }
}

pub fn direct(id: &str, user: &str) -> RawConversation {
    RawConversation {
        id: id.to_string(),
        name: user.to_string(),
        is_im: true,
        is_open: true,
        user: user.to_string(),
        ..Default::default()
    }
}

pub fn message(ts: &str, user: &str, text: &str) -> RawMessage {
    RawMessage {
        user: user.to_string(),
        text: text.to_string(),
        ts: ts.to_string(),
        ..Default::default()
    }
}
