use std::sync::{Arc, OnceLock};

use regex::Regex;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::error::{ClientError, Result};
use crate::events::{emit_event, ClientEvent, EventSender};
use crate::service::SlackService;

fn command_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(/\w+)(?:\s+(.*))?$").expect("valid command regex"))
}

fn thread_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^/thread\s+(\w+)\s+(.+)$").expect("valid thread regex"))
}

/// A line of input starting with `/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlashCommand {
    /// `/thread <alias> <text>`: reply in a thread by its short alias.
    Thread { alias: String, text: String },
    /// Any other command, executed by the server.
    Remote { command: String, text: String },
}

impl SlashCommand {
    pub fn is_command(input: &str) -> bool {
        input.starts_with('/') && command_pattern().is_match(input.trim_end())
    }

    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim_end();
        let caps = command_pattern()
            .captures(input)
            .ok_or_else(|| ClientError::NotACommand(input.to_string()))?;

        let command = caps[1].to_string();
        if command == "/thread" {
            let thread = thread_pattern().captures(input).ok_or_else(|| {
                ClientError::InvalidCommand("usage: /thread <alias> <message>".to_string())
            })?;
            return Ok(SlashCommand::Thread {
                alias: thread[1].to_string(),
                text: thread[2].to_string(),
            });
        }

        let text = caps.get(2).map(|m| m.as_str().to_string()).unwrap_or_default();
        Ok(SlashCommand::Remote { command, text })
    }
}

/// Send a line of input to `channel_id` in the background.
pub fn spawn_submit(
    service: Arc<SlackService>,
    channel_id: String,
    input: String,
    events: EventSender,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        match service.submit(&channel_id, &input).await {
            Ok(()) => emit_event(&events, ClientEvent::Sent { channel_id }),
            Err(e) => {
                warn!(channel = %channel_id, error = %e, "Failed to send");
                emit_event(
                    &events,
                    ClientEvent::Failed {
                        operation: "send",
                        error: e.to_string(),
                    },
                );
            }
        }
    })
}

/// Mark `channel_id` as read. Failures are only logged.
pub fn spawn_mark_as_read(service: Arc<SlackService>, channel_id: String) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = service.mark_as_read(&channel_id).await {
            warn!(channel = %channel_id, error = %e, "Failed to mark channel as read");
        }
    })
}
