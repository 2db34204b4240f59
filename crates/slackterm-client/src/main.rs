//! # slack-term
//!
//! Line-oriented driver for the service layer. Type a message and press
//! enter to post it to the selected conversation. Other input:
//!
//! - `/switch <name>`: select another conversation
//! - `/channels`: list conversations
//! - `/threads`: list thread aliases of the loaded history
//! - `/thread <alias> <text>`: reply in a thread
//! - `/quit`
//!
//! Any other `/command` is executed by the server.

use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};

use slackterm_client::commands::channels::{spawn_load_channels, spawn_load_history};
use slackterm_client::commands::messaging::{spawn_mark_as_read, spawn_submit};
use slackterm_client::dispatcher::{spawn_dispatcher, StateUpdate};
use slackterm_client::events::ClientEvent;
use slackterm_client::state::AppState;
use slackterm_client::{ClientConfig, ClientError, SlackService};
use slackterm_net::StreamCommand;
use slackterm_shared::{ChannelEntry, Message, Presence};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Tracing and configuration
    // -----------------------------------------------------------------------
    if let Some(path) = slackterm_client::init_tracing() {
        eprintln!("Logging to {}", path.display());
    }

    let config = ClientConfig::from_env()?;
    info!(?config, "Loaded configuration");

    // -----------------------------------------------------------------------
    // 2. Session
    // -----------------------------------------------------------------------
    let service = Arc::new(
        SlackService::connect(config)
            .await
            .context("Could not connect to the workspace")?,
    );
    println!("Signed in as {}", service.current_username());

    let mut state = AppState::new();
    let (events_tx, mut events_rx) = mpsc::unbounded_channel::<ClientEvent>();
    let (updates_tx, mut updates_rx) = mpsc::channel::<StateUpdate>(256);

    // -----------------------------------------------------------------------
    // 3. Live events
    // -----------------------------------------------------------------------
    let stream_cmd = match service.open_event_stream().await {
        Ok((cmd_tx, remote_events)) => {
            spawn_dispatcher(remote_events, state.subscribe_selection(), updates_tx);
            Some(cmd_tx)
        }
        Err(e) => {
            warn!(error = %e, "Live events unavailable, history will not refresh");
            None
        }
    };

    // -----------------------------------------------------------------------
    // 4. Initial channel list
    // -----------------------------------------------------------------------
    match service.load_channels().await {
        Ok(channels) => state.replace_channels(channels),
        Err(ClientError::NoChannels) => {
            eprintln!("No channels available");
            return Ok(());
        }
        Err(e) => return Err(e).context("Could not load channels"),
    }

    if let Some(channel) = state.selected_channel() {
        println!("== {} ==", channel.name);
        spawn_load_history(service.clone(), channel.id.clone(), events_tx.clone());
    }

    // -----------------------------------------------------------------------
    // 5. Main loop
    // -----------------------------------------------------------------------
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if line == "/quit" {
                    break;
                }
                handle_input(&service, &mut state, line, &events_tx);
            }

            Some(event) = events_rx.recv() => {
                handle_client_event(&service, &mut state, event, &events_tx);
            }

            Some(update) = updates_rx.recv() => {
                let notified = match &update {
                    StateUpdate::Notify(id) => Some(id.clone()),
                    _ => None,
                };
                if let Some(channel_id) = state.apply(update) {
                    spawn_load_history(service.clone(), channel_id, events_tx.clone());
                }
                if let Some(entry) = notified.and_then(|id| state.channels.iter().find(|c| c.id == id)) {
                    println!("* new activity in {}", entry.name);
                }
            }
        }
    }

    if let Some(cmd_tx) = stream_cmd {
        let _ = cmd_tx.send(StreamCommand::Shutdown).await;
    }
    info!("Shutting down");
    Ok(())
}

fn handle_input(
    service: &Arc<SlackService>,
    state: &mut AppState,
    line: &str,
    events_tx: &mpsc::UnboundedSender<ClientEvent>,
) {
    if let Some(name) = line.strip_prefix("/switch ") {
        match state.select_by_name(name.trim()) {
            Some(channel_id) => {
                println!("== {} ==", name.trim());
                spawn_load_history(service.clone(), channel_id.clone(), events_tx.clone());
                spawn_mark_as_read(service.clone(), channel_id);
            }
            None => println!("No conversation named {}", name.trim()),
        }
        return;
    }

    match line {
        "/channels" => {
            for entry in &state.channels {
                print_channel(entry, state.selected() == Some(entry.id.as_str()));
            }
        }
        "/threads" => {
            if state.threads.is_empty() {
                println!("No threads in this conversation");
            }
            for reference in &state.threads {
                println!("{}  {}", reference.alias, reference.thread_ts);
            }
        }
        "/refresh" => {
            spawn_load_channels(service.clone(), events_tx.clone());
        }
        _ => match state.selected() {
            Some(channel_id) => {
                spawn_submit(
                    service.clone(),
                    channel_id.to_string(),
                    line.to_string(),
                    events_tx.clone(),
                );
            }
            None => println!("No conversation selected"),
        },
    }
}

fn handle_client_event(
    service: &Arc<SlackService>,
    state: &mut AppState,
    event: ClientEvent,
    events_tx: &mpsc::UnboundedSender<ClientEvent>,
) {
    match event {
        ClientEvent::ChannelsLoaded(channels) => {
            state.replace_channels(channels);
            println!("{} conversations", state.channels.len());
        }
        ClientEvent::HistoryLoaded {
            channel_id,
            messages,
            threads,
        } => {
            if state.accept_history(&channel_id, messages, threads) {
                for msg in &state.messages {
                    print_message(msg);
                }
            }
        }
        ClientEvent::Sent { channel_id } => {
            if state.reload_after_send(&channel_id) {
                spawn_load_history(service.clone(), channel_id, events_tx.clone());
            }
        }
        ClientEvent::Failed { operation, error } => {
            println!("! {operation} failed: {error}");
        }
    }
}

fn print_channel(entry: &ChannelEntry, selected: bool) {
    let marker = if selected { ">" } else { " " };
    let unread = if entry.notification { "*" } else { " " };
    let presence = match (entry.is_direct(), entry.presence) {
        (true, Presence::Active) => " (active)",
        (true, Presence::Away) => " (away)",
        _ => "",
    };
    println!("{marker}{unread} [{}] {}{presence}", entry.kind(), entry.name);
}

fn print_message(msg: &Message) {
    let thread = if msg.thread.is_empty() {
        String::new()
    } else {
        format!("{} ", msg.thread)
    };
    println!(
        "{} {thread}<{}> {}",
        msg.time.format("%H:%M"),
        msg.name,
        msg.content
    );
    for sub in &msg.messages {
        let name = if sub.message.name.is_empty() {
            String::new()
        } else {
            format!("<{}> ", sub.message.name)
        };
        println!("      {name}{}", sub.message.content);
    }
}
