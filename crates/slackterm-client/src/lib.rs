pub mod channels;
pub mod commands;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod events;
pub mod format;
pub mod identity;
pub mod messages;
pub mod service;
pub mod state;

#[cfg(test)]
mod test_utils;

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing_subscriber::{fmt, EnvFilter};

pub use config::ClientConfig;
pub use error::{ClientError, UnresolvedUser};
pub use service::SlackService;

const DEFAULT_FILTER: &str = "slackterm_client=debug,slackterm_net=debug,slackterm_store=info,warn";

/// Install the global tracing subscriber.
///
/// `RUST_LOG` overrides the default filter. When `SLACK_TERM_LOG` is set,
/// output goes to `slack-term.log` in the cache directory instead of
/// stderr, keeping the terminal clean. Returns the log file path, if any.
pub fn init_tracing() -> Option<PathBuf> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let builder = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    if std::env::var_os("SLACK_TERM_LOG").is_some() {
        let opened = slackterm_store::database::default_cache_dir()
            .ok()
            .and_then(|dir| std::fs::create_dir_all(&dir).ok().map(|_| dir.join("slack-term.log")))
            .and_then(|path| {
                OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&path)
                    .ok()
                    .map(|file| (path, file))
            });

        if let Some((path, file)) = opened {
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
            tracing::info!("Starting slack-term");
            return Some(path);
        }
    }

    builder.with_writer(std::io::stderr).init();
    tracing::info!("Starting slack-term");
    None
}
