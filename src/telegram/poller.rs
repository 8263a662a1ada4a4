//! Long-poll loop feeding inbound Telegram messages to the command handler.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::TelegramClient;
use crate::models::ChatId;
use crate::models::telegram::Update;
use crate::scheduler::{Command, CommandHandler, ShutdownSignal};

/// How long one `getUpdates` call may wait for new messages.
const LONG_POLL_TIMEOUT: Duration = Duration::from_secs(30);

/// Initial backoff duration after a failed poll.
const INITIAL_BACKOFF: Duration = Duration::from_secs(1);

/// Maximum backoff duration between failed polls.
const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Receives updates and dispatches each recognized command on its own task,
/// so a slow on-demand report never holds up other chats.
pub struct TelegramPoller {
    client: Arc<TelegramClient>,
    handler: CommandHandler,
    shutdown: ShutdownSignal,
}

impl TelegramPoller {
    pub fn new(
        client: Arc<TelegramClient>,
        handler: CommandHandler,
        shutdown: ShutdownSignal,
    ) -> Self {
        Self {
            client,
            handler,
            shutdown,
        }
    }

    /// Polls until shutdown is requested.
    pub async fn run(self) {
        let mut offset = 0;
        let mut backoff = INITIAL_BACKOFF;
        info!("Telegram polling started");

        loop {
            let polled = tokio::select! {
                polled = self.client.get_updates(offset, LONG_POLL_TIMEOUT) => polled,
                () = self.shutdown.cancelled() => break,
            };

            match polled {
                Ok(updates) => {
                    backoff = INITIAL_BACKOFF;
                    offset = next_offset(&updates, offset);
                    for (chat_id, command) in inbound_commands(&updates) {
                        let handler = self.handler.clone();
                        tokio::spawn(async move { handler.dispatch(chat_id, command).await });
                    }
                }
                Err(e) => {
                    warn!(
                        error = %e,
                        backoff_secs = backoff.as_secs(),
                        "Polling failed, backing off"
                    );
                    tokio::select! {
                        () = tokio::time::sleep(backoff) => {}
                        () = self.shutdown.cancelled() => break,
                    }
                    backoff = (backoff * 2).min(MAX_BACKOFF);
                }
            }
        }

        info!("Telegram polling stopped");
    }
}

/// Offset that acknowledges every update in `updates`.
fn next_offset(updates: &[Update], current: i64) -> i64 {
    updates
        .iter()
        .map(|u| u.update_id + 1)
        .max()
        .map_or(current, |next| next.max(current))
}

/// Extracts the recognized commands, in arrival order.
fn inbound_commands(updates: &[Update]) -> Vec<(ChatId, Command)> {
    updates
        .iter()
        .filter_map(|update| update.message.as_ref())
        .filter_map(|message| {
            let text = message.text.as_deref()?;
            match Command::parse(text) {
                Some(command) => Some((message.chat.id, command)),
                None => {
                    debug!(chat_id = %message.chat.id, "Ignoring unrecognized message");
                    None
                }
            }
        })
        .collect()
}
