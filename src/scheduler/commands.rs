//! Inbound chat commands.
//!
//! The chat transport turns each inbound text into a [`Command`] and hands
//! it to [`CommandHandler::dispatch`], which calls the matching named
//! `on_*_command` handler. Handlers log their own failures so one bad
//! command never stops the transport's loop.

use tracing::{debug, warn};

use super::BroadcastScheduler;
use crate::Result;
use crate::models::ChatId;

/// Keyboard label that asks for the bot description.
pub const ABOUT_BOT_BUTTON: &str = "About bot.";

/// Keyboard label that asks for the command list.
pub const ABOUT_COMMANDS_BUTTON: &str = "About commands.";

const GREETING: &str = "Hello!";

/// Help topics reachable through the reply keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HelpTopic {
    AboutBot,
    AboutCommands,
}

/// A recognized inbound command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// `/start`: register and show the help keyboard.
    Start,
    /// `/info`: report the order book now.
    Query,
    /// `/sub`: resume scheduled reports.
    Subscribe,
    /// `/stop`: pause scheduled reports.
    Unsubscribe,
    /// A help keyboard button.
    Help(HelpTopic),
}

impl Command {
    /// Parses message text into a command.
    ///
    /// Slash commands may carry a `@botname` suffix and trailing arguments,
    /// both ignored. Returns `None` for anything else.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        match text {
            ABOUT_BOT_BUTTON => return Some(Self::Help(HelpTopic::AboutBot)),
            ABOUT_COMMANDS_BUTTON => return Some(Self::Help(HelpTopic::AboutCommands)),
            _ => {}
        }

        let word = text.strip_prefix('/')?.split_whitespace().next()?;
        let name = word.split_once('@').map_or(word, |(name, _)| name);
        match name {
            "start" => Some(Self::Start),
            "info" => Some(Self::Query),
            "sub" => Some(Self::Subscribe),
            "stop" => Some(Self::Unsubscribe),
            _ => None,
        }
    }
}

/// Routes parsed commands to the scheduler's subscription entry points.
#[derive(Clone)]
pub struct CommandHandler {
    scheduler: BroadcastScheduler,
}

impl CommandHandler {
    pub fn new(scheduler: BroadcastScheduler) -> Self {
        Self { scheduler }
    }

    /// Runs the handler for `command`, logging rather than returning errors.
    pub async fn dispatch(&self, chat_id: ChatId, command: Command) {
        debug!(chat_id = %chat_id, ?command, "Dispatching command");
        let result = match command {
            Command::Start => self.on_start_command(chat_id).await,
            Command::Query => self.on_query_command(chat_id).await,
            Command::Subscribe => self.on_subscribe_command(chat_id).await,
            Command::Unsubscribe => self.on_unsubscribe_command(chat_id).await,
            Command::Help(topic) => self.on_help_text_command(chat_id, topic).await,
        };
        if let Err(e) = result {
            warn!(chat_id = %chat_id, ?command, error = %e, "Command failed");
        }
    }

    /// Registers the chat (active) if unknown and greets it with the help
    /// keyboard. Known chats keep their current subscription flag.
    pub async fn on_start_command(&self, chat_id: ChatId) -> Result<()> {
        self.scheduler.ensure_registered(chat_id).await?;
        self.delivery()
            .send_with_buttons(
                chat_id,
                GREETING,
                &[ABOUT_BOT_BUTTON, ABOUT_COMMANDS_BUTTON],
            )
            .await
    }

    pub async fn on_subscribe_command(&self, chat_id: ChatId) -> Result<()> {
        self.scheduler.set_active(chat_id, true).await?;
        let text = format!(
            "Subscribed to {} reports every {}.",
            self.scheduler.monitor().pair,
            period_label(self.scheduler.monitor().period.as_secs())
        );
        self.delivery().send_text(chat_id, &text).await
    }

    pub async fn on_unsubscribe_command(&self, chat_id: ChatId) -> Result<()> {
        self.scheduler.set_active(chat_id, false).await?;
        self.delivery()
            .send_text(chat_id, "Reports stopped. Send /sub to resume.")
            .await
    }

    pub async fn on_query_command(&self, chat_id: ChatId) -> Result<()> {
        self.scheduler.query_now(chat_id).await
    }

    pub async fn on_help_text_command(&self, chat_id: ChatId, topic: HelpTopic) -> Result<()> {
        let text = self.help_text(topic);
        self.delivery().send_text(chat_id, &text).await
    }

    fn help_text(&self, topic: HelpTopic) -> String {
        let monitor = self.scheduler.monitor();
        match topic {
            HelpTopic::AboutBot => format!(
                "This bot scans the order book for large orders.\n\
                 An order counts as large when its size exceeds the average \
                 volume of a {} candle over the last {} hours.\n\
                 Pair - {}.\n\
                 Data comes from Binance.",
                monitor.interval,
                monitor.window.as_secs() / 3600,
                monitor.pair
            ),
            HelpTopic::AboutCommands => format!(
                "/start - register and receive reports every {}.\n\
                 /info - current state of the order book.\n\
                 /stop - stop the reports.\n\
                 /sub - subscribe again.\n\
                 Data comes from Binance.",
                period_label(monitor.period.as_secs())
            ),
        }
    }

    fn delivery(&self) -> &dyn crate::delivery::Delivery {
        self.scheduler.inner.delivery.as_ref()
    }
}

/// Formats a period as whole minutes when it divides evenly.
fn period_label(secs: u64) -> String {
    if secs % 60 == 0 {
        format!("{} min", secs / 60)
    } else {
        format!("{secs} s")
    }
}
