//! Telegram Bot API request and response models.
//!
//! Only the fields the bot reads are modelled; everything else in an
//! update is ignored during deserialization.

use serde::{Deserialize, Serialize};

use super::subscriber::ChatId;

/// Envelope wrapping every Bot API response.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    /// Human-readable error when `ok` is `false`.
    pub description: Option<String>,
}

/// One entry returned by `getUpdates`.
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

/// An inbound chat message.
#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    pub text: Option<String>,
}

/// The chat a message was posted in.
#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: ChatId,
}

/// Query parameters for `getUpdates` long polling.
#[derive(Debug, Serialize)]
pub struct GetUpdatesRequest {
    pub offset: i64,
    /// Long-poll timeout in seconds.
    pub timeout: u64,
    pub allowed_updates: Vec<String>,
}

impl GetUpdatesRequest {
    pub fn new(offset: i64, timeout: u64) -> Self {
        Self {
            offset,
            timeout,
            allowed_updates: vec!["message".to_string()],
        }
    }
}

/// Body of a `sendMessage` call.
#[derive(Debug, Serialize)]
pub struct SendMessageRequest<'a> {
    pub chat_id: ChatId,
    pub text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<ReplyKeyboardMarkup>,
}

/// Custom keyboard shown under the message input.
#[derive(Debug, Clone, Serialize)]
pub struct ReplyKeyboardMarkup {
    pub keyboard: Vec<Vec<KeyboardButton>>,
    pub resize_keyboard: bool,
}

/// A single keyboard button that sends its label as text when pressed.
#[derive(Debug, Clone, Serialize)]
pub struct KeyboardButton {
    pub text: String,
}

impl ReplyKeyboardMarkup {
    /// Builds a resizable keyboard with all `labels` on one row.
    pub fn single_row(labels: &[&str]) -> Self {
        Self {
            keyboard: vec![
                labels
                    .iter()
                    .map(|label| KeyboardButton {
                        text: (*label).to_string(),
                    })
                    .collect(),
            ],
            resize_keyboard: true,
        }
    }
}
