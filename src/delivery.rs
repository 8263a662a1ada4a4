//! Outbound chat delivery.

use async_trait::async_trait;

use crate::Result;
use crate::models::ChatId;

/// Sends plain-text messages to a chat.
#[async_trait]
pub trait Delivery: Send + Sync {
    /// Sends one message to `chat_id`.
    ///
    /// # Errors
    ///
    /// Returns [`BookwatchError::Delivery`](crate::BookwatchError::Delivery)
    /// or [`BookwatchError::Network`](crate::BookwatchError::Network) when
    /// the message was not accepted.
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<()>;

    /// Sends `text` together with quick-reply buttons labelled `buttons`.
    ///
    /// Transports without button support send the bare text.
    async fn send_with_buttons(
        &self,
        chat_id: ChatId,
        text: &str,
        _buttons: &[&str],
    ) -> Result<()> {
        self.send_text(chat_id, text).await
    }
}
