//! Telegram Bot API client.
//!
//! This module is organized by direction:
//! - [`TelegramClient`] - outbound `sendMessage` calls and `getUpdates` fetches
//! - [`poller`] - the long-poll loop that feeds inbound commands to the
//!   [`CommandHandler`](crate::scheduler::CommandHandler)

pub mod poller;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use zeroize::Zeroizing;

use crate::delivery::Delivery;
use crate::models::ChatId;
use crate::models::telegram::{
    ApiResponse, GetUpdatesRequest, ReplyKeyboardMarkup, SendMessageRequest, Update,
};
use crate::{BookwatchError, Result};

pub use poller::TelegramPoller;

/// Slack added on top of the long-poll timeout before the HTTP request
/// itself is abandoned.
const POLL_TIMEOUT_SLACK: Duration = Duration::from_secs(10);

const SEND_TIMEOUT: Duration = Duration::from_secs(15);

/// Thin client over the Telegram Bot HTTP API.
pub struct TelegramClient {
    http: Client,
    api_url: String,
    token: Zeroizing<String>,
}

impl TelegramClient {
    /// Creates a client for the bot identified by `token`.
    ///
    /// # Errors
    ///
    /// Returns [`BookwatchError::Network`] if the HTTP client cannot be built.
    pub fn new(api_url: &str, token: Zeroizing<String>) -> Result<Self> {
        let http = Client::builder().build()?;
        Ok(Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{method}", self.api_url, self.token.as_str())
    }

    /// Calls a Bot API method with a JSON body and unwraps the envelope.
    async fn call<B, T>(&self, method: &str, body: &B, timeout: Duration) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        // Request URLs carry the bot token, so errors are stripped of them.
        let response = self
            .http
            .post(self.method_url(method))
            .timeout(timeout)
            .json(body)
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;
        let envelope: ApiResponse<T> = response
            .json()
            .await
            .map_err(reqwest::Error::without_url)?;
        unwrap_envelope(method, envelope)
    }

    async fn send(&self, request: &SendMessageRequest<'_>) -> Result<()> {
        let _: serde_json::Value = self
            .call("sendMessage", request, SEND_TIMEOUT)
            .await
            .map_err(|e| match e {
                BookwatchError::Network(e) => {
                    BookwatchError::Delivery(format!("sendMessage to {}: {e}", request.chat_id))
                }
                other => other,
            })?;
        debug!(chat_id = %request.chat_id, "Sent message");
        Ok(())
    }

    /// Long-polls for updates with `update_id >= offset`.
    ///
    /// # Errors
    ///
    /// Returns [`BookwatchError::Network`] on transport failure, or
    /// [`BookwatchError::Delivery`] if Telegram answers `ok: false`.
    pub async fn get_updates(&self, offset: i64, timeout: Duration) -> Result<Vec<Update>> {
        let request = GetUpdatesRequest::new(offset, timeout.as_secs());
        self.call("getUpdates", &request, timeout + POLL_TIMEOUT_SLACK)
            .await
    }
}

#[async_trait]
impl Delivery for TelegramClient {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<()> {
        let request = SendMessageRequest {
            chat_id,
            text,
            reply_markup: None,
        };
        self.send(&request).await
    }

    async fn send_with_buttons(
        &self,
        chat_id: ChatId,
        text: &str,
        buttons: &[&str],
    ) -> Result<()> {
        let request = SendMessageRequest {
            chat_id,
            text,
            reply_markup: Some(ReplyKeyboardMarkup::single_row(buttons)),
        };
        self.send(&request).await
    }
}

/// Extracts `result` from a Bot API envelope.
fn unwrap_envelope<T>(method: &str, envelope: ApiResponse<T>) -> Result<T> {
    if !envelope.ok {
        return Err(BookwatchError::Delivery(format!(
            "{method} failed: {}",
            envelope
                .description
                .unwrap_or_else(|| "no description".to_string())
        )));
    }
    envelope
        .result
        .ok_or_else(|| BookwatchError::Delivery(format!("{method} returned no result")))
}
