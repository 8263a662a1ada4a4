//! Broadcast recipients.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque chat identifier assigned by Telegram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(pub i64);

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A registered recipient and whether it currently receives scheduled reports.
///
/// Subscribers are never deleted; unsubscribing only clears `active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subscriber {
    pub chat_id: ChatId,
    pub active: bool,
}

impl Subscriber {
    pub fn new(chat_id: ChatId, active: bool) -> Self {
        Self { chat_id, active }
    }
}
