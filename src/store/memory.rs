use async_trait::async_trait;
use tokio::sync::Mutex;

use super::SubscriberStore;
use crate::Result;
use crate::models::{ChatId, Subscriber};

/// In-memory subscriber registry; contents live as long as the process.
#[derive(Default)]
pub struct MemoryStore {
    subscribers: Mutex<Vec<Subscriber>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the registry, e.g. from a previous export. Later duplicates of a
    /// chat id overwrite the earlier flag.
    pub fn with_subscribers(subscribers: impl IntoIterator<Item = Subscriber>) -> Self {
        let mut seeded: Vec<Subscriber> = Vec::new();
        for subscriber in subscribers {
            match seeded.iter_mut().find(|s| s.chat_id == subscriber.chat_id) {
                Some(existing) => existing.active = subscriber.active,
                None => seeded.push(subscriber),
            }
        }
        Self {
            subscribers: Mutex::new(seeded),
        }
    }
}

#[async_trait]
impl SubscriberStore for MemoryStore {
    async fn ensure_registered(&self, chat_id: ChatId) -> Result<bool> {
        let mut subscribers = self.subscribers.lock().await;
        if subscribers.iter().any(|s| s.chat_id == chat_id) {
            return Ok(false);
        }
        subscribers.push(Subscriber::new(chat_id, true));
        Ok(true)
    }

    async fn upsert(&self, chat_id: ChatId, active: bool) -> Result<()> {
        let mut subscribers = self.subscribers.lock().await;
        match subscribers.iter_mut().find(|s| s.chat_id == chat_id) {
            Some(existing) => existing.active = active,
            None => subscribers.push(Subscriber::new(chat_id, active)),
        }
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Subscriber>> {
        Ok(self.subscribers.lock().await.clone())
    }
}
