//! Subscriber persistence.
//!
//! The scheduler and the command handler share one [`SubscriberStore`].
//! Two implementations exist:
//! - [`MemoryStore`] - process-lifetime registry behind a mutex
//! - [`PostgresStore`] - durable `bot_user` table behind a connection pool

mod memory;
mod postgres;

use async_trait::async_trait;

use crate::Result;
use crate::models::{ChatId, Subscriber};

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

/// Serialized access to the subscriber set.
///
/// Every method is atomic with respect to the others: a concurrent
/// [`upsert`](Self::upsert) never tears a [`list_active`](Self::list_active)
/// snapshot, and no chat id ever appears twice.
#[async_trait]
pub trait SubscriberStore: Send + Sync {
    /// Registers `chat_id` as an active subscriber if it is unknown.
    ///
    /// Returns `true` if a new subscriber was created. An existing
    /// subscriber keeps its current `active` flag.
    async fn ensure_registered(&self, chat_id: ChatId) -> Result<bool>;

    /// Sets `active` for `chat_id`, registering it first if unknown.
    async fn upsert(&self, chat_id: ChatId, active: bool) -> Result<()>;

    /// Returns every known subscriber in registration order.
    async fn list(&self) -> Result<Vec<Subscriber>>;

    /// Returns a snapshot of the active subscribers in registration order.
    async fn list_active(&self) -> Result<Vec<Subscriber>> {
        let mut subscribers = self.list().await?;
        subscribers.retain(|s| s.active);
        Ok(subscribers)
    }
}
