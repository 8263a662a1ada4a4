use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::{error, info};

use super::SubscriberStore;
use crate::Result;
use crate::models::{ChatId, Subscriber};

/// Delay between two startup connection attempts.
const CONNECT_RETRY_DELAY: Duration = Duration::from_secs(2);

const MAX_CONNECTIONS: u32 = 5;

const CREATE_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS bot_user (
        id      BIGSERIAL PRIMARY KEY,
        chat_id BIGINT    NOT NULL UNIQUE,
        is_sub  BOOLEAN   NOT NULL DEFAULT TRUE
    )
"#;

#[derive(sqlx::FromRow)]
struct BotUserRow {
    chat_id: i64,
    is_sub: bool,
}

impl From<BotUserRow> for Subscriber {
    fn from(row: BotUserRow) -> Self {
        Subscriber::new(ChatId(row.chat_id), row.is_sub)
    }
}

/// Subscribers persisted in the PostgreSQL `bot_user` table.
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Wraps an existing pool. The `bot_user` table must already exist;
    /// see [`connect_with_retry`](Self::connect_with_retry).
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects to `database_url`, retrying forever until the database
    /// answers, then makes sure the `bot_user` table exists.
    ///
    /// Nothing else in the process should serve requests before this returns.
    ///
    /// # Errors
    ///
    /// Returns [`BookwatchError::StoreUnavailable`](crate::BookwatchError::StoreUnavailable)
    /// if the schema statement fails once connected.
    pub async fn connect_with_retry(database_url: &str) -> Result<Self> {
        let mut attempt: u64 = 0;
        let pool = loop {
            attempt += 1;
            match PgPoolOptions::new()
                .max_connections(MAX_CONNECTIONS)
                .connect(database_url)
                .await
            {
                Ok(pool) => break pool,
                Err(e) => {
                    error!(attempt, error = %e, "Database connection failed");
                    tokio::time::sleep(CONNECT_RETRY_DELAY).await;
                }
            }
        };
        info!(attempt, "Database is reachable");

        sqlx::query(CREATE_TABLE).execute(&pool).await?;
        Ok(Self::new(pool))
    }
}

#[async_trait]
impl SubscriberStore for PostgresStore {
    async fn ensure_registered(&self, chat_id: ChatId) -> Result<bool> {
        let result = sqlx::query(
            "INSERT INTO bot_user (chat_id, is_sub) VALUES ($1, TRUE) \
             ON CONFLICT (chat_id) DO NOTHING",
        )
        .bind(chat_id.0)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn upsert(&self, chat_id: ChatId, active: bool) -> Result<()> {
        sqlx::query(
            "INSERT INTO bot_user (chat_id, is_sub) VALUES ($1, $2) \
             ON CONFLICT (chat_id) DO UPDATE SET is_sub = EXCLUDED.is_sub",
        )
        .bind(chat_id.0)
        .bind(active)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Subscriber>> {
        let rows: Vec<BotUserRow> =
            sqlx::query_as("SELECT chat_id, is_sub FROM bot_user ORDER BY id")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(Subscriber::from).collect())
    }

    async fn list_active(&self) -> Result<Vec<Subscriber>> {
        let rows: Vec<BotUserRow> =
            sqlx::query_as("SELECT chat_id, is_sub FROM bot_user WHERE is_sub ORDER BY id")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(Subscriber::from).collect())
    }
}
