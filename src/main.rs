use std::io::BufRead;
use std::sync::Arc;

use bookwatch::config::{AppConfig, fetch_config};
use bookwatch::credentials::{self, CredentialKey};
use bookwatch::delivery::Delivery;
use bookwatch::exchange::{BinanceClient, MarketData};
use bookwatch::scheduler::{BroadcastScheduler, CommandHandler};
use bookwatch::store::{MemoryStore, PostgresStore, SubscriberStore};
use bookwatch::telegram::{TelegramClient, TelegramPoller};
use bookwatch::{BookwatchError, Result};
use tokio::task::JoinError;
use tracing::{error, info};
use zeroize::Zeroizing;

fn main() -> Result<()> {
    // Initialize tracing subscriber for logging output.
    tracing_subscriber::fmt::init();

    let mut args = std::env::args().skip(1);
    if let Some(command) = args.next() {
        return match command.as_str() {
            "store-credential" => store_credential(args.next()),
            other => Err(BookwatchError::Config(format!(
                "unknown command {other:?}; usage: bookwatch [store-credential <{}>]",
                key_names()
            ))),
        };
    }

    // Must run before the runtime starts worker threads.
    credentials::populate_env_from_keychain();
    let app_config = fetch_config()?;

    tokio::runtime::Runtime::new()?.block_on(run(app_config))
}

async fn run(app_config: AppConfig) -> Result<()> {
    let store: Arc<dyn SubscriberStore> = match &app_config.database_url {
        Some(url) => Arc::new(PostgresStore::connect_with_retry(url).await?),
        None => {
            info!("DATABASE_URL not set, keeping subscribers in memory");
            Arc::new(MemoryStore::new())
        }
    };

    let market: Arc<dyn MarketData> = Arc::new(BinanceClient::new(
        &app_config.binance.rest_url,
        app_config.binance.api_key,
        app_config.monitor.book_depth,
    )?);
    let telegram = Arc::new(TelegramClient::new(
        &app_config.telegram.api_url,
        app_config.telegram.bot_token,
    )?);
    let delivery: Arc<dyn Delivery> = telegram.clone();

    let scheduler = BroadcastScheduler::new(app_config.monitor, market, delivery, store);
    let broadcast = scheduler.start()?;

    let poller = TelegramPoller::new(
        telegram,
        CommandHandler::new(scheduler.clone()),
        scheduler.shutdown_signal(),
    );
    let polling = tokio::spawn(poller.run());

    tokio::signal::ctrl_c().await?;
    scheduler.request_shutdown();

    let (broadcast, polling) = tokio::join!(broadcast, polling);
    let broadcast_ok = task_finished("broadcast loop", broadcast);
    let polling_ok = task_finished("telegram poller", polling);
    if broadcast_ok && polling_ok {
        info!("Shutdown complete");
    } else {
        error!("Shutdown complete with failed tasks");
    }
    Ok(())
}

/// Logs a background task that panicked or was cancelled. Returns `true`
/// if it ran to completion.
fn task_finished(task: &str, outcome: std::result::Result<(), JoinError>) -> bool {
    match outcome {
        Ok(()) => true,
        Err(e) => {
            error!(task, error = %e, "Background task failed");
            false
        }
    }
}

/// Reads a secret from stdin and stores it in the keychain.
fn store_credential(key: Option<String>) -> Result<()> {
    let key = key
        .as_deref()
        .and_then(CredentialKey::from_keyring_id)
        .ok_or_else(|| BookwatchError::Config(format!("expected one of: {}", key_names())))?;

    let mut value = Zeroizing::new(String::new());
    std::io::stdin().lock().read_line(&mut value)?;
    let secret = value.trim();
    if secret.is_empty() {
        return Err(BookwatchError::Config("no value on stdin".to_string()));
    }

    credentials::save(key, secret)?;
    info!(key = key.keyring_id(), "Credential stored in keychain");
    Ok(())
}

fn key_names() -> String {
    CredentialKey::ALL
        .iter()
        .map(|k| k.keyring_id())
        .collect::<Vec<_>>()
        .join("|")
}
