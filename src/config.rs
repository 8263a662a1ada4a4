//! Application configuration loaded from environment variables.
//!
//! The Telegram bot token **must** be provided via `TELEGRAM_BOT_TOKEN`
//! (or stored in the keychain, see [`crate::credentials`]). Everything
//! else has a default:
//!
//! - `BOOKWATCH_PAIR`: traded symbol, default `ALGOUSDT`
//! - `BOOKWATCH_INTERVAL`: kline interval, default `5m`
//! - `BOOKWATCH_WINDOW_HOURS`: trailing candle window, default `24`
//! - `BOOKWATCH_UTC_OFFSET_HOURS`: signed shift of the window start, default `0`
//! - `BOOKWATCH_PERIOD_SECS`: broadcast period, default `300`
//! - `BOOKWATCH_BOOK_DEPTH`: order book levels per side, default `100`
//! - `BINANCE_REST_URL`, `BINANCE_API_KEY` (optional)
//! - `TELEGRAM_API_URL`
//! - `DATABASE_URL` (optional; switches subscribers to PostgreSQL)

use std::str::FromStr;
use std::time::Duration;

use zeroize::Zeroizing;

use crate::models::candle::CandleInterval;

/// Default Binance spot REST endpoint.
const DEFAULT_BINANCE_REST_URL: &str = "https://api.binance.com";

/// Default Telegram Bot API endpoint.
const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";

const DEFAULT_PAIR: &str = "ALGOUSDT";
const DEFAULT_WINDOW_HOURS: u64 = 24;
const DEFAULT_PERIOD_SECS: u64 = 300;
const DEFAULT_BOOK_DEPTH: u32 = 100;

/// Depth limits accepted by `GET /api/v3/depth`.
const VALID_BOOK_DEPTHS: [u32; 8] = [5, 10, 20, 50, 100, 500, 1000, 5000];

/// Top-level application configuration.
#[derive(Debug)]
pub struct AppConfig {
    pub monitor: MonitorConfig,
    pub binance: BinanceConfig,
    pub telegram: TelegramConfig,
    pub database_url: Option<String>,
}

/// What to watch and how often to report it.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub pair: String,
    pub interval: CandleInterval,
    /// Length of the trailing candle window the threshold is averaged over.
    pub window: Duration,
    /// Extra hours subtracted from the window start (may be negative).
    pub utc_offset_hours: i64,
    /// Time between two broadcast cycles.
    pub period: Duration,
    pub book_depth: u32,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            pair: DEFAULT_PAIR.to_string(),
            interval: CandleInterval::FiveMinutes,
            window: Duration::from_secs(DEFAULT_WINDOW_HOURS * 60 * 60),
            utc_offset_hours: 0,
            period: Duration::from_secs(DEFAULT_PERIOD_SECS),
            book_depth: DEFAULT_BOOK_DEPTH,
        }
    }
}

/// Binance REST configuration values.
#[derive(Debug)]
pub struct BinanceConfig {
    pub rest_url: String,
    pub api_key: Option<Zeroizing<String>>,
}

/// Telegram Bot API configuration values.
#[derive(Debug)]
pub struct TelegramConfig {
    pub api_url: String,
    pub bot_token: Zeroizing<String>,
}

/// Loads the application configuration from environment variables.
///
/// # Errors
///
/// Returns [`BookwatchError::Config`](crate::BookwatchError::Config) if
/// `TELEGRAM_BOT_TOKEN` is missing or any numeric / enumerated variable
/// fails to parse.
pub fn fetch_config() -> crate::Result<AppConfig> {
    let bot_token = non_empty_var("TELEGRAM_BOT_TOKEN").ok_or_else(|| {
        crate::BookwatchError::Config("TELEGRAM_BOT_TOKEN is not set".to_string())
    })?;

    let monitor = fetch_monitor_config()?;

    Ok(AppConfig {
        monitor,
        binance: BinanceConfig {
            rest_url: non_empty_var("BINANCE_REST_URL")
                .unwrap_or_else(|| DEFAULT_BINANCE_REST_URL.to_string()),
            api_key: non_empty_var("BINANCE_API_KEY").map(Zeroizing::new),
        },
        telegram: TelegramConfig {
            api_url: non_empty_var("TELEGRAM_API_URL")
                .unwrap_or_else(|| DEFAULT_TELEGRAM_API_URL.to_string()),
            bot_token: Zeroizing::new(bot_token),
        },
        database_url: non_empty_var("DATABASE_URL"),
    })
}

/// Reads the `BOOKWATCH_*` variables on top of [`MonitorConfig::default`].
fn fetch_monitor_config() -> crate::Result<MonitorConfig> {
    let defaults = MonitorConfig::default();

    let pair = non_empty_var("BOOKWATCH_PAIR")
        .map(|p| p.to_uppercase())
        .unwrap_or(defaults.pair);
    let interval = parsed_var("BOOKWATCH_INTERVAL")?.unwrap_or(defaults.interval);
    let window_hours: u64 = parsed_var("BOOKWATCH_WINDOW_HOURS")?.unwrap_or(DEFAULT_WINDOW_HOURS);
    let utc_offset_hours = parsed_var("BOOKWATCH_UTC_OFFSET_HOURS")?.unwrap_or(0);
    let period_secs: u64 = parsed_var("BOOKWATCH_PERIOD_SECS")?.unwrap_or(DEFAULT_PERIOD_SECS);
    let book_depth = parsed_var("BOOKWATCH_BOOK_DEPTH")?.unwrap_or(defaults.book_depth);

    if window_hours == 0 {
        return Err(crate::BookwatchError::Config(
            "BOOKWATCH_WINDOW_HOURS must be at least 1".to_string(),
        ));
    }
    let window_secs = window_hours.checked_mul(60 * 60).ok_or_else(|| {
        crate::BookwatchError::Config("BOOKWATCH_WINDOW_HOURS is too large".to_string())
    })?;
    if period_secs == 0 {
        return Err(crate::BookwatchError::Config(
            "BOOKWATCH_PERIOD_SECS must be at least 1".to_string(),
        ));
    }
    if !VALID_BOOK_DEPTHS.contains(&book_depth) {
        return Err(crate::BookwatchError::Config(format!(
            "BOOKWATCH_BOOK_DEPTH must be one of {VALID_BOOK_DEPTHS:?}, got {book_depth}"
        )));
    }

    Ok(MonitorConfig {
        pair,
        interval,
        window: Duration::from_secs(window_secs),
        utc_offset_hours,
        period: Duration::from_secs(period_secs),
        book_depth,
    })
}

/// Returns the value of an environment variable if it exists and is non-empty.
fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

/// Parses a non-empty environment variable, reporting the variable name on failure.
fn parsed_var<T>(name: &str) -> crate::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    non_empty_var(name)
        .map(|raw| {
            raw.trim().parse::<T>().map_err(|e| {
                crate::BookwatchError::Config(format!("invalid {name} value {raw:?}: {e}"))
            })
        })
        .transpose()
}
