//! Real API integration tests for the Binance REST endpoints.
//!
//! These tests call the live Binance API and require network access.
//! Run with: `cargo test --features integration-tests`

#![cfg(feature = "integration-tests")]

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use bookwatch::estimator::{estimate, window_start};
use bookwatch::exchange::{BinanceClient, MarketData};
use bookwatch::models::CandleInterval;
use bookwatch::scanner::scan;

const BINANCE_REST_URL: &str = "https://api.binance.com";
const PAIR: &str = "ALGOUSDT";

fn client(depth: u32) -> BinanceClient {
    BinanceClient::new(BINANCE_REST_URL, None, depth).expect("Failed to build client")
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_millis() as u64
}

#[tokio::test]
async fn test_order_book_snapshot() {
    let book = client(20)
        .order_book(PAIR)
        .await
        .expect("Failed to fetch order book");

    assert!(!book.bids.is_empty(), "Expected bids");
    assert!(!book.asks.is_empty(), "Expected asks");
    assert!(book.bids.len() <= 20);
    assert!(
        book.bids[0].price < book.asks[0].price,
        "Best bid should be below best ask"
    );
    assert!(book.last_update_id > 0);
}

#[tokio::test]
async fn test_full_day_of_candles_spans_pages() {
    let since = window_start(now_ms(), Duration::from_secs(24 * 60 * 60), 0);

    let candles = client(100)
        .historical_candles(PAIR, CandleInterval::OneMinute, since)
        .await
        .expect("Failed to fetch candles");

    // 1440 one-minute candles per day, more than one page of 1000.
    assert!(candles.len() > 1000, "got {} candles", candles.len());
    assert!(candles.iter().all(|c| c.open_time >= since));
    assert!(candles.windows(2).all(|w| w[0].open_time < w[1].open_time));
}

#[tokio::test]
async fn test_live_pipeline() {
    let client = client(100);
    let since = window_start(now_ms(), Duration::from_secs(24 * 60 * 60), 0);

    let book = client.order_book(PAIR).await.expect("Failed to fetch book");
    let candles = client
        .historical_candles(PAIR, CandleInterval::FiveMinutes, since)
        .await
        .expect("Failed to fetch candles");

    let threshold = estimate(&candles).expect("Empty candle window");
    let result = scan(&book, threshold);

    assert!(result.bids.iter().all(|o| o.size > threshold));
    assert!(result.asks.iter().all(|o| o.size > threshold));
}

#[tokio::test]
async fn test_unknown_symbol_is_exchange_error() {
    let err = client(5)
        .order_book("NOTAPAIR")
        .await
        .expect_err("Unknown symbol should fail");

    assert!(
        matches!(err, bookwatch::BookwatchError::Exchange(_)),
        "unexpected error: {err}"
    );
}
