//! Binance spot REST client.
//!
//! Uses the public market data endpoints `GET /api/v3/depth` and
//! `GET /api/v3/klines`. An API key is optional; when configured it is sent
//! as `X-MBX-APIKEY` so requests count against the account's rate limits
//! instead of the caller's IP.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use zeroize::Zeroizing;

use super::MarketData;
use crate::models::{Candle, CandleInterval, OrderBookSnapshot};
use crate::{BookwatchError, Result};

const DEPTH_PATH: &str = "/api/v3/depth";
const KLINES_PATH: &str = "/api/v3/klines";

/// Maximum rows `GET /api/v3/klines` returns per request.
const KLINES_PAGE_LIMIT: usize = 1000;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Error body returned by Binance alongside a non-2xx status.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    code: i64,
    msg: String,
}

/// Binance REST market data client.
pub struct BinanceClient {
    http: Client,
    base_url: String,
    api_key: Option<Zeroizing<String>>,
    book_depth: u32,
}

impl BinanceClient {
    /// Creates a client against `base_url` (e.g. `https://api.binance.com`).
    ///
    /// # Errors
    ///
    /// Returns [`BookwatchError::Network`] if the HTTP client cannot be built.
    pub fn new(
        base_url: &str,
        api_key: Option<Zeroizing<String>>,
        book_depth: u32,
    ) -> Result<Self> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            book_depth,
        })
    }

    fn get(&self, path: &str) -> RequestBuilder {
        let request = self.http.get(format!("{}{path}", self.base_url));
        match &self.api_key {
            Some(key) => request.header("X-MBX-APIKEY", key.as_str()),
            None => request,
        }
    }

    /// Fetches one page of at most [`KLINES_PAGE_LIMIT`] candles.
    async fn klines_page(
        &self,
        pair: &str,
        interval: CandleInterval,
        start_ms: u64,
    ) -> Result<Vec<Candle>> {
        let response = self
            .get(KLINES_PATH)
            .query(&klines_query(pair, interval, start_ms))
            .send()
            .await?;
        decode(response).await
    }
}

#[async_trait]
impl MarketData for BinanceClient {
    async fn order_book(&self, pair: &str) -> Result<OrderBookSnapshot> {
        let response = self
            .get(DEPTH_PATH)
            .query(&depth_query(pair, self.book_depth))
            .send()
            .await?;
        let book: OrderBookSnapshot = decode(response).await?;
        debug!(
            pair,
            bids = book.bids.len(),
            asks = book.asks.len(),
            "Fetched order book"
        );
        Ok(book)
    }

    async fn historical_candles(
        &self,
        pair: &str,
        interval: CandleInterval,
        since_ms: u64,
    ) -> Result<Vec<Candle>> {
        let mut candles = Vec::new();
        let mut start_ms = since_ms;

        loop {
            let page = self.klines_page(pair, interval, start_ms).await?;
            let page_len = page.len();
            let Some(last_open) = page.last().map(|c| c.open_time) else {
                break;
            };
            candles.extend(page);

            if page_len < KLINES_PAGE_LIMIT {
                break;
            }
            start_ms = last_open + 1;
        }

        debug!(
            pair,
            interval = interval.as_str(),
            count = candles.len(),
            "Fetched historical candles"
        );
        Ok(candles)
    }
}

/// Query parameters for `GET /api/v3/depth`.
fn depth_query(pair: &str, limit: u32) -> Vec<(&'static str, String)> {
    vec![("symbol", pair.to_string()), ("limit", limit.to_string())]
}

/// Query parameters for `GET /api/v3/klines`.
fn klines_query(
    pair: &str,
    interval: CandleInterval,
    start_ms: u64,
) -> Vec<(&'static str, String)> {
    vec![
        ("symbol", pair.to_string()),
        ("interval", interval.as_str().to_string()),
        ("startTime", start_ms.to_string()),
        ("limit", KLINES_PAGE_LIMIT.to_string()),
    ]
}

/// Decodes a successful body, or turns a Binance error body into
/// [`BookwatchError::Exchange`].
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }

    let body = response.text().await?;
    let message = match serde_json::from_str::<ApiErrorBody>(&body) {
        Ok(err) => format!("{status}: {} (code {})", err.msg, err.code),
        Err(_) => format!("{status}: {body}"),
    };
    Err(BookwatchError::Exchange(message))
}
