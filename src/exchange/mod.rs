//! Exchange market data access.
//!
//! The broadcast pipeline only needs two reads from the exchange, so they
//! sit behind the [`MarketData`] trait; [`binance::BinanceClient`] is the
//! production implementation.

pub mod binance;

use async_trait::async_trait;

use crate::Result;
use crate::models::{Candle, CandleInterval, OrderBookSnapshot};

pub use binance::BinanceClient;

/// Read-only market data source.
///
/// Implementations do not retry; a failed call surfaces as an error and the
/// caller decides what to skip.
#[async_trait]
pub trait MarketData: Send + Sync {
    /// Fetches the current order book for `pair`.
    async fn order_book(&self, pair: &str) -> Result<OrderBookSnapshot>;

    /// Fetches every closed-or-open candle for `pair` opened at or after
    /// `since_ms`, oldest first.
    async fn historical_candles(
        &self,
        pair: &str,
        interval: CandleInterval,
        since_ms: u64,
    ) -> Result<Vec<Candle>>;
}
