//! Order book snapshot models.

use rust_decimal::Decimal;
use serde::Deserialize;

/// Point-in-time view of the order book for a single trading pair.
///
/// Levels keep the exchange's ordering: bids best-to-worst (descending
/// price), asks best-to-worst (ascending price).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderBookSnapshot {
    #[serde(default)]
    pub last_update_id: u64,
    pub bids: Vec<PriceLevel>,
    pub asks: Vec<PriceLevel>,
}

/// A single price level in the order book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(from = "(Decimal, Decimal)")]
pub struct PriceLevel {
    pub price: Decimal,
    pub qty: Decimal,
}

impl PriceLevel {
    pub fn new(price: Decimal, qty: Decimal) -> Self {
        Self { price, qty }
    }
}

impl From<(Decimal, Decimal)> for PriceLevel {
    fn from((price, qty): (Decimal, Decimal)) -> Self {
        Self { price, qty }
    }
}
