//! Large-order detection over an order book snapshot.

use rust_decimal::Decimal;

use crate::models::{LargeOrder, OrderBookSnapshot, PriceLevel, Side};

/// Orders from one snapshot whose size exceeded the threshold.
///
/// Both sides may be empty; that is a normal outcome, not a failure.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanResult {
    pub bids: Vec<LargeOrder>,
    pub asks: Vec<LargeOrder>,
}

impl ScanResult {
    /// Returns `true` if neither side had a qualifying order.
    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }
}

/// Partitions out every level whose quantity is strictly greater than
/// `threshold`, keeping the book's order within each side.
pub fn scan(book: &OrderBookSnapshot, threshold: Decimal) -> ScanResult {
    ScanResult {
        bids: large_orders(&book.bids, threshold, Side::Bid),
        asks: large_orders(&book.asks, threshold, Side::Ask),
    }
}

fn large_orders(levels: &[PriceLevel], threshold: Decimal, side: Side) -> Vec<LargeOrder> {
    levels
        .iter()
        .filter(|level| level.qty > threshold)
        .map(|level| LargeOrder {
            price: level.price,
            size: level.qty,
            side,
        })
        .collect()
}
