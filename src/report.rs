//! Plain-text rendering of one pipeline run.

use rust_decimal::Decimal;

use crate::models::LargeOrder;
use crate::scanner::ScanResult;

/// Decimal places the threshold is rounded to before display.
const THRESHOLD_DISPLAY_DP: u32 = 8;

/// Outcome of fetch → estimate → scan for one pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub pair: String,
    pub threshold: Decimal,
    pub scan: ScanResult,
}

impl Report {
    /// Renders the report as the ordered list of chat messages to send.
    ///
    /// Layout: pair, threshold, then every large bid (or a "Bids is empty"
    /// notice), then every large ask (or "Asks is empty").
    pub fn lines(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(4 + self.scan.bids.len() + self.scan.asks.len());
        lines.push(format!("Pair is {}", self.pair));
        lines.push(format!(
            "Avg volume is {}",
            self.threshold.round_dp(THRESHOLD_DISPLAY_DP).normalize()
        ));
        push_side(&mut lines, &self.scan.bids, "Bids is empty");
        push_side(&mut lines, &self.scan.asks, "Asks is empty");
        lines
    }
}

fn push_side(lines: &mut Vec<String>, orders: &[LargeOrder], empty_notice: &str) {
    if orders.is_empty() {
        lines.push(empty_notice.to_string());
        return;
    }
    lines.extend(orders.iter().map(order_line));
}

fn order_line(order: &LargeOrder) -> String {
    format!(
        "{} price {}\nVolume {}",
        order.side.label(),
        order.price,
        order.size
    )
}
