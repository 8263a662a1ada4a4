//! Large-order findings produced by the scanner.

use std::fmt;

use rust_decimal::Decimal;

/// Book side an order rests on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Bid,
    Ask,
}

impl Side {
    /// Capitalized label used in report lines.
    pub fn label(&self) -> &'static str {
        match self {
            Side::Bid => "Bid",
            Side::Ask => "Ask",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A resting order whose size exceeds the volume threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LargeOrder {
    pub price: Decimal,
    pub size: Decimal,
    pub side: Side,
}
