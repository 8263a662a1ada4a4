//! Volume threshold estimation from historical candles.
//!
//! The threshold is the plain arithmetic mean of per-candle volume over the
//! trailing window. It is recomputed on every pipeline run because market
//! activity drifts.

use std::time::Duration;

use rust_decimal::Decimal;

use crate::models::Candle;
use crate::{BookwatchError, Result};

const MILLIS_PER_HOUR: i128 = 60 * 60 * 1000;

/// Returns the mean traded volume across `candles`.
///
/// # Errors
///
/// Returns [`BookwatchError::InsufficientData`] if `candles` is empty.
pub fn estimate(candles: &[Candle]) -> Result<Decimal> {
    if candles.is_empty() {
        return Err(BookwatchError::InsufficientData);
    }

    let total: Decimal = candles.iter().map(|c| c.volume).sum();
    Ok(total / Decimal::from(candles.len()))
}

/// Start of the trailing candle window, in milliseconds since the epoch.
///
/// The window reaches `window` back from `now_ms`, shifted a further
/// `utc_offset_hours` into the past (a negative offset shortens it).
/// Saturates at the epoch.
pub fn window_start(now_ms: u64, window: Duration, utc_offset_hours: i64) -> u64 {
    let start = i128::from(now_ms)
        - window.as_millis() as i128
        - i128::from(utc_offset_hours) * MILLIS_PER_HOUR;
    start.clamp(0, i128::from(u64::MAX)) as u64
}
