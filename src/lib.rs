//! Order book whale watcher.
//!
//! Periodically derives a volume threshold from a trailing window of
//! candles, scans the live order book for orders larger than that
//! threshold, and broadcasts the findings to Telegram subscribers on a
//! fixed schedule or on demand.

pub mod config;
pub mod credentials;
pub mod delivery;
pub mod error;
pub mod estimator;
pub mod exchange;
pub mod models;
pub mod report;
pub mod scanner;
pub mod scheduler;
pub mod store;
pub mod telegram;

pub use error::{BookwatchError, Result};
