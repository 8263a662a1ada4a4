//! Shared models for exchange market data, scan findings, subscribers,
//! and the Telegram Bot API.

pub mod book;
pub mod candle;
pub mod order;
pub mod subscriber;
pub mod telegram;

pub use book::{OrderBookSnapshot, PriceLevel};
pub use candle::{Candle, CandleInterval};
pub use order::{LargeOrder, Side};
pub use subscriber::{ChatId, Subscriber};
