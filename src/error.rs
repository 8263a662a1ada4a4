//! Crate-level error types.
//!
//! [`BookwatchError`] unifies every error source (configuration, exchange
//! and Telegram HTTP, persistence, JSON) behind a single enum so callers can
//! match on the variant they care about while still using the `?` operator
//! for easy propagation.

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, BookwatchError>;

/// Top-level error type returned by all public APIs.
#[derive(Debug, thiserror::Error)]
pub enum BookwatchError {
    /// Environment configuration is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// The candle window was empty, so no volume threshold can be derived.
    #[error("insufficient data: candle window is empty")]
    InsufficientData,

    /// An HTTP request to the exchange or Telegram failed in transport.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The exchange answered with an error payload.
    #[error("exchange error: {0}")]
    Exchange(String),

    /// A chat message could not be delivered.
    #[error("delivery error: {0}")]
    Delivery(String),

    /// The subscriber store could not be reached or rejected a statement.
    #[error("subscriber store unavailable: {0}")]
    StoreUnavailable(String),

    /// JSON serialization or deserialization failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// A local I/O operation (stdin, signal handling, runtime setup) failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The broadcast scheduler was driven through an invalid transition.
    #[error("scheduler lifecycle error: {0}")]
    Lifecycle(String),
}

impl From<sqlx::Error> for BookwatchError {
    fn from(e: sqlx::Error) -> Self {
        Self::StoreUnavailable(e.to_string())
    }
}
