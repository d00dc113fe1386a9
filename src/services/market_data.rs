//! Market data provider interface.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::market::{Candle, MarketSnapshot};

#[derive(Debug, Clone, Error, PartialEq)]
pub enum MarketDataError {
    #[error("network error: {0}")]
    Network(String),

    #[error("rate limited (retry after {retry_after_ms:?}ms)")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("api error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
}

impl MarketDataError {
    /// Malformed payloads are data errors; everything else is transient I/O.
    pub fn is_data_error(&self) -> bool {
        matches!(self, MarketDataError::InvalidResponse(_))
    }
}

#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Latest price / quote / volume for a symbol
    async fn fetch_snapshot(&self, symbol: &str) -> Result<MarketSnapshot, MarketDataError>;

    /// Historical candles, oldest first
    async fn fetch_ohlcv(
        &self,
        symbol: &str,
        timeframe: &str,
        limit: usize,
    ) -> Result<Vec<Candle>, MarketDataError>;
}
